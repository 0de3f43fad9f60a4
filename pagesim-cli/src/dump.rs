use std::io::Write;

use pagesim::{MemoryError, Segment, SimulatedMemory};

/// Renders a stored byte, substituting a dot for non-printable values.
pub fn render(value: u8) -> char {
    match value {
        0x20..=0x7E => value as char,
        _ => '.',
    }
}

/// One frame-relative byte per line, covering the whole physical array.
pub fn memory(sim: &SimulatedMemory, out: &mut impl Write) -> Result<(), MemoryError> {
    writeln!(out, "Physical memory")?;

    let page_size = sim.layout().page_size;
    for (i, &value) in sim.memory_bytes().iter().enumerate() {
        if i % page_size == 0 {
            writeln!(out, "frame {}", i / page_size)?;
        }
        writeln!(out, "[{}]", render(value))?;
    }

    Ok(())
}

/// Page-sized rows read sequentially from the swap file.
pub fn swap(sim: &mut SimulatedMemory, out: &mut impl Write) -> Result<(), MemoryError> {
    writeln!(out, "Swap memory")?;

    for slot in 0..sim.swap_slot_count() {
        let row = sim.read_swap_slot(slot)?;

        for (i, &value) in row.iter().enumerate() {
            write!(out, "{i} - [{}]\t", render(value))?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// One table per segment: resident, dirty, frame, and swap-slot columns.
pub fn page_table(sim: &SimulatedMemory, out: &mut impl Write) -> Result<(), MemoryError> {
    for &segment in Segment::ALL {
        writeln!(out, "{segment} pages")?;
        writeln!(out, "Resident\t Dirty\t Frame\t Swap slot")?;

        for entry in sim.descriptors(segment) {
            writeln!(
                out,
                "[{}]\t\t [{}]\t [{}]\t [{}]",
                entry.resident as u8,
                entry.dirty as u8,
                index_or_dash(entry.frame),
                index_or_dash(entry.swap_slot),
            )?;
        }
    }

    Ok(())
}

fn index_or_dash(index: Option<usize>) -> String {
    match index {
        Some(i) => i.to_string(),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_escapes_non_printable_bytes() {
        assert_eq!(render(b'A'), 'A');
        assert_eq!(render(b'0'), '0');
        assert_eq!(render(0x00), '.');
        assert_eq!(render(0x7F), '.');
    }

    #[test]
    fn index_column_shows_dash_when_absent() {
        assert_eq!(index_or_dash(Some(3)), "3");
        assert_eq!(index_or_dash(None), "-");
    }
}
