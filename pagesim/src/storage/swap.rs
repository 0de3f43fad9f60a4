use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::memory::FILL_BYTE;

/// Backing store for evicted pages: a file divided into page-sized slots.
///
/// A slot is considered free when its leading byte is the fill value.
/// There is no occupancy bitmap, so a stored page whose first byte happens
/// to equal the fill value is indistinguishable from a free slot.
pub struct SwapFile {
    file: File,
    page_size: usize,
    slot_count: usize,
}

impl SwapFile {
    /// Creates the swap file sized to `slot_count` pages, with every slot
    /// free.
    pub fn create(
        path: impl AsRef<Path>,
        slot_count: usize,
        page_size: usize,
    ) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        let mut swap = Self {
            file,
            page_size,
            slot_count,
        };

        for slot in 0..slot_count {
            swap.release(slot)?;
        }

        Ok(swap)
    }

    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Scans slots in file order for one whose leading byte is the fill
    /// value.
    pub fn find_free(&mut self) -> io::Result<Option<usize>> {
        let mut lead = [0u8; 1];

        for slot in 0..self.slot_count {
            self.seek_to(slot)?;
            self.file.read_exact(&mut lead)?;

            if lead[0] == FILL_BYTE {
                return Ok(Some(slot));
            }
        }

        Ok(None)
    }

    /// Copies one page of bytes into a slot.
    pub fn write_slot(&mut self, slot: usize, data: &[u8]) -> io::Result<()> {
        self.seek_to(slot)?;
        self.file.write_all(data)
    }

    /// Copies one slot's bytes out into `buf`.
    pub fn read_slot(&mut self, slot: usize, buf: &mut [u8]) -> io::Result<()> {
        self.seek_to(slot)?;
        self.file.read_exact(buf)
    }

    /// Marks a slot free by refilling it with the fill value.
    pub fn release(&mut self, slot: usize) -> io::Result<()> {
        let fill = vec![FILL_BYTE; self.page_size];
        self.write_slot(slot, &fill)
    }

    fn seek_to(&mut self, slot: usize) -> io::Result<()> {
        self.file
            .seek(SeekFrom::Start((slot * self.page_size) as u64))?;
        Ok(())
    }
}
