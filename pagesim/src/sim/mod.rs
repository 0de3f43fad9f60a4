use std::path::Path;

use crate::address::{Segment, SegmentLayout, VirtualAddress};
use crate::memory::{FrameTable, MainMemory, MemoryError, MEMORY_SIZE};
use crate::storage::{ImageFile, SwapFile};
use crate::table::{PageDescriptor, PageTable, NEVER_ACCESSED};

/// A single-process virtual memory: segmented page tables over a fixed
/// frame pool, backed by a program image and a swap file.
///
/// Every byte access goes through [`SimulatedMemory::load`] or
/// [`SimulatedMemory::store`]. Non-resident pages are faulted in on
/// demand, evicting the least recently used page when the frame pool is
/// full.
pub struct SimulatedMemory {
    layout: SegmentLayout,
    memory: MainMemory,
    frames: FrameTable,
    table: PageTable,
    image: ImageFile,
    swap: SwapFile,
    clock: u64,
}

impl SimulatedMemory {
    /// Opens the program image, creates the swap file sized to the
    /// swappable segments, and builds the empty page tables.
    pub fn new(
        image_path: impl AsRef<Path>,
        swap_path: impl AsRef<Path>,
        layout: SegmentLayout,
    ) -> Result<Self, MemoryError> {
        let image = ImageFile::open(image_path)?;
        let swap = SwapFile::create(swap_path, layout.swappable_pages(), layout.page_size)?;

        Ok(Self {
            memory: MainMemory::new(layout.page_size),
            frames: FrameTable::new(MEMORY_SIZE / layout.page_size),
            table: PageTable::new(&layout),
            image,
            swap,
            layout,
            clock: 0,
        })
    }

    /// Reads one byte from a logical address, faulting the page in if
    /// needed.
    pub fn load(&mut self, address: u16) -> Result<u8, MemoryError> {
        let va = self
            .layout
            .decode(address)
            .ok_or(MemoryError::InvalidAddress(address))?;

        let entry = *self.table.entry(va.segment, va.page);
        let frame = if entry.resident {
            backing_frame(&entry)
        } else if va.segment == Segment::HeapStack && !entry.dirty {
            // Never-written heap/stack memory cannot be synthesized on a
            // read; only a store materializes it.
            return Err(MemoryError::UninitializedRead(address));
        } else {
            self.fault_in(va)?
        };

        let value = self.memory.read(frame, va.offset);
        self.touch(va);

        Ok(value)
    }

    /// Writes one byte to a logical address, faulting the page in if
    /// needed. The text segment is read-only.
    pub fn store(&mut self, address: u16, value: u8) -> Result<(), MemoryError> {
        let va = self
            .layout
            .decode(address)
            .ok_or(MemoryError::InvalidAddress(address))?;

        if va.segment == Segment::Text {
            return Err(MemoryError::ReadOnlyWrite(address));
        }

        let entry = *self.table.entry(va.segment, va.page);
        let frame = if entry.resident {
            backing_frame(&entry)
        } else {
            let frame = self.fault_in(va)?;
            // A store rebuilds every non-data frame from the fill pattern
            // before the write, including one just copied back from swap.
            if va.segment != Segment::Data {
                self.memory.fill_frame(frame);
            }
            frame
        };

        self.memory.write(frame, va.offset, value);
        self.table.entry_mut(va.segment, va.page).dirty = true;
        self.touch(va);

        Ok(())
    }

    /// Reads a byte without faulting or advancing the access clock.
    /// Returns `None` for invalid addresses and non-resident pages.
    pub fn peek(&self, address: u16) -> Option<u8> {
        let va = self.layout.decode(address)?;
        let entry = self.table.entry(va.segment, va.page);

        if entry.resident {
            Some(self.memory.read(backing_frame(entry), va.offset))
        } else {
            None
        }
    }

    pub fn layout(&self) -> &SegmentLayout {
        &self.layout
    }

    /// Current value of the logical access clock.
    pub fn clock(&self) -> u64 {
        self.clock
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn occupied_frames(&self) -> usize {
        self.frames.occupied_count()
    }

    /// The whole physical array, frame by frame.
    pub fn memory_bytes(&self) -> &[u8] {
        self.memory.bytes()
    }

    /// Descriptors of one segment, in page order.
    pub fn descriptors(&self, segment: Segment) -> &[PageDescriptor] {
        self.table.segment(segment)
    }

    pub fn swap_slot_count(&self) -> usize {
        self.swap.slot_count()
    }

    /// One page-sized row of the swap file.
    pub fn read_swap_slot(&mut self, slot: usize) -> Result<Vec<u8>, MemoryError> {
        let mut buf = vec![0u8; self.layout.page_size];
        self.swap.read_slot(slot, &mut buf)?;
        Ok(buf)
    }

    /// Services a page fault: reclaims a frame if none is free, fills it
    /// with the page's content, and marks the page resident. Returns the
    /// frame.
    fn fault_in(&mut self, va: VirtualAddress) -> Result<usize, MemoryError> {
        let entry = *self.table.entry(va.segment, va.page);
        let frame = self.reserve_frame()?;

        if let Some(slot) = entry.swap_slot {
            self.swap.read_slot(slot, self.memory.frame_mut(frame))?;
            self.swap.release(slot)?;
            self.table.entry_mut(va.segment, va.page).swap_slot = None;
            log::debug!("{} page {} <- swap slot {slot}", va.segment, va.page);
        } else {
            match va.segment {
                Segment::Text | Segment::Data => {
                    let base = match va.segment {
                        Segment::Text => 0,
                        _ => self.layout.text_size,
                    };
                    let offset = (base + va.page * self.layout.page_size) as u64;
                    self.image.read_page(offset, self.memory.frame_mut(frame))?;
                    log::debug!("{} page {} <- image offset {offset}", va.segment, va.page);
                }
                Segment::Bss | Segment::HeapStack => {
                    // Not backed by the image; a fresh page is the fill
                    // pattern.
                    self.memory.fill_frame(frame);
                    log::debug!("{} page {} <- fill", va.segment, va.page);
                }
            }
        }

        self.frames.set_occupied(frame);
        let entry = self.table.entry_mut(va.segment, va.page);
        entry.resident = true;
        entry.frame = Some(frame);

        Ok(frame)
    }

    /// Returns a free frame, evicting the least recently used page when
    /// the pool is full.
    fn reserve_frame(&mut self) -> Result<usize, MemoryError> {
        if let Some(frame) = self.frames.find_free() {
            return Ok(frame);
        }

        let (segment, page) = match self.table.oldest() {
            Some(victim) => victim,
            None => unreachable!("frame pool full with no accessed page"),
        };

        self.evict(segment, page)
    }

    /// Removes a resident page from its frame and returns the vacated
    /// frame. Dirty pages are copied to a swap slot first; text and clean
    /// pages are recoverable from their backing source and simply
    /// dropped.
    fn evict(&mut self, segment: Segment, page: usize) -> Result<usize, MemoryError> {
        let entry = *self.table.entry(segment, page);
        let frame = backing_frame(&entry);

        if segment.swappable() && entry.dirty {
            let slot = match self.swap.find_free()? {
                Some(slot) => slot,
                None => return Err(MemoryError::SwapExhausted),
            };

            self.swap.write_slot(slot, self.memory.frame(frame))?;
            self.memory.fill_frame(frame);
            self.table.entry_mut(segment, page).swap_slot = Some(slot);
            log::debug!("{segment} page {page} -> swap slot {slot}");
        } else {
            log::debug!("{segment} page {page} dropped from frame {frame}");
        }

        self.frames.set_free(frame);
        let entry = self.table.entry_mut(segment, page);
        entry.resident = false;
        entry.frame = None;
        entry.last_access = NEVER_ACCESSED;

        Ok(frame)
    }

    /// Advances the logical clock and stamps the page just accessed.
    fn touch(&mut self, va: VirtualAddress) {
        self.clock += 1;
        self.table.entry_mut(va.segment, va.page).last_access = self.clock;
    }
}

/// Frame backing a resident page. The table never marks a page resident
/// without assigning a frame.
fn backing_frame(entry: &PageDescriptor) -> usize {
    match entry.frame {
        Some(frame) => frame,
        None => unreachable!("resident page has no frame"),
    }
}
