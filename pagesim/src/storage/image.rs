use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

use crate::memory::FILL_BYTE;

/// Read-only random access to the program image, laid out as the text
/// bytes followed immediately by the data bytes.
pub struct ImageFile {
    file: File,
}

impl ImageFile {
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            file: File::open(path)?,
        })
    }

    /// Reads one page starting at `offset`. Bytes past the end of the
    /// image come back as the fill value.
    pub fn read_page(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        buf.fill(FILL_BYTE);
        self.file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < buf.len() {
            let count = self.file.read(&mut buf[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }

        Ok(())
    }
}
