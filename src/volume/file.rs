use std::fs::OpenOptions;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::{Volume, BLOCK_SIZE};

/// A block device backed by a file on the host filesystem.
///
/// The file length is read once when the volume is opened; blocks past it
/// are out of bounds. Trailing bytes that do not fill a whole block are
/// ignored.
pub struct FileVolume {
    file: std::fs::File,
    blocks: u32,
}

impl FileVolume {
    /// Open an existing image file for reading and writing.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<FileVolume> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        Ok(FileVolume {
            file,
            blocks: (len / BLOCK_SIZE as u64) as u32,
        })
    }

    /// Create a zero-filled image file spanning `blocks` blocks, truncating
    /// any existing file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, blocks: u32) -> io::Result<FileVolume> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(blocks as u64 * BLOCK_SIZE as u64)?;
        Ok(FileVolume { file, blocks })
    }

    fn seek_to(&mut self, index: u32) -> io::Result<()> {
        if index >= self.blocks {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("block index {} out of range", index),
            ));
        }
        self.file
            .seek(SeekFrom::Start(index as u64 * BLOCK_SIZE as u64))?;
        Ok(())
    }
}

impl Volume for FileVolume {
    type Error = io::Error;

    fn block_count(&self) -> Result<u32, io::Error> {
        Ok(self.blocks)
    }

    fn read_block(&mut self, index: u32, buf: &mut [u8]) -> Result<(), io::Error> {
        debug_assert_eq!(buf.len(), BLOCK_SIZE);
        self.seek_to(index)?;
        self.file.read_exact(buf)
    }

    fn write_block(&mut self, index: u32, buf: &[u8]) -> Result<(), io::Error> {
        debug_assert_eq!(buf.len(), BLOCK_SIZE);
        self.seek_to(index)?;
        self.file.write_all(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");

        let mut volume = FileVolume::create(&path, 3).unwrap();
        assert_eq!(volume.block_count().unwrap(), 3);

        let block = [0x5au8; BLOCK_SIZE];
        volume.write_block(1, &block).unwrap();
        drop(volume);

        let mut volume = FileVolume::open(&path).unwrap();
        assert_eq!(volume.block_count().unwrap(), 3);
        let mut read = [0u8; BLOCK_SIZE];
        volume.read_block(1, &mut read).unwrap();
        assert_eq!(read[..], block[..]);
        volume.read_block(2, &mut read).unwrap();
        assert!(read.iter().all(|&b| b == 0));
    }

    #[test]
    fn out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let mut volume = FileVolume::create(dir.path().join("disk.img"), 2).unwrap();
        let mut buf = [0u8; BLOCK_SIZE];
        assert!(volume.read_block(2, &mut buf).is_err());
    }
}
