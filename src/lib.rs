//! A tiny user-space filesystem stored in a single block-addressed image.
//!
//! The image begins with a superblock carrying the `"ECS150FS"` signature,
//! followed by a file allocation table, a 128-entry root directory block and
//! a region of 4096-byte data blocks chained through the FAT. [`FileSystem`]
//! mounts such an image from anything implementing [`Volume`] (an in-memory
//! byte buffer or a [`FileVolume`] backed by a host file) and exposes a
//! POSIX-like surface: create, delete, ls, open, close, stat, lseek, read
//! and write.

pub mod error;
pub mod fs;
pub mod sys;
pub mod volume;

pub use error::Error;
pub use fs::sync::Synced;
pub use fs::{FileInfo, FileSystem, Info, Listing, MAX_OPEN};
pub use volume::{FileVolume, Volume, BLOCK_SIZE};

#[cfg(test)]
mod tests {
    use crate::sys::{dir, fat};
    use crate::volume::BLOCK_SIZE;

    #[test]
    fn layout() {
        assert_eq!(dir::ENTRY_COUNT * dir::ENTRY_SIZE, BLOCK_SIZE);
        assert_eq!(fat::ENTRIES_PER_BLOCK * 2, BLOCK_SIZE);
    }
}
