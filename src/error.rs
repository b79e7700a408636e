use std::io;

use thiserror::Error;

/// The set of all possible errors.
#[derive(Debug, Error)]
pub enum Error {
    #[error("bad filesystem signature {0:?}")]
    BadSignature([u8; 8]),
    #[error("superblock claims {superblock} blocks but the device has {device}")]
    BadBlockCount { superblock: u16, device: u32 },
    #[error("superblock describes an impossible layout")]
    BadLayout,
    #[error("block index {0} is out of bounds")]
    OutOfBounds(u32),
    #[error("invalid filename")]
    BadFilename,
    #[error("no such file")]
    NotFound,
    #[error("a file with this name already exists")]
    AlreadyExists,
    #[error("root directory is full")]
    RootFull,
    #[error("all file descriptors are in use")]
    TooManyOpenFiles,
    #[error("invalid file descriptor {0}")]
    BadDescriptor(usize),
    #[error("file is currently open")]
    FileOpen,
    #[error("descriptors are still open")]
    OpenHandles,
    #[error("offset {offset} is past the end of the file ({size} bytes)")]
    BadOffset { offset: u32, size: u32 },
    #[error("FAT chain is corrupt")]
    CorruptChain,
    #[error(transparent)]
    Io(#[from] io::Error),
}
