use std::fmt::{self, Debug, Display};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::sys::fat::EOC;
use crate::volume::BLOCK_SIZE;

/// Number of entries in the root directory.
pub const ENTRY_COUNT: usize = 128;
/// Size in bytes of one directory entry.
pub const ENTRY_SIZE: usize = 32;
/// Size of the on-disk filename field, including the terminating NUL.
pub const NAME_LEN: usize = 16;
/// Longest usable filename in bytes.
pub const MAX_NAME: usize = NAME_LEN - 1;

const RESERVED_LEN: usize = ENTRY_SIZE - NAME_LEN - 6;

/// A filename as stored on disk: 1 to 15 bytes, NUL-padded to 16.
///
/// An all-NUL name marks an empty directory entry.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Filename([u8; NAME_LEN]);

impl Filename {
    /// Validate `name` and convert it to its on-disk form.
    pub fn new(name: &str) -> Result<Filename, Error> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_NAME || bytes.contains(&0) {
            return Err(Error::BadFilename);
        }
        let mut raw = [0; NAME_LEN];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(Filename(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.0[0] == 0
    }

    /// The name up to (excluding) the terminating NUL.
    pub fn as_bytes(&self) -> &[u8] {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(MAX_NAME);
        &self.0[..len]
    }
}

impl Display for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.as_bytes()))
    }
}

impl Debug for Filename {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filename({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// One slot of the root directory table.
#[derive(Clone, Copy, Debug)]
pub struct DirEntry {
    /// Name of the file; all-NUL iff the slot is empty.
    pub name: Filename,
    /// Size of the file in bytes.
    pub size: u32,
    /// First block of the file's chain, or [`EOC`] for an empty file.
    pub first_block: u16,
    /// Unused tail of the slot, preserved across rewrites.
    reserved: [u8; RESERVED_LEN],
}

impl DirEntry {
    const EMPTY: DirEntry = DirEntry {
        name: Filename([0; NAME_LEN]),
        size: 0,
        first_block: EOC,
        reserved: [0; RESERVED_LEN],
    };

    fn parse(bytes: &[u8]) -> DirEntry {
        let mut name = [0; NAME_LEN];
        name.copy_from_slice(&bytes[..NAME_LEN]);
        let mut reserved = [0; RESERVED_LEN];
        reserved.copy_from_slice(&bytes[22..ENTRY_SIZE]);
        DirEntry {
            name: Filename(name),
            size: LittleEndian::read_u32(&bytes[16..20]),
            first_block: LittleEndian::read_u16(&bytes[20..22]),
            reserved,
        }
    }

    fn serialize(&self, bytes: &mut [u8]) {
        bytes[..NAME_LEN].copy_from_slice(&self.name.0);
        LittleEndian::write_u32(&mut bytes[16..20], self.size);
        LittleEndian::write_u16(&mut bytes[20..22], self.first_block);
        bytes[22..ENTRY_SIZE].copy_from_slice(&self.reserved);
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Reset the slot to empty, keeping its reserved bytes.
    pub fn clear(&mut self) {
        self.name = Filename([0; NAME_LEN]);
        self.size = 0;
        self.first_block = EOC;
    }
}

/// In-memory copy of the root directory block.
#[derive(Clone)]
pub struct RootDir {
    entries: [DirEntry; ENTRY_COUNT],
}

impl RootDir {
    /// Decode the root directory from its block.
    pub fn parse(block: &[u8]) -> RootDir {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        let mut entries = [DirEntry::EMPTY; ENTRY_COUNT];
        for (entry, chunk) in entries.iter_mut().zip(block.chunks(ENTRY_SIZE)) {
            *entry = DirEntry::parse(chunk);
        }
        RootDir { entries }
    }

    /// Encode into a block-sized buffer.
    pub fn serialize(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        for (entry, chunk) in self.entries.iter().zip(block.chunks_mut(ENTRY_SIZE)) {
            entry.serialize(chunk);
        }
    }

    pub fn entry(&self, index: usize) -> &DirEntry {
        &self.entries[index]
    }

    pub fn entry_mut(&mut self, index: usize) -> &mut DirEntry {
        &mut self.entries[index]
    }

    /// Non-empty entries in storage order.
    pub fn used(&self) -> impl Iterator<Item = (usize, &DirEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| !entry.is_empty())
    }

    /// Index of the non-empty entry named `name`, if any.
    pub fn find(&self, name: &Filename) -> Option<usize> {
        self.used()
            .find(|(_, entry)| entry.name == *name)
            .map(|(index, _)| index)
    }

    /// Lowest-index empty slot, if any.
    pub fn free_slot(&self) -> Option<usize> {
        self.entries.iter().position(DirEntry::is_empty)
    }

    pub fn free_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_empty()).count()
    }
}
