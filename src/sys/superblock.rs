use std::fmt::{self, Debug};

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::sys::fat::ENTRIES_PER_BLOCK;
use crate::volume::BLOCK_SIZE;

/// Signature identifying a formatted image, stored at the start of block 0
/// with no terminator.
pub const SIGNATURE: [u8; 8] = *b"ECS150FS";

const SIGNATURE_LEN: usize = 8;
const RESERVED_LEN: usize = BLOCK_SIZE - 17;

/// The superblock occupies block 0 and describes the geometry of the image:
/// how many blocks it spans and where the FAT, the root directory and the
/// data region sit.
///
/// Layout invariant: block 0 is the superblock, blocks 1..=`fat_blocks` hold
/// the FAT, the root directory is the block right after the FAT, and the
/// data region follows the root directory to the end of the image.
#[derive(Clone)]
pub struct Superblock {
    /// Total number of blocks in the image (superblock + FAT + root + data).
    pub total_blocks: u16,
    /// Block index of the root directory.
    pub root_dir_block: u16,
    /// Block index of the first data block.
    pub data_start_block: u16,
    /// Number of data blocks.
    pub data_blocks: u16,
    /// Number of blocks occupied by the FAT.
    pub fat_blocks: u8,
    /// Tail of block 0; carries no meaning but survives rewrites.
    reserved: [u8; RESERVED_LEN],
}

impl Superblock {
    /// Compute the geometry for a fresh image of `total_blocks` blocks: the
    /// smallest FAT whose entries cover the remaining data region.
    pub fn with_total(total_blocks: u16) -> Result<Superblock, Error> {
        let mut fat_blocks: u8 = 1;
        loop {
            let meta = 2 + fat_blocks as u32;
            if u32::from(total_blocks) <= meta {
                return Err(Error::BadLayout);
            }
            let data_blocks = total_blocks - meta as u16;
            if fat_blocks as usize * ENTRIES_PER_BLOCK >= data_blocks as usize {
                return Ok(Superblock {
                    total_blocks,
                    root_dir_block: fat_blocks as u16 + 1,
                    data_start_block: fat_blocks as u16 + 2,
                    data_blocks,
                    fat_blocks,
                    reserved: [0; RESERVED_LEN],
                });
            }
            fat_blocks = fat_blocks.checked_add(1).ok_or(Error::BadLayout)?;
        }
    }

    /// Parse block 0 of an image, validating the signature and the layout
    /// invariant.
    pub fn parse(block: &[u8]) -> Result<Superblock, Error> {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        let mut signature = [0; SIGNATURE_LEN];
        signature.copy_from_slice(&block[..SIGNATURE_LEN]);
        if signature != SIGNATURE {
            return Err(Error::BadSignature(signature));
        }
        let mut reserved = [0; RESERVED_LEN];
        reserved.copy_from_slice(&block[17..]);
        let superblock = Superblock {
            total_blocks: LittleEndian::read_u16(&block[8..10]),
            root_dir_block: LittleEndian::read_u16(&block[10..12]),
            data_start_block: LittleEndian::read_u16(&block[12..14]),
            data_blocks: LittleEndian::read_u16(&block[14..16]),
            fat_blocks: block[16],
            reserved,
        };
        superblock.check_layout()?;
        Ok(superblock)
    }

    /// Serialize into a block-sized buffer.
    pub fn serialize(&self, block: &mut [u8]) {
        debug_assert_eq!(block.len(), BLOCK_SIZE);
        block[..SIGNATURE_LEN].copy_from_slice(&SIGNATURE);
        LittleEndian::write_u16(&mut block[8..10], self.total_blocks);
        LittleEndian::write_u16(&mut block[10..12], self.root_dir_block);
        LittleEndian::write_u16(&mut block[12..14], self.data_start_block);
        LittleEndian::write_u16(&mut block[14..16], self.data_blocks);
        block[16] = self.fat_blocks;
        block[17..].copy_from_slice(&self.reserved);
    }

    fn check_layout(&self) -> Result<(), Error> {
        let fat_blocks = u32::from(self.fat_blocks);
        let consistent = self.fat_blocks >= 1
            && u32::from(self.root_dir_block) == fat_blocks + 1
            && u32::from(self.data_start_block) == u32::from(self.root_dir_block) + 1
            && u32::from(self.total_blocks) == 2 + fat_blocks + u32::from(self.data_blocks)
            && self.fat_blocks as usize * ENTRIES_PER_BLOCK >= self.data_blocks as usize;
        if consistent {
            Ok(())
        } else {
            Err(Error::BadLayout)
        }
    }
}

impl Debug for Superblock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Superblock")
            .field("total_blocks", &self.total_blocks)
            .field("root_dir_block", &self.root_dir_block)
            .field("data_start_block", &self.data_start_block)
            .field("data_blocks", &self.data_blocks)
            .field("fat_blocks", &self.fat_blocks)
            .finish()
    }
}
