use crate::error::Error;

mod file;
pub use self::file::FileVolume;

/// Size in bytes of every block on a volume.
pub const BLOCK_SIZE: usize = 4096;

/// Abstraction over the storage backing a filesystem image.
///
/// A volume is a flat array of 4096-byte blocks addressed by index. The
/// filesystem layer issues no other kind of I/O: whole blocks in, whole
/// blocks out. Byte buffers (`Vec<u8>`, `Box<[u8]>`, `&mut [u8]`) implement
/// this directly and make handy in-memory images; [`FileVolume`] maps the
/// same contract onto a host file.
pub trait Volume {
    type Error: Into<Error>;

    /// Total number of blocks on the volume.
    fn block_count(&self) -> Result<u32, Self::Error>;

    /// Read the block at `index` into `buf`, which must be exactly
    /// [`BLOCK_SIZE`] bytes long.
    fn read_block(&mut self, index: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Write `buf`, which must be exactly [`BLOCK_SIZE`] bytes long, to the
    /// block at `index`.
    fn write_block(&mut self, index: u32, buf: &[u8]) -> Result<(), Self::Error>;
}

macro_rules! impl_volume {
    ($volume:ty $( , $lt:lifetime )* ) => {
        impl<$( $lt )*> Volume for $volume {
            type Error = Error;

            fn block_count(&self) -> Result<u32, Error> {
                Ok((self.len() / BLOCK_SIZE) as u32)
            }

            fn read_block(&mut self, index: u32, buf: &mut [u8]) -> Result<(), Error> {
                debug_assert_eq!(buf.len(), BLOCK_SIZE);
                let start = index as usize * BLOCK_SIZE;
                match self.get(start..start + BLOCK_SIZE) {
                    Some(block) => {
                        buf.copy_from_slice(block);
                        Ok(())
                    }
                    None => Err(Error::OutOfBounds(index)),
                }
            }

            fn write_block(&mut self, index: u32, buf: &[u8]) -> Result<(), Error> {
                debug_assert_eq!(buf.len(), BLOCK_SIZE);
                let start = index as usize * BLOCK_SIZE;
                match self.get_mut(start..start + BLOCK_SIZE) {
                    Some(block) => {
                        block.copy_from_slice(buf);
                        Ok(())
                    }
                    None => Err(Error::OutOfBounds(index)),
                }
            }
        }
    };
}

impl_volume!(Vec<u8>);
impl_volume!(Box<[u8]>);
impl_volume!(&'a mut [u8], 'a);
