//! The mounted filesystem and its POSIX-like surface.

use std::fmt::{self, Display};

use log::{debug, info};

use crate::error::Error;
use crate::sys::dir::{Filename, RootDir, ENTRY_COUNT};
use crate::sys::fat::{Fat, EOC};
use crate::sys::superblock::Superblock;
use crate::volume::{Volume, BLOCK_SIZE};

mod fd;
pub mod sync;

use self::fd::FdTable;
pub use self::fd::MAX_OPEN;

/// A mounted filesystem image.
///
/// Created by [`FileSystem::mount`] or [`FileSystem::format`]. While the
/// value lives, its in-memory superblock, FAT and root directory are the
/// authoritative copies of the metadata; [`FileSystem::unmount`] writes
/// them back and returns the underlying volume. Dropping the value without
/// unmounting discards FAT changes made since mount.
pub struct FileSystem<V: Volume> {
    volume: V,
    superblock: Superblock,
    fat: Fat,
    root: RootDir,
    fds: FdTable,
}

impl<V: Volume> FileSystem<V> {
    /// Mount the image on `volume`.
    ///
    /// Fails if the superblock is unreadable, its signature is wrong, its
    /// layout is inconsistent, or its block count disagrees with the volume.
    pub fn mount(mut volume: V) -> Result<FileSystem<V>, Error> {
        let device_blocks = volume.block_count().map_err(Into::into)?;
        let mut block = [0u8; BLOCK_SIZE];
        volume.read_block(0, &mut block).map_err(Into::into)?;
        let superblock = Superblock::parse(&block)?;
        if u32::from(superblock.total_blocks) != device_blocks {
            return Err(Error::BadBlockCount {
                superblock: superblock.total_blocks,
                device: device_blocks,
            });
        }

        let mut fat_image = vec![0u8; superblock.fat_blocks as usize * BLOCK_SIZE];
        for (index, chunk) in fat_image.chunks_mut(BLOCK_SIZE).enumerate() {
            volume
                .read_block(1 + index as u32, chunk)
                .map_err(Into::into)?;
        }
        let fat = Fat::parse(&fat_image, superblock.data_blocks);

        volume
            .read_block(u32::from(superblock.root_dir_block), &mut block)
            .map_err(Into::into)?;
        let root = RootDir::parse(&block);

        debug!(
            "mounted image: {} blocks, {} data blocks, {} free",
            superblock.total_blocks,
            superblock.data_blocks,
            fat.free_count()
        );
        Ok(FileSystem {
            volume,
            superblock,
            fat,
            root,
            fds: FdTable::new(),
        })
    }

    /// Write a fresh, empty filesystem onto `volume` and mount it.
    pub fn format(mut volume: V) -> Result<FileSystem<V>, Error> {
        let device_blocks = volume.block_count().map_err(Into::into)?;
        let total = u16::try_from(device_blocks).map_err(|_| Error::BadLayout)?;
        let superblock = Superblock::with_total(total)?;

        let mut block = [0u8; BLOCK_SIZE];
        superblock.serialize(&mut block);
        volume.write_block(0, &block).map_err(Into::into)?;

        let zero = [0u8; BLOCK_SIZE];
        for index in 0..u32::from(superblock.fat_blocks) {
            volume.write_block(1 + index, &zero).map_err(Into::into)?;
        }
        volume
            .write_block(u32::from(superblock.root_dir_block), &zero)
            .map_err(Into::into)?;

        info!(
            "formatted image: {} blocks, {} data blocks",
            superblock.total_blocks, superblock.data_blocks
        );
        Self::mount(volume)
    }

    /// Flush the FAT and the root directory and give the volume back.
    ///
    /// Refuses while any descriptor is open. On failure the filesystem is
    /// handed back alongside the error; dropping it abandons the unflushed
    /// metadata.
    pub fn unmount(mut self) -> Result<V, (FileSystem<V>, Error)> {
        if self.fds.any_open() {
            return Err((self, Error::OpenHandles));
        }
        match self.flush() {
            Ok(()) => {
                debug!("unmounted image");
                Ok(self.volume)
            }
            Err(err) => Err((self, err)),
        }
    }

    fn flush(&mut self) -> Result<(), Error> {
        let mut block = [0u8; BLOCK_SIZE];
        for index in 0..self.fat.block_count() {
            self.fat.copy_block(index, &mut block);
            self.volume
                .write_block(1 + index as u32, &block)
                .map_err(Into::into)?;
        }
        self.write_root()
    }

    fn write_root(&mut self) -> Result<(), Error> {
        let mut block = [0u8; BLOCK_SIZE];
        self.root.serialize(&mut block);
        self.volume
            .write_block(u32::from(self.superblock.root_dir_block), &block)
            .map_err(Into::into)
    }

    /// Snapshot of the image's geometry and occupancy.
    pub fn info(&self) -> Info {
        Info {
            total_blocks: self.superblock.total_blocks,
            fat_blocks: self.superblock.fat_blocks,
            root_dir_block: self.superblock.root_dir_block,
            data_start_block: self.superblock.data_start_block,
            data_blocks: self.superblock.data_blocks,
            free_data_blocks: self.fat.free_count() as u16,
            free_entries: self.root.free_count(),
        }
    }

    /// List every file in storage order.
    pub fn ls(&self) -> Listing {
        Listing {
            files: self
                .root
                .used()
                .map(|(_, entry)| FileInfo {
                    name: entry.name.to_string(),
                    size: entry.size,
                    first_block: entry.first_block,
                })
                .collect(),
        }
    }

    /// Create an empty file named `name`.
    pub fn create(&mut self, name: &str) -> Result<(), Error> {
        let name = Filename::new(name)?;
        if self.root.find(&name).is_some() {
            return Err(Error::AlreadyExists);
        }
        let slot = self.root.free_slot().ok_or(Error::RootFull)?;
        let entry = self.root.entry_mut(slot);
        entry.name = name;
        entry.size = 0;
        entry.first_block = EOC;
        self.write_root()
    }

    /// Delete the file named `name`, returning its blocks to the free pool.
    ///
    /// Refused while any descriptor for the file is open. The freed FAT
    /// entries reach the disk at unmount.
    pub fn delete(&mut self, name: &str) -> Result<(), Error> {
        let name = Filename::new(name)?;
        let slot = self.root.find(&name).ok_or(Error::NotFound)?;
        if self.fds.is_open(&name) {
            return Err(Error::FileOpen);
        }
        let first = self.root.entry(slot).first_block;
        self.fat.release(first)?;
        self.root.entry_mut(slot).clear();
        debug!("deleted {}, {} data blocks free", name, self.fat.free_count());
        self.write_root()
    }

    /// Open the file named `name` with the cursor at byte zero and return
    /// its descriptor.
    pub fn open(&mut self, name: &str) -> Result<usize, Error> {
        let name = Filename::new(name)?;
        if self.root.find(&name).is_none() {
            return Err(Error::NotFound);
        }
        self.fds.open(name)
    }

    /// Close the descriptor `fd`.
    pub fn close(&mut self, fd: usize) -> Result<(), Error> {
        let name = self.fds.get(fd)?.name;
        if self.root.find(&name).is_none() {
            return Err(Error::NotFound);
        }
        self.fds.close(fd)
    }

    /// Current size in bytes of the file behind `fd`.
    pub fn stat(&self, fd: usize) -> Result<u32, Error> {
        let name = self.fds.get(fd)?.name;
        let slot = self.root.find(&name).ok_or(Error::NotFound)?;
        Ok(self.root.entry(slot).size)
    }

    /// Move the cursor of `fd` to `offset`, which must not exceed the
    /// current file size.
    pub fn lseek(&mut self, fd: usize, offset: u32) -> Result<(), Error> {
        let size = self.stat(fd)?;
        if offset > size {
            return Err(Error::BadOffset { offset, size });
        }
        self.fds.get_mut(fd)?.offset = offset;
        Ok(())
    }

    /// Read from the cursor of `fd` into `buf`.
    ///
    /// Returns the number of bytes read, clamped to the end of the file;
    /// the cursor advances by that much.
    pub fn read(&mut self, fd: usize, buf: &mut [u8]) -> Result<usize, Error> {
        let open = *self.fds.get(fd)?;
        let slot = self.root.find(&open.name).ok_or(Error::NotFound)?;
        let entry = *self.root.entry(slot);

        let mut offset = open.offset as usize;
        let mut count = buf
            .len()
            .min(entry.size.saturating_sub(open.offset) as usize);
        let mut done = 0;

        if count > 0 {
            let mut current = self
                .fat
                .nth(entry.first_block, offset / BLOCK_SIZE)?
                .ok_or(Error::CorruptChain)?;
            let mut bounce = [0u8; BLOCK_SIZE];
            while count > 0 {
                let head = offset % BLOCK_SIZE;
                let n = (BLOCK_SIZE - head).min(count);
                let disk = self.data_block(current);
                if head == 0 && n == BLOCK_SIZE {
                    // aligned full block straight into the caller's buffer
                    self.volume
                        .read_block(disk, &mut buf[done..done + BLOCK_SIZE])
                        .map_err(Into::into)?;
                } else {
                    self.volume
                        .read_block(disk, &mut bounce)
                        .map_err(Into::into)?;
                    buf[done..done + n].copy_from_slice(&bounce[head..head + n]);
                }
                offset += n;
                done += n;
                count -= n;
                if count > 0 {
                    match self.fat.next_block(current)? {
                        Some(next) => current = next,
                        None => break,
                    }
                }
            }
        }

        self.fds.get_mut(fd)?.offset = offset as u32;
        Ok(done)
    }

    /// Write `buf` at the cursor of `fd`, extending the file as needed.
    ///
    /// Returns the number of bytes written; when the disk runs out of free
    /// blocks mid-write this is less than `buf.len()`. The cursor advances
    /// by the amount written and the file size grows to cover it (writes
    /// never shrink a file).
    pub fn write(&mut self, fd: usize, buf: &[u8]) -> Result<usize, Error> {
        let open = *self.fds.get(fd)?;
        let slot = self.root.find(&open.name).ok_or(Error::NotFound)?;

        let mut count = buf.len();
        if count == 0 {
            return Ok(0);
        }

        let start = open.offset as usize;
        let old_size = self.root.entry(slot).size;

        let mut first = self.root.entry(slot).first_block;
        let mut allocated_head = false;
        if first == EOC {
            match self.fat.find_free_from(0) {
                Some(block) => {
                    self.fat.set(block, EOC);
                    first = block;
                    allocated_head = true;
                }
                None => {
                    debug!("write: no free blocks");
                    return Ok(0);
                }
            }
        }

        let mut current = match self.fat.nth(first, start / BLOCK_SIZE)? {
            Some(block) => block,
            None => {
                // the cursor sits just past a block-aligned end of file:
                // grow the chain by one before the loop starts
                let last = self.fat.last(first)?;
                match self.extend(last) {
                    Some(block) => block,
                    None => return Ok(0),
                }
            }
        };

        let mut offset = start;
        let mut done = 0;
        let mut bounce = [0u8; BLOCK_SIZE];
        loop {
            let head = offset % BLOCK_SIZE;
            let n = (BLOCK_SIZE - head).min(count);
            let disk = self.data_block(current);
            if head == 0 && n == BLOCK_SIZE {
                // aligned full block straight from the caller's buffer
                self.volume
                    .write_block(disk, &buf[done..done + BLOCK_SIZE])
                    .map_err(Into::into)?;
            } else {
                // read-modify-write keeps the bytes around the span intact
                self.volume
                    .read_block(disk, &mut bounce)
                    .map_err(Into::into)?;
                bounce[head..head + n].copy_from_slice(&buf[done..done + n]);
                self.volume.write_block(disk, &bounce).map_err(Into::into)?;
            }
            offset += n;
            done += n;
            count -= n;
            if count == 0 {
                break;
            }
            current = match self.fat.next_block(current)? {
                Some(next) => next,
                None => match self.extend(current) {
                    Some(block) => block,
                    None => {
                        debug!("write: disk full after {} bytes", done);
                        break;
                    }
                },
            };
        }

        let end = (start + done) as u32;
        let entry = self.root.entry_mut(slot);
        if allocated_head {
            entry.first_block = first;
        }
        if end > entry.size {
            entry.size = end;
        }
        self.fds.get_mut(fd)?.offset = end;
        if allocated_head || end > old_size {
            self.write_root()?;
        }
        Ok(done)
    }

    /// Allocate a block and link it after `last`, the current end of a
    /// chain. `None` when the disk is full.
    fn extend(&mut self, last: u16) -> Option<u16> {
        // a link value of 0 would read as a free entry, so block 0 can
        // only ever head a chain
        let block = self.fat.find_free_from(1)?;
        self.fat.set(block, EOC);
        self.fat.set(last, block);
        Some(block)
    }

    /// Absolute block index on the volume of data block `index`.
    fn data_block(&self, index: u16) -> u32 {
        u32::from(self.superblock.data_start_block) + u32::from(index)
    }
}

/// Geometry and occupancy of a mounted image, as reported by
/// [`FileSystem::info`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Info {
    pub total_blocks: u16,
    pub fat_blocks: u8,
    pub root_dir_block: u16,
    pub data_start_block: u16,
    pub data_blocks: u16,
    pub free_data_blocks: u16,
    pub free_entries: usize,
}

impl Display for Info {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "FS Info:")?;
        writeln!(f, "total_blk_count={}", self.total_blocks)?;
        writeln!(f, "fat_blk_count={}", self.fat_blocks)?;
        writeln!(f, "rdir_blk={}", self.root_dir_block)?;
        writeln!(f, "data_blk={}", self.data_start_block)?;
        writeln!(f, "data_blk_count={}", self.data_blocks)?;
        writeln!(
            f,
            "fat_free_ratio={}/{}",
            self.free_data_blocks, self.data_blocks
        )?;
        write!(f, "rdir_free_ratio={}/{}", self.free_entries, ENTRY_COUNT)
    }
}

/// One row of a directory listing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    pub size: u32,
    pub first_block: u16,
}

impl Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "file: {}, size: {}, data_blk: {}",
            self.name, self.size, self.first_block
        )
    }
}

/// Directory listing in storage order, as reported by [`FileSystem::ls`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Listing {
    pub files: Vec<FileInfo>,
}

impl Display for Listing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FS Ls:")?;
        for file in &self.files {
            write!(f, "\n{}", file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh(blocks: usize) -> FileSystem<Vec<u8>> {
        FileSystem::format(vec![0u8; blocks * BLOCK_SIZE]).unwrap()
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn info_of_fresh_image() {
        let fs = fresh(10);
        assert_eq!(
            fs.info().to_string(),
            "FS Info:\n\
             total_blk_count=10\n\
             fat_blk_count=1\n\
             rdir_blk=2\n\
             data_blk=3\n\
             data_blk_count=7\n\
             fat_free_ratio=7/7\n\
             rdir_free_ratio=128/128"
        );
    }

    #[test]
    fn listing_of_empty_file() {
        let mut fs = fresh(10);
        fs.create("a.txt").unwrap();
        assert_eq!(
            fs.ls().to_string(),
            "FS Ls:\nfile: a.txt, size: 0, data_blk: 65535"
        );
    }

    #[test]
    fn hello_round_trip() {
        let mut fs = fresh(10);
        fs.create("a.txt").unwrap();
        let fd = fs.open("a.txt").unwrap();
        assert_eq!(fs.write(fd, b"hello").unwrap(), 5);
        assert_eq!(fs.stat(fd).unwrap(), 5);
        fs.lseek(fd, 0).unwrap();
        let mut read = [0u8; 5];
        assert_eq!(fs.read(fd, &mut read).unwrap(), 5);
        assert_eq!(&read, b"hello");
    }

    #[test]
    fn two_block_write_and_read_back() {
        let mut fs = fresh(10);
        fs.create("a.txt").unwrap();
        let fd = fs.open("a.txt").unwrap();

        let data = pattern(2 * BLOCK_SIZE);
        assert_eq!(fs.write(fd, &data).unwrap(), 2 * BLOCK_SIZE);
        assert_eq!(fs.info().free_data_blocks, 5);

        let first = fs.root.entry(0).first_block;
        assert_eq!(fs.fat.chain(first).count(), 2);

        fs.lseek(fd, BLOCK_SIZE as u32).unwrap();
        let mut read = vec![0u8; BLOCK_SIZE];
        assert_eq!(fs.read(fd, &mut read).unwrap(), BLOCK_SIZE);
        assert_eq!(read[..], data[BLOCK_SIZE..]);
    }

    #[test]
    fn delete_while_open_is_refused() {
        let mut fs = fresh(10);
        fs.create("a.txt").unwrap();
        let fd = fs.open("a.txt").unwrap();
        fs.write(fd, &pattern(2 * BLOCK_SIZE)).unwrap();

        assert!(matches!(fs.delete("a.txt"), Err(Error::FileOpen)));
        fs.close(fd).unwrap();
        fs.delete("a.txt").unwrap();

        assert_eq!(fs.info().free_data_blocks, 7);
        assert!(fs.ls().files.is_empty());
        assert!(matches!(fs.delete("a.txt"), Err(Error::NotFound)));
    }

    #[test]
    fn fill_the_disk() {
        let mut fs = fresh(10);
        fs.create("big").unwrap();
        let fd = fs.open("big").unwrap();

        assert_eq!(fs.write(fd, &pattern(7 * BLOCK_SIZE)).unwrap(), 7 * BLOCK_SIZE);
        assert_eq!(fs.info().free_data_blocks, 0);

        // nothing left to allocate
        assert_eq!(fs.write(fd, b"more").unwrap(), 0);
        assert!(matches!(
            fs.lseek(fd, 7 * BLOCK_SIZE as u32 + 1),
            Err(Error::BadOffset { .. })
        ));
    }

    #[test]
    fn short_write_when_disk_runs_out() {
        let mut fs = fresh(10);
        fs.create("big").unwrap();
        let fd = fs.open("big").unwrap();

        let data = pattern(7 * BLOCK_SIZE + 500);
        assert_eq!(fs.write(fd, &data).unwrap(), 7 * BLOCK_SIZE);
        assert_eq!(fs.stat(fd).unwrap(), 7 * BLOCK_SIZE as u32);

        fs.lseek(fd, 0).unwrap();
        let mut read = vec![0u8; 7 * BLOCK_SIZE];
        assert_eq!(fs.read(fd, &mut read).unwrap(), 7 * BLOCK_SIZE);
        assert_eq!(read[..], data[..7 * BLOCK_SIZE]);
    }

    #[test]
    fn clamped_read() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        fs.write(fd, b"hello").unwrap();

        fs.lseek(fd, 2).unwrap();
        let mut read = [0u8; 10];
        assert_eq!(fs.read(fd, &mut read).unwrap(), 3);
        assert_eq!(&read[..3], b"llo");

        // cursor now at end of file
        assert_eq!(fs.read(fd, &mut read).unwrap(), 0);
    }

    #[test]
    fn overwrite_in_place_keeps_size() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        fs.write(fd, b"0123456789").unwrap();

        fs.lseek(fd, 0).unwrap();
        assert_eq!(fs.write(fd, b"abcd").unwrap(), 4);
        assert_eq!(fs.stat(fd).unwrap(), 10);

        fs.lseek(fd, 0).unwrap();
        let mut read = [0u8; 10];
        fs.read(fd, &mut read).unwrap();
        assert_eq!(&read, b"abcd456789");
    }

    #[test]
    fn unaligned_overwrite_preserves_neighbors() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();

        let mut expected = pattern(2 * BLOCK_SIZE);
        fs.write(fd, &expected).unwrap();

        // span the block boundary without touching either block's remainder
        let patch = vec![0xaau8; 200];
        fs.lseek(fd, 4000).unwrap();
        assert_eq!(fs.write(fd, &patch).unwrap(), 200);
        expected[4000..4200].copy_from_slice(&patch);

        fs.lseek(fd, 0).unwrap();
        let mut read = vec![0u8; 2 * BLOCK_SIZE];
        assert_eq!(fs.read(fd, &mut read).unwrap(), 2 * BLOCK_SIZE);
        assert_eq!(read, expected);
    }

    #[test]
    fn append_at_block_boundary() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();

        fs.write(fd, &pattern(BLOCK_SIZE)).unwrap();
        assert_eq!(fs.write(fd, &[7u8; 100]).unwrap(), 100);
        assert_eq!(fs.stat(fd).unwrap(), BLOCK_SIZE as u32 + 100);

        fs.lseek(fd, BLOCK_SIZE as u32).unwrap();
        let mut read = [0u8; 100];
        assert_eq!(fs.read(fd, &mut read).unwrap(), 100);
        assert_eq!(read, [7u8; 100]);
    }

    #[test]
    fn zero_length_write_is_noop() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        assert_eq!(fs.write(fd, &[]).unwrap(), 0);
        assert_eq!(fs.info().free_data_blocks, 7);
        assert_eq!(fs.ls().files[0].first_block, EOC);
    }

    #[test]
    fn descriptor_limit() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        for expected in 0..MAX_OPEN {
            assert_eq!(fs.open("a").unwrap(), expected);
        }
        assert!(matches!(fs.open("a"), Err(Error::TooManyOpenFiles)));
        fs.close(5).unwrap();
        assert_eq!(fs.open("a").unwrap(), 5);
    }

    #[test]
    fn unmount_refused_with_open_descriptor() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();

        let (mut fs, err) = fs.unmount().unwrap_err();
        assert!(matches!(err, Error::OpenHandles));

        fs.close(fd).unwrap();
        fs.unmount().map_err(|(_, err)| err).unwrap();
    }

    #[test]
    fn persistence_across_remount() {
        let mut fs = fresh(10);
        fs.create("a.txt").unwrap();
        fs.create("b.txt").unwrap();
        let fd = fs.open("a.txt").unwrap();
        let data = pattern(BLOCK_SIZE + 300);
        fs.write(fd, &data).unwrap();
        fs.close(fd).unwrap();

        let info = fs.info();
        let listing = fs.ls();
        let volume = fs.unmount().map_err(|(_, err)| err).unwrap();

        let mut fs = FileSystem::mount(volume).unwrap();
        assert_eq!(fs.info(), info);
        assert_eq!(fs.ls(), listing);

        let fd = fs.open("a.txt").unwrap();
        let mut read = vec![0u8; data.len()];
        assert_eq!(fs.read(fd, &mut read).unwrap(), data.len());
        assert_eq!(read, data);
    }

    #[test]
    fn create_errors() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        assert!(matches!(fs.create("a"), Err(Error::AlreadyExists)));
        assert!(matches!(fs.create(""), Err(Error::BadFilename)));
        assert!(matches!(
            fs.create("a-very-long-name.txt"),
            Err(Error::BadFilename)
        ));

        for index in 1..ENTRY_COUNT {
            fs.create(&format!("f{}", index)).unwrap();
        }
        assert!(matches!(fs.create("straw"), Err(Error::RootFull)));
        assert_eq!(fs.info().free_entries, 0);
    }

    #[test]
    fn open_close_errors() {
        let mut fs = fresh(10);
        assert!(matches!(fs.open("ghost"), Err(Error::NotFound)));
        assert!(matches!(fs.close(0), Err(Error::BadDescriptor(0))));
        assert!(matches!(fs.close(MAX_OPEN), Err(Error::BadDescriptor(_))));
        assert!(matches!(fs.stat(3), Err(Error::BadDescriptor(3))));

        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        fs.close(fd).unwrap();
        assert!(matches!(fs.close(fd), Err(Error::BadDescriptor(_))));
        assert!(matches!(fs.lseek(fd, 0), Err(Error::BadDescriptor(_))));
    }

    #[test]
    fn seek_to_exact_end_is_allowed() {
        let mut fs = fresh(10);
        fs.create("a").unwrap();
        let fd = fs.open("a").unwrap();
        fs.write(fd, b"12345").unwrap();
        fs.lseek(fd, 5).unwrap();
        assert!(matches!(fs.lseek(fd, 6), Err(Error::BadOffset { .. })));
    }

    #[test]
    fn mount_validation() {
        let fs = fresh(10);
        let mut volume = fs.unmount().map_err(|(_, err)| err).unwrap();

        volume[0] = b'X';
        assert!(matches!(
            FileSystem::mount(volume.clone()),
            Err(Error::BadSignature(_))
        ));
        volume[0] = b'E';

        // one extra device block the superblock does not account for
        volume.extend_from_slice(&[0u8; BLOCK_SIZE]);
        assert!(matches!(
            FileSystem::mount(volume),
            Err(Error::BadBlockCount {
                superblock: 10,
                device: 11,
            })
        ));
    }

    #[test]
    fn chunked_reads_follow_the_cursor() {
        let mut fs = fresh(20);
        fs.create("data").unwrap();
        let fd = fs.open("data").unwrap();

        let data = pattern(3 * BLOCK_SIZE + 123);
        assert_eq!(fs.write(fd, &data).unwrap(), data.len());

        fs.lseek(fd, 0).unwrap();
        let mut collected = Vec::new();
        let mut chunk = [0u8; 1000];
        loop {
            let n = fs.read(fd, &mut chunk).unwrap();
            if n == 0 {
                break;
            }
            collected.extend_from_slice(&chunk[..n]);
        }
        assert_eq!(collected, data);
    }
}
