use std::sync::Arc;

use spin::{Mutex, MutexGuard};

use crate::error::Error;
use crate::volume::Volume;

use super::{FileSystem, Info, Listing};

/// Clonable handle to a shared value behind a process-wide lock.
///
/// [`FileSystem`] itself is single-threaded by construction; `Synced`
/// serializes every operation for callers that want to hand one mount
/// around.
pub struct Synced<T> {
    inner: Arc<Mutex<T>>,
}

impl<T> Synced<T> {
    pub fn with_inner(inner: T) -> Synced<T> {
        Synced {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    pub fn inner(&self) -> MutexGuard<'_, T> {
        self.inner.lock()
    }
}

impl<T> Clone for Synced<T> {
    fn clone(&self) -> Self {
        Synced {
            inner: self.inner.clone(),
        }
    }
}

impl<V: Volume> Synced<FileSystem<V>> {
    pub fn mount(volume: V) -> Result<Synced<FileSystem<V>>, Error> {
        FileSystem::mount(volume).map(Synced::with_inner)
    }

    pub fn format(volume: V) -> Result<Synced<FileSystem<V>>, Error> {
        FileSystem::format(volume).map(Synced::with_inner)
    }

    /// Unmount and give the volume back.
    ///
    /// Fails with [`Error::OpenHandles`] while other clones of this handle
    /// exist or descriptors are open.
    pub fn unmount(self) -> Result<V, Error> {
        let fs = Arc::try_unwrap(self.inner)
            .map_err(|_| Error::OpenHandles)?
            .into_inner();
        fs.unmount().map_err(|(_, err)| err)
    }

    pub fn info(&self) -> Info {
        self.inner().info()
    }

    pub fn ls(&self) -> Listing {
        self.inner().ls()
    }

    pub fn create(&self, name: &str) -> Result<(), Error> {
        self.inner().create(name)
    }

    pub fn delete(&self, name: &str) -> Result<(), Error> {
        self.inner().delete(name)
    }

    pub fn open(&self, name: &str) -> Result<usize, Error> {
        self.inner().open(name)
    }

    pub fn close(&self, fd: usize) -> Result<(), Error> {
        self.inner().close(fd)
    }

    pub fn stat(&self, fd: usize) -> Result<u32, Error> {
        self.inner().stat(fd)
    }

    pub fn lseek(&self, fd: usize, offset: u32) -> Result<(), Error> {
        self.inner().lseek(fd, offset)
    }

    pub fn read(&self, fd: usize, buf: &mut [u8]) -> Result<usize, Error> {
        self.inner().read(fd, buf)
    }

    pub fn write(&self, fd: usize, buf: &[u8]) -> Result<usize, Error> {
        self.inner().write(fd, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::BLOCK_SIZE;

    #[test]
    fn shared_handle() {
        let fs = Synced::format(vec![0u8; 10 * BLOCK_SIZE]).unwrap();
        let other = fs.clone();

        fs.create("shared.txt").unwrap();
        let fd = other.open("shared.txt").unwrap();
        other.write(fd, b"from the clone").unwrap();
        other.close(fd).unwrap();

        assert_eq!(fs.ls().files[0].name, "shared.txt");
        assert_eq!(fs.ls().files[0].size, 14);

        // both handles pin the mount
        assert!(matches!(fs.unmount(), Err(Error::OpenHandles)));
        let volume = other.unmount().unwrap();
        assert_eq!(volume.len(), 10 * BLOCK_SIZE);
    }
}
