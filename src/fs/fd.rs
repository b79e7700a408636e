use crate::error::Error;
use crate::sys::dir::Filename;

/// Maximum number of simultaneously open descriptors.
pub const MAX_OPEN: usize = 32;

/// Per-descriptor state: the file the descriptor refers to and the byte
/// offset the next read or write starts at.
#[derive(Clone, Copy)]
pub(crate) struct OpenFile {
    pub name: Filename,
    pub offset: u32,
}

/// The open-file table. A descriptor handed to callers is an index into
/// this table; the lowest free slot is always claimed first.
pub(crate) struct FdTable {
    slots: [Option<OpenFile>; MAX_OPEN],
}

impl FdTable {
    pub fn new() -> FdTable {
        FdTable {
            slots: [None; MAX_OPEN],
        }
    }

    /// Claim the lowest free slot for `name`, with the cursor at zero.
    pub fn open(&mut self, name: Filename) -> Result<usize, Error> {
        let slot = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(Error::TooManyOpenFiles)?;
        self.slots[slot] = Some(OpenFile { name, offset: 0 });
        Ok(slot)
    }

    pub fn close(&mut self, fd: usize) -> Result<(), Error> {
        self.slots
            .get_mut(fd)
            .and_then(Option::take)
            .map(|_| ())
            .ok_or(Error::BadDescriptor(fd))
    }

    pub fn get(&self, fd: usize) -> Result<&OpenFile, Error> {
        self.slots
            .get(fd)
            .and_then(Option::as_ref)
            .ok_or(Error::BadDescriptor(fd))
    }

    pub fn get_mut(&mut self, fd: usize) -> Result<&mut OpenFile, Error> {
        self.slots
            .get_mut(fd)
            .and_then(Option::as_mut)
            .ok_or(Error::BadDescriptor(fd))
    }

    /// Does any open descriptor refer to `name`?
    pub fn is_open(&self, name: &Filename) -> bool {
        self.slots.iter().flatten().any(|open| open.name == *name)
    }

    pub fn any_open(&self) -> bool {
        self.slots.iter().any(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_slot_first() {
        let mut table = FdTable::new();
        let name = Filename::new("f").unwrap();
        assert_eq!(table.open(name).unwrap(), 0);
        assert_eq!(table.open(name).unwrap(), 1);
        table.close(0).unwrap();
        assert_eq!(table.open(name).unwrap(), 0);
    }

    #[test]
    fn table_fills_up() {
        let mut table = FdTable::new();
        let name = Filename::new("f").unwrap();
        for _ in 0..MAX_OPEN {
            table.open(name).unwrap();
        }
        assert!(matches!(table.open(name), Err(Error::TooManyOpenFiles)));
    }

    #[test]
    fn bad_descriptors() {
        let mut table = FdTable::new();
        assert!(matches!(table.get(0), Err(Error::BadDescriptor(0))));
        assert!(matches!(table.close(MAX_OPEN), Err(Error::BadDescriptor(_))));
        assert!(matches!(table.get_mut(99), Err(Error::BadDescriptor(99))));
    }

    #[test]
    fn name_tracking() {
        let mut table = FdTable::new();
        let a = Filename::new("a").unwrap();
        let b = Filename::new("b").unwrap();
        let fd = table.open(a).unwrap();
        assert!(table.is_open(&a));
        assert!(!table.is_open(&b));
        assert!(table.any_open());
        table.close(fd).unwrap();
        assert!(!table.any_open());
    }
}
