//! The open-file table: a fixed-size resource table mapping a file
//! descriptor (its own slot index) to the inode block, byte offset and
//! cached name of one open file.
//!
//! Mirrors `libTinyFS.c`'s `openFiles[MAX_OPEN_FILES]` array and its
//! `findFreeFileSlot`/`isValidFD` helpers, reworked as a small owned type
//! instead of a module static.

use crate::error::{Result, TinyFsError};

/// Maximum number of files a single mount may have open at once.
pub const MAX_OPEN_FILES: usize = 20;

/// A descriptor is just the slot index into the owning `TinyFs`'s table;
/// it is meaningless outside the mount that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileDescriptor(pub(crate) usize);

impl std::fmt::Display for FileDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct OpenFileEntry {
    pub inode_block: u32,
    pub file_pointer: u32,
    pub name: Vec<u8>,
}

/// The per-mount resource table. Reset to all-empty on every successful
/// mount and discarded on unmount.
pub(crate) struct OpenFileTable {
    slots: Vec<Option<OpenFileEntry>>,
}

impl OpenFileTable {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_OPEN_FILES);
        slots.resize_with(MAX_OPEN_FILES, || None);
        Self { slots }
    }

    /// Finds an already-open entry by name, per the idempotent-open
    /// contract: opening the same name twice returns the same descriptor.
    pub fn find_by_name(&self, name: &[u8]) -> Option<FileDescriptor> {
        self.slots
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.name == name))
            .map(FileDescriptor)
    }

    fn next_free(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    pub fn insert(&mut self, inode_block: u32, name: &[u8]) -> Result<FileDescriptor> {
        let slot = self.next_free().ok_or(TinyFsError::TooManyOpen)?;
        self.slots[slot] = Some(OpenFileEntry {
            inode_block,
            file_pointer: 0,
            name: name.to_vec(),
        });
        Ok(FileDescriptor(slot))
    }

    pub fn get(&self, fd: FileDescriptor) -> Result<&OpenFileEntry> {
        self.slots
            .get(fd.0)
            .and_then(Option::as_ref)
            .ok_or(TinyFsError::BadFd)
    }

    pub fn get_mut(&mut self, fd: FileDescriptor) -> Result<&mut OpenFileEntry> {
        self.slots
            .get_mut(fd.0)
            .and_then(Option::as_mut)
            .ok_or(TinyFsError::BadFd)
    }

    pub fn close(&mut self, fd: FileDescriptor) -> Result<()> {
        self.get(fd)?;
        self.slots[fd.0] = None;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn insert_then_get_roundtrips() {
        let mut table = OpenFileTable::new();
        let fd = table.insert(5, b"foo").unwrap();
        assert_eq!(table.get(fd).unwrap().inode_block, 5);
        assert_eq!(table.find_by_name(b"foo"), Some(fd));
    }

    #[test]
    fn bad_fd_after_close() {
        let mut table = OpenFileTable::new();
        let fd = table.insert(5, b"foo").unwrap();
        table.close(fd).unwrap();
        assert!(matches!(table.get(fd), Err(TinyFsError::BadFd)));
        assert!(matches!(table.close(fd), Err(TinyFsError::BadFd)));
    }

    #[test]
    fn too_many_open_once_slots_exhausted() {
        let mut table = OpenFileTable::new();
        for i in 0..MAX_OPEN_FILES {
            table.insert(i as u32, format!("f{i}").as_bytes()).unwrap();
        }
        assert!(matches!(
            table.insert(999, b"one-too-many"),
            Err(TinyFsError::TooManyOpen)
        ));
    }
}
