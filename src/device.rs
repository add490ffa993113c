//! The emulated block device: a table of real files, each addressed by a
//! small integer handle, exposing whole-block reads and writes. TinyFS's
//! core logic consumes only this interface — it never touches a
//! `std::fs::File` directly.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};

use crate::error::{Result, TinyFsError};
use crate::format::BLOCKSIZE;

/// Maximum number of simultaneously open emulated disks.
const ALLOC_DISKS: usize = 16;

/// A small integer identifying an open disk, scoped to one `DiskManager`.
pub type DiskHandle = usize;

struct DiskEntry {
    file: File,
    block_count: u32,
}

/// A table of open emulated disks, mirroring a Unix-style file descriptor
/// table but private to TinyFS.
pub struct DiskManager {
    slots: Vec<Option<DiskEntry>>,
}

impl DiskManager {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(ALLOC_DISKS);
        slots.resize_with(ALLOC_DISKS, || None);
        Self { slots }
    }

    fn next_free(&self) -> Option<usize> {
        self.slots.iter().position(|s| s.is_none())
    }

    fn entry(&self, handle: DiskHandle) -> Result<&DiskEntry> {
        self.slots
            .get(handle)
            .and_then(Option::as_ref)
            .ok_or(TinyFsError::DiskIo(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "disk handle not open",
            )))
    }

    fn entry_mut(&mut self, handle: DiskHandle) -> Result<&mut DiskEntry> {
        self.slots
            .get_mut(handle)
            .and_then(Option::as_mut)
            .ok_or(TinyFsError::DiskIo(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "disk handle not open",
            )))
    }

    /// Opens (or creates) the device file at `path`.
    ///
    /// `size_bytes == 0` opens an existing file and derives the block
    /// count from its actual length, rounded down to a block multiple.
    /// `size_bytes > 0` creates (or truncates) the file to that size,
    /// also rounded down to a block multiple; a positive size smaller
    /// than one block is rejected.
    pub fn open(&mut self, path: &std::path::Path, size_bytes: u64) -> Result<DiskHandle> {
        if size_bytes > 0 && size_bytes < BLOCKSIZE as u64 {
            return Err(TinyFsError::DiskOpen(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "requested disk size is smaller than one block",
            )));
        }
        let handle = self
            .next_free()
            .ok_or_else(|| TinyFsError::DiskOpen(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no free disk slots",
            )))?;

        let (file, block_count) = if size_bytes == 0 {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .open(path)
                .map_err(TinyFsError::DiskOpen)?;
            let len = file.metadata().map_err(TinyFsError::DiskOpen)?.len();
            let block_count = (len - (len % BLOCKSIZE as u64)) / BLOCKSIZE as u64;
            (file, block_count as u32)
        } else {
            let rounded = size_bytes - (size_bytes % BLOCKSIZE as u64);
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path)
                .map_err(TinyFsError::DiskOpen)?;
            file.set_len(rounded).map_err(TinyFsError::DiskOpen)?;
            (file, (rounded / BLOCKSIZE as u64) as u32)
        };

        log::debug!(
            "disk opened: handle={handle} blocks={block_count} path={}",
            path.display()
        );
        self.slots[handle] = Some(DiskEntry { file, block_count });
        Ok(handle)
    }

    /// Closes the disk at `handle`, freeing its slot.
    pub fn close(&mut self, handle: DiskHandle) -> Result<()> {
        let entry = self
            .slots
            .get_mut(handle)
            .and_then(Option::take)
            .ok_or(TinyFsError::DiskClose(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "disk handle not open",
            )))?;
        drop(entry.file);
        log::debug!("disk closed: handle={handle}");
        Ok(())
    }

    /// Number of `BLOCKSIZE`-byte blocks on the disk at `handle`.
    pub fn block_count(&self, handle: DiskHandle) -> Result<u32> {
        Ok(self.entry(handle)?.block_count)
    }

    /// Reads exactly one block into `buf`.
    pub fn read_block(&mut self, handle: DiskHandle, index: u32, buf: &mut [u8; BLOCKSIZE]) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        let offset = index as u64 * BLOCKSIZE as u64;
        entry
            .file
            .seek(SeekFrom::Start(offset))
            .map_err(TinyFsError::DiskRead)?;
        entry.file.read_exact(buf).map_err(TinyFsError::DiskRead)
    }

    /// Writes exactly one block from `buf`.
    pub fn write_block(&mut self, handle: DiskHandle, index: u32, buf: &[u8; BLOCKSIZE]) -> Result<()> {
        let entry = self.entry_mut(handle)?;
        let offset = index as u64 * BLOCKSIZE as u64;
        entry
            .file
            .seek(SeekFrom::Start(offset))
            .map_err(TinyFsError::DiskWrite)?;
        entry.file.write_all(buf).map_err(TinyFsError::DiskWrite)
    }
}

impl Default for DiskManager {
    fn default() -> Self {
        Self::new()
    }
}
