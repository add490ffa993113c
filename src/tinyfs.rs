//! The mount controller and File API: the crate's public surface.
//!
//! `libTinyFS.c` keeps `disk_no` and the open-file table as module
//! statics shared by every `tfs_*` function. Here they are bundled into
//! one owned `TinyFs` value constructed by the caller; every File API
//! call is a method on it, so a process is free to hold more than one
//! (each enforcing single-mount independently) instead of being stuck
//! with exactly one mount for its whole lifetime.

use std::path::Path;

use crate::allocator;
use crate::device::DiskManager;
use crate::error::{Result, TinyFsError};
use crate::extent;
use crate::format::{self, Free, Inode, Superblock, BLOCKSIZE, INODE_FLAG_IN_USE, ROOT_INODE_BLOCK};
use crate::inode;
use crate::openfile::{FileDescriptor, OpenFileTable};
use crate::util::current_timestamp;
use crate::volume::Volume;

/// Default number of bytes `mkfs` formats when the caller doesn't ask for
/// a specific size: 40 blocks.
pub const DEFAULT_DISK_SIZE: u64 = 10240;
/// Default image path used by the demo CLI (and any caller who doesn't
/// care to name their own volume).
pub const DEFAULT_DISK_NAME: &str = "tinyFSDisk";

/// A snapshot of a file's metadata, returned by [`TinyFs::stat`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub name: Vec<u8>,
    pub size_bytes: i32,
    pub ctime: u32,
    pub mtime: u32,
    pub atime: u32,
    pub inode_block: u32,
}

/// One directory entry as produced by [`TinyFs::readdir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub inode_block: u32,
    pub name: Vec<u8>,
    pub size_bytes: i32,
}

fn validate_name(name: &[u8]) -> Result<()> {
    if name.is_empty() || name.len() > format::MAX_NAME_LEN || name.contains(&0) {
        return Err(TinyFsError::BadName);
    }
    Ok(())
}

/// Formats a fresh TinyFS image at `path`.
///
/// `nbytes` is rounded down to a multiple of [`BLOCKSIZE`]; volumes
/// shorter than 3 blocks (superblock + root inode + at least one free
/// block) cannot hold a usable file system and are rejected as corrupt,
/// per spec.md §9's resolution of the source's bare `-1` return.
pub fn mkfs(path: impl AsRef<Path>, nbytes: u64) -> Result<()> {
    let path = path.as_ref();
    let blocks = nbytes / BLOCKSIZE as u64;
    if blocks < 3 {
        return Err(TinyFsError::CorruptFs(
            "volume must hold at least 3 blocks (superblock, root inode, one free block)",
        ));
    }

    let mut disk = DiskManager::new();
    let handle = disk.open(path, blocks * BLOCKSIZE as u64)?;
    let mut volume = Volume::new(disk, handle, blocks as u32);

    volume.write_superblock(&Superblock {
        root_inode_block: ROOT_INODE_BLOCK as i32,
        free_head: 2,
    })?;

    let now = current_timestamp();
    volume.write_inode(
        ROOT_INODE_BLOCK,
        &Inode {
            name: b"/".to_vec(),
            size_bytes: 0,
            first_extent_block: 0,
            metaflags: INODE_FLAG_IN_USE,
            ctime: now,
            mtime: now,
            atime: now,
        },
    )?;

    for i in 2..blocks as u32 {
        let next_free = if i == blocks as u32 - 1 { 0 } else { (i + 1) as i32 };
        volume.write_free(i, &Free { next_free })?;
    }

    log::debug!("mkfs: formatted {} ({blocks} blocks)", path.display());
    Ok(())
}

/// One mounted TinyFS volume plus its open-file table: the owned value
/// every File API operation is a method on.
pub struct TinyFs {
    volume: Option<Volume>,
    open_files: OpenFileTable,
}

impl TinyFs {
    /// Constructs an unmounted controller, ready to have [`TinyFs::mount`]
    /// called on it.
    pub fn new() -> Self {
        Self {
            volume: None,
            open_files: OpenFileTable::new(),
        }
    }

    fn volume_mut(&mut self) -> Result<&mut Volume> {
        self.volume.as_mut().ok_or(TinyFsError::NotMounted)
    }

    /// Mounts the TinyFS image at `path`. Fails with
    /// [`TinyFsError::AlreadyMounted`] if this controller already has a
    /// volume mounted.
    pub fn mount(&mut self, path: impl AsRef<Path>) -> Result<()> {
        if self.volume.is_some() {
            return Err(TinyFsError::AlreadyMounted);
        }
        let path = path.as_ref();
        let mut disk = DiskManager::new();
        let handle = disk.open(path, 0)?;
        let block_count = disk.block_count(handle)?;
        let mut volume = Volume::new(disk, handle, block_count);

        let sb = match volume.read_superblock() {
            Ok(sb) => sb,
            Err(_) => {
                let _ = volume.disk.close(volume.handle);
                return Err(TinyFsError::CorruptFs("missing or malformed superblock"));
            }
        };
        if sb.root_inode_block != ROOT_INODE_BLOCK as i32 {
            let _ = volume.disk.close(volume.handle);
            return Err(TinyFsError::CorruptFs("unexpected root inode block"));
        }
        if block_count < 3 {
            let _ = volume.disk.close(volume.handle);
            return Err(TinyFsError::CorruptFs(
                "volume must hold at least 3 blocks (superblock, root inode, one free block)",
            ));
        }

        self.open_files = OpenFileTable::new();
        self.volume = Some(volume);
        log::debug!("mount: {} ({block_count} blocks)", path.display());
        Ok(())
    }

    /// Unmounts the current volume, closing its device handle and
    /// discarding the open-file table.
    pub fn unmount(&mut self) -> Result<()> {
        let mut volume = self.volume.take().ok_or(TinyFsError::NotMounted)?;
        volume.disk.close(volume.handle)?;
        self.open_files = OpenFileTable::new();
        log::debug!("unmount");
        Ok(())
    }

    /// Opens `name`, creating its inode if it doesn't already exist.
    /// Opening an already-open name returns the same descriptor rather
    /// than a second slot.
    pub fn open(&mut self, name: &[u8]) -> Result<FileDescriptor> {
        validate_name(name)?;
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        if let Some(fd) = self.open_files.find_by_name(name) {
            return Ok(fd);
        }

        let volume = self.volume_mut()?;
        let inode_block = match inode::find_by_name(volume, name)? {
            Some(block) => block,
            None => inode::create(volume, name)?,
        };
        self.open_files.insert(inode_block, name)
    }

    /// Closes `fd`, freeing its resource-table slot.
    pub fn close(&mut self, fd: FileDescriptor) -> Result<()> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        self.open_files.close(fd)
    }

    /// Replaces the contents of the file behind `fd` with `buffer`,
    /// resetting its file pointer to 0.
    pub fn write(&mut self, fd: FileDescriptor, buffer: &[u8]) -> Result<()> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let inode_block = self.open_files.get(fd)?.inode_block;
        let volume = self.volume_mut()?;
        let result = extent::write(volume, inode_block, buffer);
        // Whether the write succeeded, wrote zero bytes, or failed and
        // left the file empty, its data now starts at offset 0.
        self.open_files.get_mut(fd)?.file_pointer = 0;
        result
    }

    /// Deletes the file behind `fd`, returning its inode and extent
    /// blocks to the free list and releasing its resource-table slot.
    pub fn delete(&mut self, fd: FileDescriptor) -> Result<()> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let inode_block = self.open_files.get(fd)?.inode_block;
        let volume = self.volume_mut()?;
        inode::delete(volume, inode_block)?;
        self.open_files.close(fd)
    }

    /// Moves `fd`'s file pointer to `offset`, which must lie within
    /// `0..=size_bytes`.
    pub fn seek(&mut self, fd: FileDescriptor, offset: u32) -> Result<()> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let inode_block = self.open_files.get(fd)?.inode_block;
        let volume = self.volume_mut()?;
        let inode = volume.read_inode(inode_block)?;
        if offset as i64 > inode.size_bytes as i64 {
            return Err(TinyFsError::SeekOutOfRange);
        }
        self.open_files.get_mut(fd)?.file_pointer = offset;
        Ok(())
    }

    /// Reads one byte at the current file pointer and advances it by 1.
    /// Returns [`TinyFsError::EndOfFile`] once the pointer reaches the
    /// file's size.
    pub fn read_byte(&mut self, fd: FileDescriptor) -> Result<u8> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let entry = self.open_files.get(fd)?;
        let inode_block = entry.inode_block;
        let file_pointer = entry.file_pointer;

        let volume = self.volume_mut()?;
        let inode = volume.read_inode(inode_block)?;
        if file_pointer >= inode.size_bytes as u32 {
            return Err(TinyFsError::EndOfFile);
        }

        let extent_index = file_pointer as usize / format::EXTENT_PAYLOAD;
        let within = file_pointer as usize % format::EXTENT_PAYLOAD;

        let mut current = inode.first_extent_block as u32;
        for _ in 0..extent_index {
            if current == 0 {
                return Err(TinyFsError::CorruptFs("extent chain ended early"));
            }
            current = volume.read_extent(current)?.next_block;
        }
        if current == 0 {
            return Err(TinyFsError::CorruptFs("extent chain ended early"));
        }
        let extent = volume.read_extent(current)?;
        let byte = extent.data[within];

        self.open_files.get_mut(fd)?.file_pointer = file_pointer + 1;
        Ok(byte)
    }

    /// Renames the file behind `fd` to `new_name`, updating both the
    /// on-disk inode and the cached resource-table entry.
    pub fn rename(&mut self, fd: FileDescriptor, new_name: &[u8]) -> Result<()> {
        validate_name(new_name)?;
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let inode_block = self.open_files.get(fd)?.inode_block;
        let volume = self.volume_mut()?;
        let mut inode = volume.read_inode(inode_block)?;
        inode.name = new_name.to_vec();
        let now = current_timestamp();
        inode.mtime = now;
        inode.atime = now;
        volume.write_inode(inode_block, &inode)?;
        self.open_files.get_mut(fd)?.name = new_name.to_vec();
        Ok(())
    }

    /// Returns a snapshot of the metadata for the file behind `fd`.
    pub fn stat(&mut self, fd: FileDescriptor) -> Result<FileStat> {
        if self.volume.is_none() {
            return Err(TinyFsError::NotMounted);
        }
        let inode_block = self.open_files.get(fd)?.inode_block;
        let volume = self.volume_mut()?;
        let inode = volume.read_inode(inode_block)?;
        Ok(FileStat {
            name: inode.name,
            size_bytes: inode.size_bytes,
            ctime: inode.ctime,
            mtime: inode.mtime,
            atime: inode.atime,
            inode_block,
        })
    }

    /// Lists every in-use inode on the mounted volume, including the
    /// root (per spec.md §9's resolution of the source's ambiguity).
    pub fn readdir(&mut self) -> Result<Vec<DirEntry>> {
        let volume = self.volume_mut()?;
        let mut entries = Vec::new();
        for block in 0..volume.block_count() {
            let inode = match volume.read_inode(block) {
                Ok(inode) => inode,
                Err(_) => continue,
            };
            if !inode.is_in_use() {
                continue;
            }
            if inode.name.is_empty() && inode.size_bytes == 0 && block != ROOT_INODE_BLOCK {
                continue;
            }
            entries.push(DirEntry {
                inode_block: block,
                name: inode.name,
                size_bytes: inode.size_bytes,
            });
        }
        Ok(entries)
    }
}

impl Default for TinyFs {
    fn default() -> Self {
        Self::new()
    }
}
