//! `Volume` binds an open disk handle to the typed block records, giving
//! the allocator, inode store and extent engine a read/write interface in
//! terms of [`Superblock`], [`Inode`], [`Extent`] and [`Free`] records
//! instead of raw byte buffers.

use crate::device::{DiskHandle, DiskManager};
use crate::error::Result;
use crate::format::{Extent, Free, Inode, Superblock, BLOCKSIZE};

pub struct Volume {
    pub(crate) disk: DiskManager,
    pub(crate) handle: DiskHandle,
    pub(crate) block_count: u32,
}

impl Volume {
    pub(crate) fn new(disk: DiskManager, handle: DiskHandle, block_count: u32) -> Self {
        Self {
            disk,
            handle,
            block_count,
        }
    }

    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    pub fn read_superblock(&mut self) -> Result<Superblock> {
        let mut buf = [0u8; BLOCKSIZE];
        self.disk.read_block(self.handle, 0, &mut buf)?;
        Superblock::decode(&buf)
    }

    pub fn write_superblock(&mut self, sb: &Superblock) -> Result<()> {
        self.disk.write_block(self.handle, 0, &sb.encode())
    }

    pub fn read_inode(&mut self, block: u32) -> Result<Inode> {
        let mut buf = [0u8; BLOCKSIZE];
        self.disk.read_block(self.handle, block, &mut buf)?;
        Inode::decode(&buf)
    }

    pub fn write_inode(&mut self, block: u32, inode: &Inode) -> Result<()> {
        self.disk.write_block(self.handle, block, &inode.encode())
    }

    pub fn read_extent(&mut self, block: u32) -> Result<Extent> {
        let mut buf = [0u8; BLOCKSIZE];
        self.disk.read_block(self.handle, block, &mut buf)?;
        Extent::decode(&buf)
    }

    pub fn write_extent(&mut self, block: u32, extent: &Extent) -> Result<()> {
        self.disk.write_block(self.handle, block, &extent.encode())
    }

    pub fn read_free(&mut self, block: u32) -> Result<Free> {
        let mut buf = [0u8; BLOCKSIZE];
        self.disk.read_block(self.handle, block, &mut buf)?;
        Free::decode(&buf)
    }

    pub fn write_free(&mut self, block: u32, free: &Free) -> Result<()> {
        self.disk.write_block(self.handle, block, &free.encode())
    }
}
