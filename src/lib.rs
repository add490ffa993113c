//! TinyFS: a minimal, single-volume file system implemented on top of an
//! emulated block device.
//!
//! A flat namespace of small files lives in a fixed-size image file,
//! structured as a superblock, a root inode, a singly linked free list,
//! and per-file extent chains — see [`format`] for the exact on-disk
//! layout. [`tinyfs::TinyFs`] is the entry point: [`tinyfs::mkfs`] formats
//! an image, [`TinyFs::mount`](tinyfs::TinyFs::mount) opens it, and the
//! rest of the File API (`open`/`write`/`read_byte`/...) are methods on
//! the mounted value.

pub mod allocator;
pub mod device;
pub mod error;
pub mod extent;
pub mod format;
pub mod inode;
pub mod openfile;
pub mod tinyfs;
pub mod util;
pub mod volume;

pub use error::{Result, TinyFsError};
pub use openfile::FileDescriptor;
pub use tinyfs::{mkfs, DirEntry, FileStat, TinyFs, DEFAULT_DISK_NAME, DEFAULT_DISK_SIZE};
