//! The error taxonomy returned by every File API operation.

use std::io;

/// Everything that can go wrong in TinyFS, grouped the way the on-disk
/// design document groups them: configuration, state, resource, integrity
/// and I/O errors.
#[derive(Debug, thiserror::Error)]
pub enum TinyFsError {
    /// A file or volume name was empty, too long, or otherwise invalid.
    #[error("invalid name (must be 1..=8 bytes, no NUL)")]
    BadName,
    /// A file descriptor did not refer to an open file.
    #[error("invalid file descriptor")]
    BadFd,
    /// A `seek` offset was negative or past the end of the file.
    #[error("seek offset out of range")]
    SeekOutOfRange,
    /// An operation requiring a mounted volume was called without one.
    #[error("no volume is mounted")]
    NotMounted,
    /// `mount` was called while a volume was already mounted.
    #[error("a volume is already mounted")]
    AlreadyMounted,
    /// The open-file table has no free slots.
    #[error("too many open files")]
    TooManyOpen,
    /// `read_byte` was called at or past the end of the file.
    #[error("end of file")]
    EndOfFile,
    /// The free list is exhausted.
    #[error("no free space on volume")]
    NoSpace,
    /// A block's tag or magic did not match what was expected, or a
    /// chain was found to be malformed.
    #[error("corrupt file system: {0}")]
    CorruptFs(&'static str),
    /// The underlying device file could not be opened.
    #[error("failed to open disk: {0}")]
    DiskOpen(io::Error),
    /// A block read failed.
    #[error("failed to read disk: {0}")]
    DiskRead(io::Error),
    /// A block write failed.
    #[error("failed to write disk: {0}")]
    DiskWrite(io::Error),
    /// Closing the underlying device file failed.
    #[error("failed to close disk: {0}")]
    DiskClose(io::Error),
    /// A disk I/O error that isn't attributable to a specific read,
    /// write, open or close call (e.g. a chain walk hitting a bad
    /// handle).
    #[error("disk I/O error: {0}")]
    DiskIo(io::Error),
}

impl From<io::Error> for TinyFsError {
    /// Used at call sites that can't attribute the failure to a more
    /// specific phase; prefer `DiskOpen`/`DiskRead`/`DiskWrite`/`DiskClose`
    /// directly where the phase is known.
    fn from(e: io::Error) -> Self {
        TinyFsError::DiskIo(e)
    }
}

pub type Result<T> = std::result::Result<T, TinyFsError>;
