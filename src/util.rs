//! Small helpers shared across the crate.

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current time as seconds since the Unix epoch, truncated to
/// 32 bits the way the on-disk timestamp fields are. Wraps in 2106 — an
/// acknowledged limitation inherited from the on-disk format.
pub fn current_timestamp() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the Unix epoch")
        .as_secs() as u32
}

/// Number of 250-byte extents needed to hold `size` bytes.
pub fn ceil_div(size: usize, chunk: usize) -> usize {
    size.div_ceil(chunk)
}
