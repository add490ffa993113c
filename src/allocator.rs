//! The free-list allocator: allocate and release single blocks against
//! the head-of-list pointer kept in the superblock.
//!
//! Ordering matters here and is the one place in the crate where write
//! order is itself an invariant, not just an implementation detail: a
//! crash between steps must leave the free list either missing a block
//! (a leak, recoverable) or not yet shortened (still valid) — never
//! cyclic, never double-counted.

use crate::error::{Result, TinyFsError};
use crate::format::Free;
use crate::volume::Volume;

/// Removes and returns the block at the head of the free list.
///
/// The returned block's contents are undefined; the caller must write a
/// new record into it before any invariant covers it again.
pub fn allocate(volume: &mut Volume) -> Result<u32> {
    let mut sb = volume.read_superblock()?;
    if sb.free_head == 0 {
        return Err(TinyFsError::NoSpace);
    }
    let block = sb.free_head as u32;
    let head = volume.read_free(block)?;
    sb.free_head = head.next_free;
    // The updated superblock must be written before the caller starts
    // repurposing `block` — otherwise a crash would leave both the
    // superblock and the stale free block pointing at it.
    volume.write_superblock(&sb)?;
    log::trace!("allocator: allocated block {block}, new free_head={}", sb.free_head);
    Ok(block)
}

/// Returns `block` to the head of the free list.
pub fn release(volume: &mut Volume, block: u32) -> Result<()> {
    let mut sb = volume.read_superblock()?;
    let free = Free {
        next_free: sb.free_head,
    };
    // The free block itself must be written before the superblock is
    // updated to point at it — otherwise a crash would make the
    // superblock's head dangle.
    volume.write_free(block, &free)?;
    sb.free_head = block as i32;
    volume.write_superblock(&sb)?;
    log::trace!("allocator: released block {block}, new free_head={}", sb.free_head);
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::device::DiskManager;
    use crate::format::{BlockTag, Superblock, BLOCKSIZE};
    use crate::volume::Volume;

    fn make_volume(blocks: u32) -> (tempfile::TempDir, Volume) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut disk = DiskManager::new();
        let handle = disk.open(&path, BLOCKSIZE as u64 * blocks as u64).unwrap();
        let mut volume = Volume::new(disk, handle, blocks);
        let sb = Superblock {
            root_inode_block: 1,
            free_head: 2,
        };
        volume.write_superblock(&sb).unwrap();
        for i in 2..blocks {
            let next = if i == blocks - 1 { 0 } else { (i + 1) as i32 };
            volume
                .write_free(i, &crate::format::Free { next_free: next })
                .unwrap();
        }
        (dir, volume)
    }

    #[test]
    fn allocate_then_release_restores_head() {
        let (_dir, mut volume) = make_volume(5);
        let a = allocate(&mut volume).unwrap();
        assert_eq!(a, 2);
        let sb = volume.read_superblock().unwrap();
        assert_eq!(sb.free_head, 3);

        release(&mut volume, a).unwrap();
        let sb = volume.read_superblock().unwrap();
        assert_eq!(sb.free_head, 2);
        let head = volume.read_free(2).unwrap();
        assert_eq!(head.next_free, 3);
    }

    #[test]
    fn allocate_exhausts_with_no_space() {
        let (_dir, mut volume) = make_volume(3);
        let a = allocate(&mut volume).unwrap();
        assert_eq!(a, 2);
        assert!(matches!(allocate(&mut volume), Err(super::TinyFsError::NoSpace)));
    }

    #[test]
    fn released_block_is_tagged_free() {
        let (_dir, mut volume) = make_volume(4);
        let a = allocate(&mut volume).unwrap();
        release(&mut volume, a).unwrap();
        let mut buf = [0u8; BLOCKSIZE];
        volume.disk.read_block(volume.handle, a, &mut buf).unwrap();
        assert_eq!(buf[0], BlockTag::Free as u8);
    }
}
