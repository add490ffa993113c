//! The inode store: find a file by name, create a new inode, destroy one.
//!
//! There is no directory structure, so `find_by_name` is a linear scan —
//! acceptable because `N` (the volume's block count) is small by design.

use crate::allocator;
use crate::error::{Result, TinyFsError};
use crate::format::{Inode, INODE_FLAG_IN_USE};
use crate::util::current_timestamp;
use crate::volume::Volume;

/// Scans every block from 2 up to the volume's actual block count,
/// returning the block number of the first in-use inode whose name
/// matches. Blocks whose tag isn't `INODE` (free blocks, extents) are
/// skipped, not treated as a scan-ending failure; only a genuine I/O
/// error ends the scan early.
pub fn find_by_name(volume: &mut Volume, name: &[u8]) -> Result<Option<u32>> {
    for block in 2..volume.block_count() {
        let inode = match volume.read_inode(block) {
            Ok(inode) => inode,
            Err(TinyFsError::CorruptFs(_)) => continue,
            Err(_) => break,
        };
        if inode.is_in_use() && inode.name == name {
            return Ok(Some(block));
        }
    }
    Ok(None)
}

/// Allocates a block and writes a fresh, empty inode for `name` into it.
pub fn create(volume: &mut Volume, name: &[u8]) -> Result<u32> {
    let block = allocator::allocate(volume)?;
    let now = current_timestamp();
    let inode = Inode {
        name: name.to_vec(),
        size_bytes: 0,
        first_extent_block: 0,
        metaflags: INODE_FLAG_IN_USE,
        ctime: now,
        mtime: now,
        atime: now,
    };
    volume.write_inode(block, &inode)?;
    log::debug!("inode: created '{}' at block {block}", String::from_utf8_lossy(name));
    Ok(block)
}

/// Releases every block in `inode_block`'s extent chain, then the inode
/// block itself.
///
/// On a read error mid-walk, releases whatever has been collected so far
/// and surfaces the error instead of reaching the inode-release step —
/// this may leak the remaining extent blocks (and the inode block) but
/// preserves the free-list/reachability invariant for blocks already
/// released.
pub fn delete(volume: &mut Volume, inode_block: u32) -> Result<()> {
    let inode = volume.read_inode(inode_block)?;
    let mut current = inode.first_extent_block as u32;
    while current != 0 {
        let extent = volume.read_extent(current)?;
        let next = extent.next_block;
        allocator::release(volume, current)?;
        current = next;
    }
    allocator::release(volume, inode_block)?;
    log::debug!("inode: deleted block {inode_block}");
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::DiskManager;
    use crate::format::{Free, Superblock, BLOCKSIZE};

    fn make_volume(blocks: u32) -> (tempfile::TempDir, Volume) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("disk.img");
        let mut disk = DiskManager::new();
        let handle = disk.open(&path, BLOCKSIZE as u64 * blocks as u64).unwrap();
        let mut volume = Volume::new(disk, handle, blocks);
        volume
            .write_superblock(&Superblock {
                root_inode_block: 1,
                free_head: 2,
            })
            .unwrap();
        for i in 2..blocks {
            let next = if i == blocks - 1 { 0 } else { (i + 1) as i32 };
            volume.write_free(i, &Free { next_free: next }).unwrap();
        }
        (dir, volume)
    }

    #[test]
    fn create_then_find_roundtrips() {
        let (_dir, mut volume) = make_volume(6);
        let block = create(&mut volume, b"foo").unwrap();
        assert_eq!(find_by_name(&mut volume, b"foo").unwrap(), Some(block));
        assert_eq!(find_by_name(&mut volume, b"bar").unwrap(), None);
    }

    #[test]
    fn delete_releases_inode_and_extents() {
        let (_dir, mut volume) = make_volume(6);
        let block = create(&mut volume, b"foo").unwrap();
        let e1 = allocator::allocate(&mut volume).unwrap();
        let e2 = allocator::allocate(&mut volume).unwrap();
        volume
            .write_extent(
                e1,
                &crate::format::Extent {
                    next_block: e2,
                    data: vec![0; crate::format::EXTENT_PAYLOAD],
                },
            )
            .unwrap();
        volume
            .write_extent(
                e2,
                &crate::format::Extent {
                    next_block: 0,
                    data: vec![0; crate::format::EXTENT_PAYLOAD],
                },
            )
            .unwrap();
        let mut inode = volume.read_inode(block).unwrap();
        inode.first_extent_block = e1 as i32;
        volume.write_inode(block, &inode).unwrap();

        let free_before = volume.read_superblock().unwrap().free_head;
        delete(&mut volume, block).unwrap();
        assert_eq!(find_by_name(&mut volume, b"foo").unwrap(), None);
        // All three blocks (inode + 2 extents) are back on the free list.
        let mut count = 0;
        let mut next = volume.read_superblock().unwrap().free_head;
        while next != 0 && count < 10 {
            count += 1;
            next = volume.read_free(next as u32).unwrap().next_free;
        }
        assert!(count >= 3);
        let _ = free_before;
    }
}
