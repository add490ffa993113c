//! The extent chain engine: replaces an inode's data with a new byte
//! buffer, eagerly releasing the old chain before building the new one.
//!
//! This ordering keeps the on-disk layout simple — no in-place editing
//! of partial chains, no copy-on-write — at the documented cost that a
//! write which fails to find enough free space loses the file's
//! previous contents. That is a deliberate trade-off, not a bug: it is
//! the single most important failure-mode contract in this crate.

use crate::allocator;
use crate::error::Result;
use crate::format::{Extent, EXTENT_PAYLOAD};
use crate::util::{ceil_div, current_timestamp};
use crate::volume::Volume;

/// Replaces `inode_block`'s data with `buffer`, returning once the inode
/// has been updated to point at the new chain (or, for an empty buffer,
/// at no chain).
pub fn write(volume: &mut Volume, inode_block: u32, buffer: &[u8]) -> Result<()> {
    let mut inode = volume.read_inode(inode_block)?;

    // Step 1-2: release the old chain, tolerating a partial walk the
    // same way inode deletion does.
    let mut current = inode.first_extent_block as u32;
    while current != 0 {
        let extent = match volume.read_extent(current) {
            Ok(extent) => extent,
            Err(_) => break,
        };
        let next = extent.next_block;
        allocator::release(volume, current)?;
        current = next;
    }

    if buffer.is_empty() {
        inode.first_extent_block = 0;
        inode.size_bytes = 0;
        inode.mtime = current_timestamp();
        volume.write_inode(inode_block, &inode)?;
        log::debug!("extent: wrote 0 bytes to inode {inode_block}, chain released");
        return Ok(());
    }

    let need = ceil_div(buffer.len(), EXTENT_PAYLOAD);

    // Step 5: allocate `need` blocks, unwinding on failure so the volume
    // is left with no new chain (the old one is already gone, per the
    // trade-off documented above). The inode itself must also be
    // rewritten empty here: the old chain was already released above, so
    // leaving the inode's stale `first_extent_block`/`size_bytes` in
    // place would make those old blocks reachable from both the free
    // list and a live inode at once.
    let mut allocated = Vec::with_capacity(need);
    for _ in 0..need {
        match allocator::allocate(volume) {
            Ok(block) => allocated.push(block),
            Err(e) => {
                for block in &allocated {
                    allocator::release(volume, *block)?;
                }
                inode.first_extent_block = 0;
                inode.size_bytes = 0;
                inode.mtime = current_timestamp();
                volume.write_inode(inode_block, &inode)?;
                log::debug!("extent: write failed for inode {inode_block}, file left empty");
                return Err(e);
            }
        }
    }

    // Step 6: link and fill each extent in order.
    let mut written = 0usize;
    for (i, &block) in allocated.iter().enumerate() {
        let next_block = allocated.get(i + 1).copied().unwrap_or(0);
        let take = (buffer.len() - written).min(EXTENT_PAYLOAD);
        let mut data = vec![0u8; EXTENT_PAYLOAD];
        data[..take].copy_from_slice(&buffer[written..written + take]);
        written += take;
        volume.write_extent(
            block,
            &Extent {
                next_block,
                data,
            },
        )?;
    }

    // Step 7: point the inode at the new chain.
    inode.first_extent_block = allocated[0] as i32;
    inode.size_bytes = buffer.len() as i32;
    inode.mtime = current_timestamp();
    volume.write_inode(inode_block, &inode)?;
    log::debug!(
        "extent: wrote {} bytes to inode {inode_block} across {} blocks",
        buffer.len(),
        allocated.len()
    );
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
    fn write_splits_across_extents() {
        let (_dir, mut volume) = make_volume(10);
        let inode_block = crate::inode::create(&mut volume, b"f").unwrap();
        let data = vec![7u8; 300];
        write(&mut volume, inode_block, &data).unwrap();

        let inode = volume.read_inode(inode_block).unwrap();
        assert_eq!(inode.size_bytes, 300);
        let mut chain_len = 0;
        let mut current = inode.first_extent_block as u32;
        let mut collected = Vec::new();
        while current != 0 {
            let extent = volume.read_extent(current).unwrap();
            chain_len += 1;
            collected.extend_from_slice(&extent.data[..(300 - collected.len()).min(EXTENT_PAYLOAD)]);
            current = extent.next_block;
        }
        assert_eq!(chain_len, 2);
        assert_eq!(collected, data);
    }

    #[test]
    fn write_zero_clears_chain() {
        let (_dir, mut volume) = make_volume(10);
        let inode_block = crate::inode::create(&mut volume, b"f").unwrap();
        write(&mut volume, inode_block, b"hello").unwrap();
        write(&mut volume, inode_block, b"").unwrap();
        let inode = volume.read_inode(inode_block).unwrap();
        assert_eq!(inode.size_bytes, 0);
        assert_eq!(inode.first_extent_block, 0);
    }

    #[test]
    fn write_failure_leaves_file_empty() {
        // 5 blocks total: the inode takes block 2, leaving blocks 3-4
        // free (2 blocks). The first write takes block 3 (1 extent for
        // 10 bytes), leaving block 4 free. The second write releases
        // block 3 back to the free list first (now 2 free: 3 and 4) but
        // needs 3 extents for 600 bytes — one short, so it must fail.
        let (_dir, mut volume) = make_volume(5);
        let inode_block = crate::inode::create(&mut volume, b"f").unwrap();
        write(&mut volume, inode_block, &vec![1u8; 10]).unwrap();
        let result = write(&mut volume, inode_block, &vec![2u8; 600]);
        assert!(result.is_err());
        let inode = volume.read_inode(inode_block).unwrap();
        assert_eq!(inode.size_bytes, 0);
        assert_eq!(inode.first_extent_block, 0);
    }
}
