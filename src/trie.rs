// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary trie navigator and allocator.
//!
//! Walks the on-disk trie from a given root, one bit of the prefix at a
//! time, the same shape as a page-table walk: read the current table,
//! pick a slot by one bit of the address, and if the slot is empty,
//! allocate a fresh table and patch the slot before continuing down.

use std::io::{Read, Seek, Write};

use crate::codec::{self, TrieNode};
use crate::error::Result;

/// Walks `precision` bits of `prefix` starting at `root`, allocating any
/// absent child along the way, and returns the offset of the terminal
/// trie node.
///
/// Each iteration recomputes its bit mask as `1 << (63 - i)` rather than
/// shifting a carried mask, so that `precision == 0` is a correct no-op
/// walk that never consults a mask at all.
pub(crate) fn walk_or_create<F: Read + Write + Seek>(
    file: &mut F,
    root: u64,
    prefix: u64,
    precision: u8,
) -> Result<u64> {
    let mut node_at = root;
    for i in 0..precision {
        let mask = 1u64 << (63 - i as u32);
        let node = TrieNode::read_at(file, node_at)?;
        let (child, child_pos) = if prefix & mask != 0 {
            (node.child1, node.child1_pos)
        } else {
            (node.child0, node.child0_pos)
        };
        node_at = if child != 0 {
            child
        } else {
            codec::seek_eof(file)?;
            let fresh = TrieNode::write_new(file)?;
            codec::patch_u64(file, child_pos, fresh.offset)?;
            fresh.offset
        };
    }
    Ok(node_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Header;
    use std::io::Cursor;

    fn new_store() -> (Cursor<Vec<u8>>, u64) {
        let mut buf = Cursor::new(Vec::new());
        Header::write(&mut buf, 0, 64).unwrap();
        codec::seek_eof(&mut buf).unwrap();
        let root = TrieNode::write_new(&mut buf).unwrap().offset;
        (buf, root)
    }

    #[test]
    fn precision_zero_returns_root_unchanged() {
        let (mut buf, root) = new_store();
        let terminal = walk_or_create(&mut buf, root, 0xdead_beef, 0).unwrap();
        assert_eq!(terminal, root);
    }

    #[test]
    fn allocates_children_on_first_visit() {
        let (mut buf, root) = new_store();
        let terminal = walk_or_create(&mut buf, root, 1u64 << 63, 1).unwrap();
        assert_ne!(terminal, root);

        let parent = TrieNode::read_at(&mut buf, root).unwrap();
        assert_eq!(parent.child1, terminal);
        assert_eq!(parent.child0, 0);
    }

    #[test]
    fn repeated_walk_reuses_existing_nodes() {
        let (mut buf, root) = new_store();
        let prefix = 0b101u64 << 61;
        let first = walk_or_create(&mut buf, root, prefix, 3).unwrap();
        let second = walk_or_create(&mut buf, root, prefix, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn diverging_prefixes_allocate_distinct_paths() {
        let (mut buf, root) = new_store();
        let a = walk_or_create(&mut buf, root, 0u64, 2).unwrap();
        let b = walk_or_create(&mut buf, root, 1u64 << 63, 2).unwrap();
        assert_ne!(a, b);
    }
}
