// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Copy-compacting defragmenter.
//!
//! A type-aware copying collector: each record type keeps its own
//! `src_offset -> dst_offset` map, copied exactly once on first visit.
//! Most pointer fields name another record's start and are remapped by
//! recursively copying that record. Two fields are different: an
//! event-pointer's `prev` and an event-data's `firstev`/an event-pointer's
//! `nextsm` name either a *slot* inside another record (`prev`) or a
//! record reached through a second, cross-cutting overlay structure (the
//! same-event chain) rather than the tree the trie/bucket walk already
//! covers. Both are handled by the caller context (the new `prev` slot is
//! always known before the child is copied, since the caller just wrote
//! it) rather than by a generic recursive copy, and same-event links are
//! resolved in a deferred second pass once every event-pointer has a
//! mapped destination.

use std::collections::HashMap;
use std::io::{Read, Seek, Write};

use crate::codec::{self, EventData, EventPointer, Header, TrieNode};
use crate::error::{Error, Result};

/// Telemetry and the id remap from one `defrag` run, so an embedder
/// holding a stale `id` (e.g. a UI selection) can rebind it.
#[derive(Debug, Clone)]
pub struct DefragReport {
    pub old_to_new: HashMap<u64, u64>,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

struct DefragState {
    trie: HashMap<u64, u64>,
    eptr: HashMap<u64, u64>,
    data: HashMap<u64, u64>,
    /// (output field offset, old event-pointer offset it should resolve
    /// to once copied, or 0) deferred until every event-pointer has been
    /// visited via the trie/bucket walk.
    same_event_patches: Vec<(u64, u64)>,
}

/// Rebuilds the file reachable from `root_in` into `output`, starting a
/// fresh header with the given `bitn`. Returns the id remap and the
/// before/after file sizes.
pub(crate) fn defrag<R: Read + Seek, W: Write + Seek>(
    input: &mut R,
    output: &mut W,
    root_in: u64,
    bitn: u8,
) -> Result<DefragReport> {
    let bytes_before = codec::seek_eof(input)?;

    let header = Header::write(output, 0, bitn)?;
    let mut state = DefragState {
        trie: HashMap::new(),
        eptr: HashMap::new(),
        data: HashMap::new(),
        same_event_patches: Vec::new(),
    };

    codec::seek_eof(output)?;
    let new_root = copy_trie_node(input, output, root_in, &mut state)?;
    codec::patch_u64(output, header.bit1_pos, new_root)?;

    for &(field_pos, old_target) in &state.same_event_patches {
        let new_target = if old_target == 0 {
            0
        } else {
            *state
                .eptr
                .get(&old_target)
                .ok_or_else(|| Error::format("defrag: same-event link targets an unreachable event-pointer"))?
        };
        codec::patch_u64(output, field_pos, new_target)?;
    }

    let bytes_after = codec::seek_eof(output)?;

    Ok(DefragReport { old_to_new: state.data, bytes_before, bytes_after })
}

fn copy_trie_node<R: Read + Seek, W: Write + Seek>(
    input: &mut R,
    output: &mut W,
    src: u64,
    state: &mut DefragState,
) -> Result<u64> {
    if let Some(&dst) = state.trie.get(&src) {
        return Ok(dst);
    }
    let node = TrieNode::read_at(input, src)?;
    codec::seek_eof(output)?;
    let new_node = TrieNode::write_new(output)?;
    state.trie.insert(src, new_node.offset);

    let new_child0 = if node.child0 != 0 {
        copy_trie_node(input, output, node.child0, state)?
    } else {
        0
    };
    let new_child1 = if node.child1 != 0 {
        copy_trie_node(input, output, node.child1, state)?
    } else {
        0
    };
    let new_event = if node.event != 0 {
        copy_event_pointer(input, output, node.event, new_node.event_pos, state)?
    } else {
        0
    };

    codec::patch_u64(output, new_node.child0_pos, new_child0)?;
    codec::patch_u64(output, new_node.child1_pos, new_child1)?;
    codec::patch_u64(output, new_node.event_pos, new_event)?;

    Ok(new_node.offset)
}

/// `new_prev` is the already-known new address of the slot that will
/// forward-point at this record (the caller just wrote, or is about to
/// patch, that slot itself).
fn copy_event_pointer<R: Read + Seek, W: Write + Seek>(
    input: &mut R,
    output: &mut W,
    src: u64,
    new_prev: u64,
    state: &mut DefragState,
) -> Result<u64> {
    if let Some(&dst) = state.eptr.get(&src) {
        return Ok(dst);
    }
    let eptr = EventPointer::read_at(input, src)?;
    codec::seek_eof(output)?;
    let new_eptr = EventPointer::write_new(output, 0, new_prev, 0, 0)?;
    state.eptr.insert(src, new_eptr.offset);
    state.same_event_patches.push((new_eptr.nextsm_pos, eptr.nextsm));

    let new_next = if eptr.next != 0 {
        copy_event_pointer(input, output, eptr.next, new_eptr.next_pos, state)?
    } else {
        0
    };
    let new_ptr = copy_event_data(input, output, eptr.ptr, state)?;

    codec::patch_u64(output, new_eptr.next_pos, new_next)?;
    codec::patch_u64(output, new_eptr.ptr_pos, new_ptr)?;

    Ok(new_eptr.offset)
}

fn copy_event_data<R: Read + Seek, W: Write + Seek>(
    input: &mut R,
    output: &mut W,
    src: u64,
    state: &mut DefragState,
) -> Result<u64> {
    if let Some(&dst) = state.data.get(&src) {
        return Ok(dst);
    }
    let data = EventData::read_at(input, src)?;
    codec::seek_eof(output)?;
    let new_data = EventData::write_new(output, data.start, data.end, &data.name)?;
    state.data.insert(src, new_data.offset);
    state.same_event_patches.push((new_data.firstev_pos, data.firstev));

    Ok(new_data.offset)
}
