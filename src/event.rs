// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event insertion and removal.
//!
//! An event is stored once as an event-data record and indexed at every
//! trie node of its key range's minimal prefix cover via an event-pointer
//! record. Each event-pointer is simultaneously a node of the trie node's
//! doubly-linked bucket and a node of the event's own singly-linked
//! same-event chain.
//!
//! Every `prev` field, on both an event-pointer and the trie node's
//! `event` field's conceptual slot, holds the address of the 8-byte slot
//! that forward-points at the record, never the record's own offset.
//! Unlinking is then always "read the forward value out of my `prev`
//! slot, write it into the slot that used to forward-point at me",
//! independent of whether that slot lives in a trie node or a sibling
//! event-pointer.

use std::io::{Read, Seek, Write};

use crate::codec::{self, EventData, EventPointer, TrieNode};
use crate::error::Result;
use crate::instant::su64;
use crate::prefix::cover;
use crate::trie::walk_or_create;

/// An event as handed back to callers: owns its name, carries the stable
/// id (its event-data record's file offset) a caller can later pass to
/// [`crate::Datefile::remove`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub start: i64,
    pub end: i64,
    pub name: String,
    pub id: u64,
}

/// Appends an event-data record and links one event-pointer into the
/// bucket of every trie node in the minimal prefix cover of
/// `[su64(start), su64(end)]`. Returns the event's `id` (its event-data
/// record's offset).
pub(crate) fn add<F: Read + Write + Seek>(
    file: &mut F,
    root: u64,
    start: i64,
    end: i64,
    name: &str,
) -> Result<u64> {
    codec::seek_eof(file)?;
    let data = EventData::write_new(file, start, end, name)?;
    let id = data.offset;

    let mut chain_tail_pos = data.firstev_pos;
    for (prefix, precision) in cover(su64(start), su64(end)) {
        let node_at = walk_or_create(file, root, prefix, precision)?;
        let node = TrieNode::read_at(file, node_at)?;
        let old_head = node.event;

        codec::seek_eof(file)?;
        let eptr = EventPointer::write_new(file, old_head, node.event_pos, 0, id)?;

        if old_head != 0 {
            let head = EventPointer::read_at(file, old_head)?;
            codec::patch_u64(file, head.prev_pos, eptr.next_pos)?;
        }
        codec::patch_u64(file, node.event_pos, eptr.offset)?;
        codec::patch_u64(file, chain_tail_pos, eptr.offset)?;
        chain_tail_pos = eptr.nextsm_pos;
    }
    Ok(id)
}

/// Unlinks every event-pointer referencing the event-data at `id` from
/// its bucket. The event-data record itself is left untouched (and
/// unreachable) until the next `defrag`. A no-op if the event is already
/// unlinked (its same-event chain is empty).
pub(crate) fn remove<F: Read + Write + Seek>(file: &mut F, id: u64) -> Result<()> {
    let data = EventData::read_at(file, id)?;
    let mut cursor = data.firstev;
    while cursor != 0 {
        let eptr = EventPointer::read_at(file, cursor)?;
        codec::patch_u64(file, eptr.prev, eptr.next)?;
        if eptr.next != 0 {
            let successor = EventPointer::read_at(file, eptr.next)?;
            codec::patch_u64(file, successor.prev_pos, eptr.prev)?;
        }
        cursor = eptr.nextsm;
    }
    Ok(())
}
