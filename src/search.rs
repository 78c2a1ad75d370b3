// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Range search: recursive trie descent pruned by the query window.

use std::collections::HashSet;
use std::io::{Read, Seek};

use crate::codec::{EventData, EventPointer, TrieNode};
use crate::error::Result;
use crate::event::Event;
use crate::instant::su64;
use crate::prefix::fill1;

/// Returns every event whose indexed interval intersects `[qlo, qhi]`,
/// deduplicated by event-data offset. Order is the trie's pre-order
/// traversal restricted to non-pruned paths; it is not time-sorted.
pub(crate) fn search<F: Read + Seek>(
    file: &mut F,
    root: u64,
    qlo: i64,
    qhi: i64,
) -> Result<Vec<Event>> {
    let mut results = Vec::new();
    let mut seen = HashSet::new();
    visit_collect(file, root, 0, 0, su64(qlo), su64(qhi), &mut seen, &mut results)?;
    Ok(results)
}

/// Same traversal as [`search`] but counts distinct events without
/// reading their names. A read-only convenience for callers that only
/// need a count.
pub(crate) fn search_count<F: Read + Seek>(
    file: &mut F,
    root: u64,
    qlo: i64,
    qhi: i64,
) -> Result<usize> {
    let mut seen = HashSet::new();
    visit_count(file, root, 0, 0, su64(qlo), su64(qhi), &mut seen)?;
    Ok(seen.len())
}

fn disjoint(prefix: u64, precision: u8, qlo: u64, qhi: u64) -> bool {
    let cover_hi = prefix | fill1(64 - precision as u32);
    cover_hi < qlo || prefix > qhi
}

fn visit_collect<F: Read + Seek>(
    file: &mut F,
    node_ptr: u64,
    prefix: u64,
    precision: u8,
    qlo: u64,
    qhi: u64,
    seen: &mut HashSet<u64>,
    results: &mut Vec<Event>,
) -> Result<()> {
    if node_ptr == 0 || disjoint(prefix, precision, qlo, qhi) {
        return Ok(());
    }
    let node = TrieNode::read_at(file, node_ptr)?;

    let mut cursor = node.event;
    while cursor != 0 {
        let eptr = EventPointer::read_at(file, cursor)?;
        if seen.insert(eptr.ptr) {
            let data = EventData::read_at(file, eptr.ptr)?;
            results.push(Event {
                start: data.start,
                end: data.end,
                name: data.name,
                id: eptr.ptr,
            });
        }
        cursor = eptr.next;
    }

    if precision < 64 {
        let bit = 1u64 << (63 - precision as u32);
        visit_collect(file, node.child0, prefix, precision + 1, qlo, qhi, seen, results)?;
        visit_collect(file, node.child1, prefix | bit, precision + 1, qlo, qhi, seen, results)?;
    }
    Ok(())
}

fn visit_count<F: Read + Seek>(
    file: &mut F,
    node_ptr: u64,
    prefix: u64,
    precision: u8,
    qlo: u64,
    qhi: u64,
    seen: &mut HashSet<u64>,
) -> Result<()> {
    if node_ptr == 0 || disjoint(prefix, precision, qlo, qhi) {
        return Ok(());
    }
    let node = TrieNode::read_at(file, node_ptr)?;

    let mut cursor = node.event;
    while cursor != 0 {
        let eptr = EventPointer::read_at(file, cursor)?;
        seen.insert(eptr.ptr);
        cursor = eptr.next;
    }

    if precision < 64 {
        let bit = 1u64 << (63 - precision as u32);
        visit_count(file, node.child0, prefix, precision + 1, qlo, qhi, seen)?;
        visit_count(file, node.child1, prefix | bit, precision + 1, qlo, qhi, seen)?;
    }
    Ok(())
}
