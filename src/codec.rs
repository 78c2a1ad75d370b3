// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fixed-layout record codec.
//!
//! Every record type captures its own start offset and the byte offset of
//! each field as it is read or written, so that a caller can later seek
//! straight to a single field (a parent's child pointer, a bucket head's
//! back-pointer, a same-event chain link) and patch it in place without
//! rewriting the whole record. All integers are big-endian; signed fields
//! go through [`crate::instant`]'s remap on the way in and out.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Error, Result};
use crate::instant::{su64, us64};

pub(crate) const MAGIC: &[u8; 8] = b"datefile";
const RESERVED_16: [u8; 16] = [0u8; 16];

/// On-disk byte lengths from the format specification, asserted below
/// against the field widths each `read`/`write` pair actually emits,
/// the same "the wire layout is load-bearing, check it at compile time"
/// habit the teacher applies to its own `SuperBlock`/MMIO register layouts.
const HEADER_LEN: usize = 8 + 8 + 1 + 16;
const TRIE_NODE_LEN: usize = 8 + 8 + 8 + 16;
const EVENT_POINTER_LEN: usize = 8 + 8 + 8 + 8 + 16;
const EVENT_DATA_FIXED_LEN: usize = 8 + 8 + 8 + 8 + 8;

static_assertions::const_assert_eq!(HEADER_LEN, 49);
static_assertions::const_assert_eq!(TRIE_NODE_LEN, 40);
static_assertions::const_assert_eq!(EVENT_POINTER_LEN, 48);
static_assertions::const_assert_eq!(EVENT_DATA_FIXED_LEN, 40);

fn pos<S: Seek>(s: &mut S) -> Result<u64> {
    Ok(s.stream_position()?)
}

fn read_u8<R: Read>(r: &mut R) -> Result<u8> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_be_bytes(buf))
}

fn read_i64<R: Read>(r: &mut R) -> Result<i64> {
    Ok(us64(read_u64(r)?))
}

fn write_u8<W: Write>(w: &mut W, v: u8) -> Result<()> {
    w.write_all(&[v])?;
    Ok(())
}

fn write_u64<W: Write>(w: &mut W, v: u64) -> Result<()> {
    w.write_all(&v.to_be_bytes())?;
    Ok(())
}

fn write_i64<W: Write>(w: &mut W, v: i64) -> Result<()> {
    write_u64(w, su64(v))
}

/// Patches a single 8-byte big-endian pointer field in place at `at`,
/// without disturbing the file's current position semantics beyond the
/// seek itself. Used for every in-place pointer repair in the index and
/// bucket-list maintenance.
pub(crate) fn patch_u64<S: Write + Seek>(s: &mut S, at: u64, value: u64) -> Result<()> {
    s.seek(SeekFrom::Start(at))?;
    write_u64(s, value)
}

/// The file header: magic, root pointer, key precision, reserved bytes.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Header {
    pub offset: u64,
    pub bit1: u64,
    pub bit1_pos: u64,
    pub bitn: u8,
}

impl Header {
    pub fn read<R: Read + Seek>(r: &mut R) -> Result<Header> {
        let offset = pos(r)?;
        let mut magic = [0u8; 8];
        r.read_exact(&mut magic)?;
        if &magic != MAGIC {
            return Err(Error::format("bad datefile magic"));
        }
        let bit1_pos = pos(r)?;
        let bit1 = read_u64(r)?;
        let bitn = read_u8(r)?;
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;
        Ok(Header { offset, bit1, bit1_pos, bitn })
    }

    pub fn write<W: Write + Seek>(w: &mut W, bit1: u64, bitn: u8) -> Result<Header> {
        let offset = pos(w)?;
        w.write_all(MAGIC)?;
        let bit1_pos = pos(w)?;
        write_u64(w, bit1)?;
        write_u8(w, bitn)?;
        w.write_all(&RESERVED_16)?;
        Ok(Header { offset, bit1, bit1_pos, bitn })
    }
}

/// One node of the binary trie.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TrieNode {
    pub offset: u64,
    pub child0: u64,
    pub child0_pos: u64,
    pub child1: u64,
    pub child1_pos: u64,
    pub event: u64,
    pub event_pos: u64,
}

impl TrieNode {
    pub fn read<R: Read + Seek>(r: &mut R) -> Result<TrieNode> {
        let offset = pos(r)?;
        let child0_pos = pos(r)?;
        let child0 = read_u64(r)?;
        let child1_pos = pos(r)?;
        let child1 = read_u64(r)?;
        let event_pos = pos(r)?;
        let event = read_u64(r)?;
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;
        Ok(TrieNode { offset, child0, child0_pos, child1, child1_pos, event, event_pos })
    }

    /// Reads the zero-initialized node at `at` by seeking there first.
    pub fn read_at<R: Read + Seek>(r: &mut R, at: u64) -> Result<TrieNode> {
        r.seek(SeekFrom::Start(at))?;
        Self::read(r)
    }

    /// Appends a fresh, all-zero trie node at the stream's current
    /// position (callers seek to EOF first).
    pub fn write_new<W: Write + Seek>(w: &mut W) -> Result<TrieNode> {
        let offset = pos(w)?;
        let child0_pos = pos(w)?;
        write_u64(w, 0)?;
        let child1_pos = pos(w)?;
        write_u64(w, 0)?;
        let event_pos = pos(w)?;
        write_u64(w, 0)?;
        w.write_all(&RESERVED_16)?;
        Ok(TrieNode { offset, child0: 0, child0_pos, child1: 0, child1_pos, event: 0, event_pos })
    }
}

/// One event-pointer: a bucket-list node at a trie node, and simultaneously
/// a same-event-chain node threading every pointer back to one event-data
/// record.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EventPointer {
    pub offset: u64,
    pub next: u64,
    pub next_pos: u64,
    pub prev: u64,
    pub prev_pos: u64,
    pub nextsm: u64,
    pub nextsm_pos: u64,
    pub ptr: u64,
    pub ptr_pos: u64,
}

impl EventPointer {
    pub fn read_at<R: Read + Seek>(r: &mut R, at: u64) -> Result<EventPointer> {
        r.seek(SeekFrom::Start(at))?;
        let offset = pos(r)?;
        let next_pos = pos(r)?;
        let next = read_u64(r)?;
        let prev_pos = pos(r)?;
        let prev = read_u64(r)?;
        let nextsm_pos = pos(r)?;
        let nextsm = read_u64(r)?;
        let ptr_pos = pos(r)?;
        let ptr = read_u64(r)?;
        let mut reserved = [0u8; 16];
        r.read_exact(&mut reserved)?;
        Ok(EventPointer {
            offset,
            next,
            next_pos,
            prev,
            prev_pos,
            nextsm,
            nextsm_pos,
            ptr,
            ptr_pos,
        })
    }

    /// Appends a new event-pointer at the stream's current position
    /// (callers seek to EOF first).
    pub fn write_new<W: Write + Seek>(
        w: &mut W,
        next: u64,
        prev: u64,
        nextsm: u64,
        ptr: u64,
    ) -> Result<EventPointer> {
        let offset = pos(w)?;
        let next_pos = pos(w)?;
        write_u64(w, next)?;
        let prev_pos = pos(w)?;
        write_u64(w, prev)?;
        let nextsm_pos = pos(w)?;
        write_u64(w, nextsm)?;
        let ptr_pos = pos(w)?;
        write_u64(w, ptr)?;
        w.write_all(&RESERVED_16)?;
        Ok(EventPointer {
            offset,
            next,
            next_pos,
            prev,
            prev_pos,
            nextsm,
            nextsm_pos,
            ptr,
            ptr_pos,
        })
    }
}

/// The canonical event-data record: one per event, referenced by every
/// event-pointer indexing it.
#[derive(Debug, Clone)]
pub(crate) struct EventData {
    pub offset: u64,
    pub firstev: u64,
    pub firstev_pos: u64,
    pub start: i64,
    pub end: i64,
    pub name: String,
}

impl EventData {
    pub fn read_at<R: Read + Seek>(r: &mut R, at: u64) -> Result<EventData> {
        r.seek(SeekFrom::Start(at))?;
        let offset = pos(r)?;
        let _functions_pos = pos(r)?;
        let functions = read_u64(r)?;
        if functions != 0 {
            return Err(Error::format("event-data `functions` field must be 0"));
        }
        let firstev_pos = pos(r)?;
        let firstev = read_u64(r)?;
        let _start_pos = pos(r)?;
        let start = read_i64(r)?;
        let _end_pos = pos(r)?;
        let end = read_i64(r)?;
        let _name_len_pos = pos(r)?;
        let name_len = read_u64(r)?;
        let mut name_bytes = vec![0u8; name_len as usize];
        r.read_exact(&mut name_bytes)?;
        let name = String::from_utf8(name_bytes)
            .map_err(|_| Error::format("event-data name is not valid UTF-8"))?;
        Ok(EventData { offset, firstev, firstev_pos, start, end, name })
    }

    /// Appends a new event-data record at the stream's current position
    /// (callers seek to EOF first). `firstev` starts at 0 and is patched in
    /// by the caller once the covering event-pointers have been written.
    pub fn write_new<W: Write + Seek>(w: &mut W, start: i64, end: i64, name: &str) -> Result<EventData> {
        let offset = pos(w)?;
        write_u64(w, 0)?; // functions, reserved, MUST be 0
        let firstev_pos = pos(w)?;
        write_u64(w, 0)?; // firstev, patched once the chain exists
        write_i64(w, start)?;
        write_i64(w, end)?;
        write_u64(w, name.len() as u64)?;
        w.write_all(name.as_bytes())?;
        Ok(EventData { offset, firstev: 0, firstev_pos, start, end, name: name.to_string() })
    }
}

pub(crate) fn seek_eof<S: Seek>(s: &mut S) -> Result<u64> {
    Ok(s.seek(SeekFrom::End(0))?)
}

pub(crate) fn seek_start<S: Seek>(s: &mut S, at: u64) -> io::Result<u64> {
    s.seek(SeekFrom::Start(at))
}
