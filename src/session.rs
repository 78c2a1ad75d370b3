// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The datefile session: opens or creates the backing file and dispatches
//! to the engine's components.

use std::fs::{File, OpenOptions as FsOpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::codec::{self, Header, TrieNode};
use crate::defrag::{self, DefragReport};
use crate::error::{Error, Result};
use crate::event::{self, Event};
use crate::search;

/// The only key precision the engine's trie and prefix enumerator
/// support; `bitn` MUST be 64 in any file this session can open.
const SUPPORTED_BITN: u8 = 64;

/// Installation-specific knobs that never change an on-disk byte.
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Reject a header whose `bitn` field is anything but 64. Set to
    /// `false` only to inspect a foreign/legacy file's header without
    /// performing any operation that depends on key width.
    pub strict_bitn: bool,
}

impl Default for OpenOptions {
    fn default() -> Self {
        OpenOptions { strict_bitn: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Open,
    Closed,
}

/// A session over one datefile. Not `Sync`: it wraps a single `File`
/// with no internal synchronization, and every operation mutates the
/// file's cursor, so operations on one session MUST NOT be interleaved
/// across threads.
pub struct Datefile {
    file: File,
    path: PathBuf,
    root: u64,
    bitn: u8,
    state: State,
}

impl Datefile {
    /// Opens `path`, creating and initializing it if absent.
    pub fn open<P: AsRef<Path>>(path: P, options: OpenOptions) -> Result<Datefile> {
        let path = path.as_ref().to_path_buf();
        log::debug!("opening datefile at {}", path.display());

        let is_new = !path.exists();
        let mut file = FsOpenOptions::new().read(true).write(true).create(true).open(&path)?;

        let (root, bitn) = if is_new || file.metadata()?.len() == 0 {
            log::info!("initializing new datefile at {}", path.display());
            let header = Header::write(&mut file, 0, SUPPORTED_BITN)?;
            codec::seek_eof(&mut file)?;
            let root_node = TrieNode::write_new(&mut file)?;
            codec::patch_u64(&mut file, header.bit1_pos, root_node.offset)?;
            file.flush()?;
            (root_node.offset, SUPPORTED_BITN)
        } else {
            file.seek(SeekFrom::Start(0))?;
            let header = Header::read(&mut file)?;
            if header.bitn > 64 {
                return Err(Error::format("bitn exceeds 64"));
            }
            if options.strict_bitn && header.bitn != SUPPORTED_BITN {
                return Err(Error::format("only 64-bit key precision is supported"));
            }
            if header.bit1 == 0 {
                return Err(Error::format("root trie node missing"));
            }
            (header.bit1, header.bitn)
        };

        log::debug!("datefile ready: root={root} bitn={bitn}");
        Ok(Datefile { file, path, root, bitn, state: State::Open })
    }

    fn ensure_open(&self) -> Result<()> {
        if self.state != State::Open {
            return Err(Error::format("datefile session is closed"));
        }
        Ok(())
    }

    /// Appends an event and links it into the trie. Returns its stable id.
    pub fn add(&mut self, start: i64, end: i64, name: &str) -> Result<u64> {
        self.ensure_open()?;
        log::trace!("add start={start} end={end} name={name:?}");
        let id = event::add(&mut self.file, self.root, start, end, name)?;
        self.file.flush()?;
        Ok(id)
    }

    /// Returns every event intersecting `[qlo, qhi]`. Order is
    /// unspecified.
    pub fn search(&mut self, qlo: i64, qhi: i64) -> Result<Vec<Event>> {
        self.ensure_open()?;
        log::trace!("search qlo={qlo} qhi={qhi}");
        search::search(&mut self.file, self.root, qlo, qhi)
    }

    /// Like [`Self::search`] but counts distinct events without
    /// materializing their names.
    pub fn search_count(&mut self, qlo: i64, qhi: i64) -> Result<usize> {
        self.ensure_open()?;
        log::trace!("search_count qlo={qlo} qhi={qhi}");
        search::search_count(&mut self.file, self.root, qlo, qhi)
    }

    /// Unlinks every reference to the event at `id`. A no-op if it is
    /// already unlinked.
    pub fn remove(&mut self, id: u64) -> Result<()> {
        self.ensure_open()?;
        log::trace!("remove id={id}");
        event::remove(&mut self.file, id)?;
        self.file.flush()?;
        Ok(())
    }

    /// Rebuilds the file into a compacted sibling and atomically replaces
    /// the original. Returns the old-id-to-new-id remap and size telemetry.
    pub fn defrag(&mut self) -> Result<DefragReport> {
        self.ensure_open()?;
        log::debug!("defrag starting for {}", self.path.display());

        let tmp_path = self.path.with_extension("defrag-tmp");
        let mut out =
            FsOpenOptions::new().read(true).write(true).create(true).truncate(true).open(&tmp_path)?;

        self.file.seek(SeekFrom::Start(0))?;
        let report = defrag::defrag(&mut self.file, &mut out, self.root, self.bitn)?;
        out.flush()?;
        drop(out);

        std::fs::rename(&tmp_path, &self.path)?;

        let mut reopened = FsOpenOptions::new().read(true).write(true).open(&self.path)?;
        reopened.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut reopened)?;
        self.file = reopened;
        self.root = header.bit1;

        log::info!(
            "defrag complete for {}: {} -> {} bytes",
            self.path.display(),
            report.bytes_before,
            report.bytes_after
        );
        Ok(report)
    }

    /// Flushes and releases the file handle. Further operations on this
    /// session return `Error::Format`.
    pub fn close(mut self) -> Result<()> {
        self.ensure_open()?;
        self.file.flush()?;
        self.state = State::Closed;
        Ok(())
    }
}
