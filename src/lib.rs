// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `datefile`: a single-file, self-contained persistent index mapping
//! intervals on the integer timeline to named events.
//!
//! The engine stores each event once, as an event-data record, and indexes
//! it under the minimal set of bit-prefix keys that exactly cover its
//! `[start, end]` range in a binary trie. Lookups are range queries over
//! that trie; deletion unlinks an event's bucket entries without moving
//! any other record; compaction (`defrag`) rebuilds the file from its
//! root, visiting every reachable record exactly once.
//!
//! This crate is the storage engine only. A textual date parser, a clock,
//! and an interactive command driver are external collaborators: this
//! crate consumes `i64` instants and `&str` names and returns `Event`
//! values, and never itself parses a date string or prints anything.
//!
//! ```
//! use datefile::{Datefile, OpenOptions};
//!
//! # fn main() -> datefile::Result<()> {
//! let dir = tempfile::tempdir().unwrap();
//! let mut df = Datefile::open(dir.path().join("events.df"), OpenOptions::default())?;
//! let id = df.add(1000, 1000, "launch")?;
//! assert_eq!(df.search(999, 1001)?.len(), 1);
//! df.remove(id)?;
//! assert!(df.search(999, 1001)?.is_empty());
//! # Ok(())
//! # }
//! ```

mod codec;
mod defrag;
mod error;
mod event;
mod instant;
mod prefix;
mod search;
mod session;
mod trie;

pub use defrag::DefragReport;
pub use error::{Error, Result};
pub use event::Event;
pub use session::{Datefile, OpenOptions};
