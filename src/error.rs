// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types returned by every datefile operation.

use std::io;

/// The three error kinds a datefile operation can fail with.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// A short read, short write, seek failure, open failure, or flush
    /// failure. Returned from every operation that touches the file.
    #[error("datefile I/O error: {0}")]
    Io(#[from] io::Error),

    /// Magic mismatch, `bitn > 64`, or a truncated/corrupt record.
    /// Returned only from `open` and from operations that dereference a
    /// corrupt pointer.
    #[error("datefile format error: {0}")]
    Format(&'static str),

    /// Allocation failure while growing an event name or an event list.
    /// Returned only from `search`.
    #[error("datefile out of memory")]
    OutOfMemory,
}

/// The result type returned by every datefile operation.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a malformed on-disk structure.
    pub(crate) fn format(reason: &'static str) -> Error {
        Error::Format(reason)
    }
}
