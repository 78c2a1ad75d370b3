// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Signed-instant to unsigned-key remapping.
//!
//! The trie orders events by an unsigned 64-bit `Key`, so that lexicographic
//! order on keys equals the natural order on signed 64-bit instants. The
//! remap is a single flipped sign bit.

const SIGN_BIT: u64 = 1 << 63;

/// Converts a signed instant to its unsigned trie key.
///
/// `su64(x) = x XOR (1<<63)`, treating `x` as two's-complement bits.
pub const fn su64(instant: i64) -> u64 {
    (instant as u64) ^ SIGN_BIT
}

/// Converts an unsigned trie key back to a signed instant.
///
/// `us64 ∘ su64 = id` for all signed 64-bit values. The one edge case where
/// the most-negative value cannot be produced from ordinary unsigned
/// arithmetic (`key == 0`) is special-cased to yield `i64::MIN`, per the
/// documented resolution of the "`us64(0)`" open question: monotonicity
/// requires `su64(i64::MIN) == 0`, which forces `us64(0) == i64::MIN`.
pub const fn us64(key: u64) -> i64 {
    (key ^ SIGN_BIT) as i64
}
