// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal prefix-cover enumeration over a closed `u64` key range.
//!
//! Given `[lo, hi]`, produces the smallest sequence of `(prefix, precision)`
//! pairs whose covers are pairwise disjoint and whose union is exactly
//! `[lo, hi]`. `precision` counts the number of fixed high bits; the low
//! `64 - precision` bits of `prefix` are always zero.

/// Returns `u64::MAX` with its low `n` bits set, treating `n >= 64` as all
/// bits set (the naive `(1 << n) - 1` is undefined behavior at `n == 64`).
pub(crate) const fn fill1(n: u32) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

/// Enumerates the minimal prefix cover of `[lo, hi]`.
///
/// Runs in O(b²) time in the key width, per the algorithm in the format
/// specification: repeatedly grow the current prefix downward by flipping
/// its lowest zero bit to one while the result stays within `hi`, emit the
/// resulting `(prefix, precision)`, then advance past it.
pub(crate) fn cover(lo: u64, hi: u64) -> Vec<(u64, u8)> {
    let mut covers = Vec::new();
    if lo > hi {
        return covers;
    }

    let mut cur = lo;
    loop {
        let mut precision: u32 = 0;
        while precision < 64 {
            let bit = 1u64 << precision;
            let flipped = cur ^ bit;
            if flipped <= cur || flipped > hi {
                break;
            }
            cur = flipped;
            precision += 1;
        }
        // `cur` has had its uncaptured low bits filled with ones along the
        // way; mask them back to zero so the emitted prefix matches its
        // documented contract (only the top `precision` bits are significant
        // and the rest read as zero), without disturbing `cur` itself, which
        // must keep its filled-in form to correctly seed the next cover.
        let canonical = cur & !fill1(precision);
        covers.push((canonical, (64 - precision) as u8));
        if cur == hi {
            break;
        }
        cur += 1;
    }
    covers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cover_range(prefix: u64, precision: u8) -> (u64, u64) {
        let lo = prefix;
        let hi = prefix | fill1(64 - precision as u32);
        (lo, hi)
    }

    fn assert_exact_disjoint_cover(lo: u64, hi: u64, covers: &[(u64, u8)]) {
        assert!(!covers.is_empty());
        let mut ranges: Vec<(u64, u64)> = covers
            .iter()
            .map(|&(p, prec)| cover_range(p, prec))
            .collect();
        ranges.sort();
        assert_eq!(ranges[0].0, lo, "cover must start at lo");
        assert_eq!(ranges.last().unwrap().1, hi, "cover must end at hi");
        for pair in ranges.windows(2) {
            let (prev_end, next_start) = (pair[0].1, pair[1].0);
            assert_eq!(
                next_start,
                prev_end + 1,
                "covers must be contiguous and disjoint"
            );
        }
    }

    #[test]
    fn fill1_handles_all_widths() {
        assert_eq!(fill1(0), 0);
        assert_eq!(fill1(1), 1);
        assert_eq!(fill1(63), (1u64 << 63) - 1);
        assert_eq!(fill1(64), u64::MAX);
        assert_eq!(fill1(100), u64::MAX);
    }

    #[test]
    fn single_point_cover() {
        let covers = cover(75, 75);
        assert_eq!(covers, vec![(75, 64)]);
    }

    #[test]
    fn full_range_cover() {
        let covers = cover(0, u64::MAX);
        assert_eq!(covers, vec![(0, 0)]);
    }

    #[test]
    fn example_from_format_spec() {
        // 32-95 (0b00100000-0b01011111 in the format documentation's
        // worked example) covers exactly as prefix 32 and prefix 64, each
        // with precision 59: the top 59 bits are fixed (56 bits that are
        // always zero for values this small, plus 3 bits distinguishing
        // `001` from `010`), leaving a 5-bit, 32-wide cover per prefix.
        let covers = cover(32, 95);
        assert_eq!(covers, vec![(32, 59), (64, 59)]);
        assert_exact_disjoint_cover(32, 95, &covers);
    }

    #[test]
    fn exactness_and_disjointness_on_samples() {
        let samples: &[(u64, u64)] = &[
            (0, 0),
            (0, u64::MAX),
            (1, 1),
            (10, 25),
            (1 << 63, (1 << 63) + 1000),
            (0, 1 << 20),
            (u64::MAX - 5, u64::MAX),
        ];
        for &(lo, hi) in samples {
            let covers = cover(lo, hi);
            assert_exact_disjoint_cover(lo, hi, &covers);
        }
    }

    #[test]
    fn ascending_cur_order() {
        let covers = cover(10, 200);
        for pair in covers.windows(2) {
            assert!(pair[0].0 < pair[1].0);
        }
    }
}
