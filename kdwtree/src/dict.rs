//! Per-dimension rank-space dictionary.
//!
//! Each dimension of a [`crate::KdwTree`] is stored internally as a sequence
//! of small integer ranks, not raw coordinates: every wavelet matrix operates
//! over `{0, ..., distinct_values-1}`. A [`RankSpaceDict`] is the bijection
//! (for values that occur) between an encoded coordinate and its rank, plus
//! the insertion-point rank (the rank the value *would* have if inserted)
//! for values that don't occur, which query rectangles need at their
//! boundaries.
//!
//! The sorted distinct values are kept either as a plain sorted array or as
//! an Elias-Fano [`MonotoneSequence`], whichever is smaller; see
//! [`RankSpaceDict::build`].

use cseq::MonotoneSequence;
use dyn_size_of::GetSize;

enum Encoding {
    Plain(Box<[u64]>),
    Compressed(MonotoneSequence),
}

/// Bijective rank-space dictionary over a sorted set of distinct `u64`
/// coordinate codes.
pub struct RankSpaceDict {
    encoding: Encoding,
}

impl RankSpaceDict {
    /// Builds a dictionary over `sorted_distinct`, which must be sorted in
    /// strictly increasing order. Picks whichever of the plain or
    /// Elias-Fano encoding has the smaller memory footprint.
    pub fn build(sorted_distinct: &[u64]) -> Self {
        debug_assert!(sorted_distinct.windows(2).all(|w| w[0] < w[1]));
        let plain: Box<[u64]> = sorted_distinct.into();
        let plain_size = plain.size_bytes();
        let compressed = MonotoneSequence::with_items_from_slice(sorted_distinct);
        let compressed_size = compressed.size_bytes();
        let encoding = if compressed_size < plain_size {
            Encoding::Compressed(compressed)
        } else {
            Encoding::Plain(plain)
        };
        Self { encoding }
    }

    /// Number of distinct values held by this dictionary.
    pub fn cardinality(&self) -> usize {
        match &self.encoding {
            Encoding::Plain(a) => a.len(),
            Encoding::Compressed(s) => s.len(),
        }
    }

    /// Rank of the first stored value that is `>= code` (in `0..=cardinality()`,
    /// `cardinality()` meaning `code` is above every stored value). This is
    /// the insertion-point rank: if `code` is present, `value_at(rank_of(code))
    /// == code`; if absent, `rank_of(code)` is where it would be inserted to
    /// keep the set sorted.
    pub fn rank_of(&self, code: u64) -> usize {
        match &self.encoding {
            Encoding::Plain(a) => a.partition_point(|&v| v < code),
            Encoding::Compressed(s) => s.geq_index(code),
        }
    }

    /// The value stored at `rank`. Panics if `rank >= cardinality()`.
    pub fn value_at(&self, rank: usize) -> u64 {
        match &self.encoding {
            Encoding::Plain(a) => a[rank],
            Encoding::Compressed(s) => s.get_or_panic(rank),
        }
    }

    /// Whether `code` is one of the stored distinct values.
    pub fn contains(&self, code: u64) -> bool {
        let r = self.rank_of(code);
        r < self.cardinality() && self.value_at(r) == code
    }
}

impl GetSize for RankSpaceDict {
    fn size_bytes_dyn(&self) -> usize {
        match &self.encoding {
            Encoding::Plain(a) => a.size_bytes_dyn(),
            Encoding::Compressed(s) => s.size_bytes_dyn(),
        }
    }
    const USES_DYN_MEM: bool = true;
}
