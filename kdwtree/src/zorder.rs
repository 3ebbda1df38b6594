//! Z-order (Morton order) comparator and an indirect sort by it.
//!
//! Points are compared dimension-by-dimension, but not simply by the first
//! differing dimension: Z-order interleaves the *bits* of every dimension's
//! rank, so the relevant comparison is "which dimension holds the most
//! significant differing bit of the interleaved key". Materializing the
//! interleaved key directly would overflow `u64` once `dimensions * bits per
//! dimension` exceeds 64, so instead we use Chan's trick (described in
//! Connor & Kumar, "Fast Construction of k-Nearest Neighbor Graphs Using
//! Z-Order Curves", 2010): the dimension holding the most significant
//! differing bit of the whole key is found by comparing, pairwise, the XOR of
//! each dimension's own rank pair, never constructing the interleaved key at
//! all.

use std::cmp::Ordering;

/// Whether the most significant set bit of `x` is lower than that of `y`,
/// i.e. whether `x`'s highest bit is a strict prefix of `y`'s. Used to find
/// which of two dimensions holds the more significant differing bit without
/// computing `ilog2`.
#[inline]
fn less_msb(x: u64, y: u64) -> bool {
    x < y && x < (x ^ y)
}

/// Z-order comparison of two points, given as per-dimension rank columns
/// (`ranks[dim][point]`) and the two point indices to compare.
///
/// `ranks` must have at least one dimension; behaviour with zero dimensions
/// is unspecified (there is nothing to compare).
pub fn cmp(ranks: &[Vec<u64>], i: usize, j: usize) -> Ordering {
    let mut msd = 0usize;
    let mut msd_xor = ranks[0][i] ^ ranks[0][j];
    for dim in 1..ranks.len() {
        let dim_xor = ranks[dim][i] ^ ranks[dim][j];
        if less_msb(msd_xor, dim_xor) {
            msd = dim;
            msd_xor = dim_xor;
        }
    }
    ranks[msd][i].cmp(&ranks[msd][j])
}

/// Returns a permutation of `0..n` that lists the points in Z-order.
/// `ranks[dim]` must have length `n` for every `dim`.
pub fn sort_permutation(ranks: &[Vec<u64>], n: usize) -> Vec<usize> {
    let mut perm: Vec<usize> = (0..n).collect();
    quicksort(&mut perm, ranks);
    perm
}

/// In-place indirect Hoare-partition quicksort of `perm` by [`cmp`].
/// Always recurses into the smaller side and loops on the larger one, so
/// worst-case stack depth is `O(log n)` regardless of input order.
fn quicksort(perm: &mut [usize], ranks: &[Vec<u64>]) {
    let mut slice = perm;
    loop {
        if slice.len() <= 16 {
            insertion_sort(slice, ranks);
            return;
        }
        let split = partition(slice, ranks);
        let (left, right) = slice.split_at_mut(split);
        if left.len() < right.len() {
            quicksort(left, ranks);
            slice = right;
        } else {
            quicksort(right, ranks);
            slice = left;
        }
    }
}

fn insertion_sort(perm: &mut [usize], ranks: &[Vec<u64>]) {
    for i in 1..perm.len() {
        let mut j = i;
        while j > 0 && cmp(ranks, perm[j - 1], perm[j]) == Ordering::Greater {
            perm.swap(j - 1, j);
            j -= 1;
        }
    }
}

/// Hoare partition scheme with a median-of-three pivot. Returns the split
/// point `p` such that `slice[..p]` holds elements `<=` the pivot's final
/// resting value and `slice[p..]` holds elements `>=` it.
fn partition(perm: &mut [usize], ranks: &[Vec<u64>]) -> usize {
    let len = perm.len();
    let mid = len / 2;
    if cmp(ranks, perm[0], perm[mid]) == Ordering::Greater { perm.swap(0, mid); }
    if cmp(ranks, perm[0], perm[len - 1]) == Ordering::Greater { perm.swap(0, len - 1); }
    if cmp(ranks, perm[mid], perm[len - 1]) == Ordering::Greater { perm.swap(mid, len - 1); }
    let pivot = perm[mid];

    let mut i = -1isize;
    let mut j = len as isize;
    loop {
        loop {
            i += 1;
            if cmp(ranks, perm[i as usize], pivot) != Ordering::Less { break; }
        }
        loop {
            j -= 1;
            if cmp(ranks, perm[j as usize], pivot) != Ordering::Greater { break; }
        }
        if i >= j {
            return (j + 1) as usize;
        }
        perm.swap(i as usize, j as usize);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn less_msb_basic() {
        assert!(less_msb(0b0010, 0b0100));
        assert!(!less_msb(0b0100, 0b0010));
        assert!(!less_msb(0b0101, 0b0011));
    }

    #[test]
    fn z_order_matches_known_2d_sequence() {
        // classic 2-bit Morton order for (x, y): the interleave order is
        // (0,0) (1,0) (0,1) (1,1) (2,0) (3,0) (2,1) (3,1) ...
        let xs = vec![0u64, 1, 0, 1, 2, 3, 2, 3];
        let ys = vec![0u64, 0, 1, 1, 0, 0, 1, 1];
        let ranks = vec![xs, ys];
        let perm = sort_permutation(&ranks, 8);
        assert_eq!(perm, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn sorts_are_consistent_with_cmp() {
        let n = 200;
        let xs: Vec<u64> = (0..n).map(|i| (i * 37 % 101) as u64).collect();
        let ys: Vec<u64> = (0..n).map(|i| (i * 53 % 97) as u64).collect();
        let zs: Vec<u64> = (0..n).map(|i| (i * 13 % 89) as u64).collect();
        let ranks = vec![xs, ys, zs];
        let perm = sort_permutation(&ranks, n as usize);
        for w in perm.windows(2) {
            assert_ne!(cmp(&ranks, w[0], w[1]), Ordering::Greater);
        }
    }
}
