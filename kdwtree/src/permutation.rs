//! Uniform random partial permutation, used by sampling to pick which
//! matching positions to return.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

/// Threshold below which a partial Fisher-Yates shuffle of the whole
/// `0..n` domain is cheaper than reject-sampling into a hash set.
const SHUFFLE_DOMAIN_LIMIT: usize = 100_000;

/// Draws `k` distinct integers from `0..n`, uniformly at random and without
/// replacement. `k` must be `<= n`.
///
/// Not load-bearing for correctness: any uniform partial-permutation
/// algorithm would do. Below the size threshold (or when `k` is a sizeable
/// fraction of `n`) this shuffles the last `k` slots of `0..n` directly;
/// above it, when `k` is comparatively small, it reject-samples into a hash
/// set instead of materialising the whole domain.
pub fn sample_distinct<R: Rng + ?Sized>(n: usize, k: usize, rng: &mut R) -> Vec<usize> {
    assert!(k <= n, "sample_distinct: k must not exceed n");
    if k == 0 {
        return Vec::new();
    }
    if n <= SHUFFLE_DOMAIN_LIMIT || k > n / 16 {
        let mut domain: Vec<usize> = (0..n).collect();
        let (chosen, _rest) = domain.partial_shuffle(rng, k);
        chosen.to_vec()
    } else {
        let mut seen = HashSet::with_capacity(k);
        while seen.len() < k {
            seen.insert(rng.gen_range(0..n));
        }
        seen.into_iter().collect()
    }
}
