//! Externalized global ordering: a median-split k-d tree over rank-space
//! points, whose left-to-right leaf order fixes π.
//!
//! Grounded on the explicit job-stack construction shape of
//! `a8f43142_EriKWDev-keyde__src-kdtree.rs.rs`: a `Vec`-backed stack of
//! pending `(start, end, depth)` slices stands in for recursion. Unlike that
//! reference, a node here never stores a single pivot point — only a leaf's
//! contiguous index range matters, since only the final leaf order (the
//! resulting permutation) is needed; nothing downstream walks the tree
//! itself (see `DESIGN.md`, "Range-interval lifting").

/// Points per leaf before a slice stops being split further.
const LEAF_SIZE: usize = 256;

struct Job {
    start: usize,
    end: usize,
    depth: usize,
}

/// Builds the permutation fixing π for the externalized ordering: points
/// ordered by recursively median-splitting the slice on a round-robin axis.
///
/// `ranks[d][i]` is point `i`'s rank in dimension `d`; all columns must have
/// length `n`.
pub fn build_permutation(ranks: &[Vec<u64>], n: usize) -> Vec<usize> {
    let k = ranks.len();
    let mut perm: Vec<usize> = (0..n).collect();
    let mut jobs = vec![Job { start: 0, end: n, depth: 0 }];

    while let Some(Job { start, end, depth }) = jobs.pop() {
        let len = end - start;
        if len <= LEAF_SIZE {
            continue;
        }

        let slice = &perm[start..end];
        let axis = (0..k)
            .map(|offset| (depth + offset) % k)
            .find(|&candidate| {
                let first = ranks[candidate][slice[0]];
                slice.iter().any(|&i| ranks[candidate][i] != first)
            });
        let axis = match axis {
            Some(a) => a,
            None => continue, // every dimension indivisible: this slice is a leaf
        };

        let mid = len / 2;
        perm[start..end].select_nth_unstable_by_key(mid, |&i| ranks[axis][i]);
        let median = ranks[axis][perm[start + mid]];

        let (lesser, equal) = partition_3way(&mut perm[start..end], ranks, axis, median);
        let successor = len - lesser - equal;

        // Median assigned to the right child by default; if that leaves the
        // left child empty, or smaller than the right, push the run of
        // median-valued points into the left child instead to rebalance.
        let split = if lesser == 0 || lesser < successor { equal + lesser } else { lesser };

        let new_depth = depth + 1;
        if split > 0 {
            jobs.push(Job { start, end: start + split, depth: new_depth });
        }
        if split < len {
            jobs.push(Job { start: start + split, end, depth: new_depth });
        }
    }

    perm
}

/// Dutch-flag 3-way partition of `slice` around `pivot` on `ranks[axis]`.
/// Rearranges `slice` in place into `[< pivot][== pivot][> pivot]` and
/// returns `(count_less, count_equal)`.
fn partition_3way(slice: &mut [usize], ranks: &[Vec<u64>], axis: usize, pivot: u64) -> (usize, usize) {
    let mut lt = 0;
    let mut i = 0;
    let mut gt = slice.len();
    while i < gt {
        let v = ranks[axis][slice[i]];
        if v < pivot {
            slice.swap(lt, i);
            lt += 1;
            i += 1;
        } else if v > pivot {
            gt -= 1;
            slice.swap(i, gt);
        } else {
            i += 1;
        }
    }
    (lt, gt - lt)
}
