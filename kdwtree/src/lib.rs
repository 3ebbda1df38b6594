//! A static, in-memory index over k-dimensional real-valued points answering
//! orthogonal range queries: count, report, and uniform sample.
//!
//! Built from k per-dimension rank-space dictionaries, a shared global point
//! ordering π (either Z-order or an externalized median-split k-d tree), and
//! k wavelet matrices storing each dimension's ranks in π order. See
//! `engine` for the query descent and `DESIGN.md` for how this workspace's
//! module boundaries map onto that shape.

mod dict;
mod encoding;
mod engine;
mod error;
mod interval;
mod kdtree;
mod permutation;
mod zorder;

pub use engine::Engine;
pub use error::{KdwError, Result};

use bitm::bits_to_store;
use dict::RankSpaceDict;
use dyn_size_of::GetSize;

/// Switches between the two equally-supported ways of fixing the global
/// point ordering π. Both produce the same downstream artifact (a
/// permutation plus k wavelet matrices); they differ only in how π is
/// derived and, consequently, in their construction cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalOrder {
    /// Sort by interleaved-bit (Morton) order. Cheap, comparison-based.
    ZOrder,
    /// Build an explicit median-split k-d tree and take its leaf order.
    /// More construction work, but yields a more balanced tree for
    /// adversarial point distributions.
    Externalized,
}

impl Default for GlobalOrder {
    fn default() -> Self {
        GlobalOrder::ZOrder
    }
}

/// A static k-dimensional orthogonal range index.
pub struct KdwTree {
    engine: Engine,
    bounding_box: Vec<(f64, f64)>,
}

fn validate_points(points: &[Vec<f64>]) -> Result<usize> {
    if points.is_empty() {
        return Err(KdwError::InvalidInput("point set must not be empty"));
    }
    let k = points[0].len();
    if !(2..=31).contains(&k) {
        return Err(KdwError::InvalidInput("dimensionality must be in [2, 31]"));
    }
    for row in points {
        if row.len() != k {
            return Err(KdwError::InvalidInput("all points must have the same dimensionality"));
        }
        for &v in row {
            if !v.is_finite() {
                return Err(KdwError::InvalidInput("coordinates must be finite"));
            }
        }
    }
    Ok(k)
}

fn validate_rectangle(min: &[f64], max: &[f64], k: usize) -> Result<()> {
    if min.len() != k || max.len() != k {
        return Err(KdwError::InvalidInput("query rectangle dimensionality must match the index"));
    }
    for (&lo, &hi) in min.iter().zip(max) {
        if !lo.is_finite() || !hi.is_finite() {
            return Err(KdwError::InvalidInput("query bounds must be finite"));
        }
    }
    Ok(())
}

impl KdwTree {
    /// Builds an index over `points` using the default global ordering
    /// (Z-order). `points` must be non-empty, every row the same length
    /// `k` with `2 <= k <= 31`, and every coordinate finite.
    pub fn new(points: &[Vec<f64>]) -> Result<Self> {
        Self::with_ordering(points, GlobalOrder::default())
    }

    /// Builds an index over `points`, explicitly choosing the global
    /// ordering strategy. See [`GlobalOrder`].
    pub fn with_ordering(points: &[Vec<f64>], ordering: GlobalOrder) -> Result<Self> {
        let k = validate_points(points)?;
        let n = points.len();

        let bounding_box: Vec<(f64, f64)> = (0..k)
            .map(|d| {
                let mut lo = points[0][d];
                let mut hi = points[0][d];
                for row in points {
                    lo = lo.min(row[d]);
                    hi = hi.max(row[d]);
                }
                (lo, hi)
            })
            .collect();

        let codes: Vec<Vec<u64>> = points
            .iter()
            .map(|row| row.iter().map(|&v| encoding::encode(v)).collect())
            .collect();

        let perm = match ordering {
            GlobalOrder::ZOrder => {
                let aligned = rank_aligned_columns(&codes, n, k);
                zorder::sort_permutation(&aligned, n)
            }
            GlobalOrder::Externalized => {
                let dicts = build_dicts(&codes, k);
                let ranks = rank_columns(&dicts, &codes, n, k);
                kdtree::build_permutation(&ranks, n)
            }
        };

        let engine = Engine::build(&codes, perm);
        Ok(Self { engine, bounding_box })
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.engine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of dimensions.
    pub fn dimensions(&self) -> usize {
        self.engine.dimensions()
    }

    /// Per-dimension `(min, max)` envelope of the indexed points.
    pub fn bounding_box(&self) -> &[(f64, f64)] {
        &self.bounding_box
    }

    /// Number of indexed points whose coordinates fall within the closed
    /// rectangle `[min[d], max[d]]` in every dimension `d`. Returns 0 (not
    /// an error) if any `min[d] > max[d]`.
    pub fn count(&self, min: &[f64], max: &[f64]) -> Result<usize> {
        validate_rectangle(min, max, self.dimensions())?;
        match self.query_bounds(min, max) {
            None => Ok(0),
            Some((lo, hi)) => Ok(self.engine.count(&lo, &hi)),
        }
    }

    /// Original indices of every point inside the rectangle, in unspecified
    /// order. Empty if no point matches.
    pub fn report(&self, min: &[f64], max: &[f64]) -> Result<Vec<usize>> {
        validate_rectangle(min, max, self.dimensions())?;
        match self.query_bounds(min, max) {
            None => Ok(Vec::new()),
            Some((lo, hi)) => Ok(self.engine.report(&lo, &hi)),
        }
    }

    /// Original indices of an `s`-subset of matching points, drawn
    /// uniformly without replacement. Returns all matches when there are at
    /// most `s` of them.
    pub fn sample<R: rand::Rng + ?Sized>(&self, min: &[f64], max: &[f64], s: usize, rng: &mut R) -> Result<Vec<usize>> {
        validate_rectangle(min, max, self.dimensions())?;
        match self.query_bounds(min, max) {
            None => Ok(Vec::new()),
            Some((lo, hi)) => Ok(self.engine.sample(&lo, &hi, s, rng)),
        }
    }

    /// Translates a real-valued rectangle into rank-space bounds, or `None`
    /// if the rectangle is empty (`min[d] > max[d]` for some `d`).
    fn query_bounds(&self, min: &[f64], max: &[f64]) -> Option<(Vec<u64>, Vec<u64>)> {
        for (&lo, &hi) in min.iter().zip(max) {
            if lo > hi {
                return None;
            }
        }
        let lo: Vec<u64> = min.iter().map(|&v| encoding::encode(v)).collect();
        let hi: Vec<u64> = max.iter().map(|&v| encoding::encode(v)).collect();
        Some((lo, hi))
    }
}

impl GetSize for KdwTree {
    fn size_bytes_dyn(&self) -> usize {
        self.engine.size_bytes_dyn() + self.bounding_box.size_bytes_dyn()
    }
    const USES_DYN_MEM: bool = true;
}

fn build_dicts(codes: &[Vec<u64>], k: usize) -> Vec<RankSpaceDict> {
    (0..k)
        .map(|d| {
            let mut column: Vec<u64> = codes.iter().map(|row| row[d]).collect();
            column.sort_unstable();
            column.dedup();
            RankSpaceDict::build(&column)
        })
        .collect()
}

fn rank_columns(dicts: &[RankSpaceDict], codes: &[Vec<u64>], n: usize, k: usize) -> Vec<Vec<u64>> {
    (0..k)
        .map(|d| {
            let mut col = Vec::with_capacity(n);
            for row in codes {
                col.push(dicts[d].rank_of(row[d]) as u64);
            }
            col
        })
        .collect()
}

/// Per-dimension ranks, left-shifted so every dimension shares the same
/// bit-width `B = max_d bits(c_d - 1)`. Only the Z-order comparator needs
/// this: a most-significant-differing-bit comparison across dimensions of
/// different cardinality is only meaningful once they're aligned to a
/// common width. The wavelet matrices built afterward (`Engine::build`) use
/// each dimension's own, unaligned ranks and don't need this.
fn rank_aligned_columns(codes: &[Vec<u64>], n: usize, k: usize) -> Vec<Vec<u64>> {
    let dicts = build_dicts(codes, k);
    let ranks = rank_columns(&dicts, codes, n, k);
    let bits: Vec<u8> = dicts
        .iter()
        .map(|d| bits_to_store(d.cardinality().saturating_sub(1) as u64).max(1))
        .collect();
    let b = *bits.iter().max().unwrap();
    ranks
        .into_iter()
        .zip(bits)
        .map(|(col, bits_d)| {
            let shift = b - bits_d;
            col.into_iter().map(|r| r << shift).collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid_points() -> Vec<Vec<f64>> {
        (0..4).flat_map(|x| (0..5).map(move |y| vec![x as f64, y as f64]))
            .collect()
    }

    #[test]
    fn rejects_empty_point_set() {
        assert!(matches!(KdwTree::new(&[]), Err(KdwError::InvalidInput(_))));
    }

    #[test]
    fn rejects_ragged_dimensionality() {
        let points = vec![vec![0.0, 0.0], vec![1.0, 1.0, 1.0]];
        assert!(matches!(KdwTree::new(&points), Err(KdwError::InvalidInput(_))));
    }

    #[test]
    fn rejects_non_finite_coordinates() {
        let points = vec![vec![0.0, f64::NAN]];
        assert!(matches!(KdwTree::new(&points), Err(KdwError::InvalidInput(_))));
    }

    #[test]
    fn s1_grid_range_query() {
        let points = grid_points();
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.count(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), 4);
        let mut report = tree.report(&[1.0, 1.0], &[2.0, 2.0]).unwrap();
        report.sort_unstable();
        assert_eq!(report, vec![6, 7, 11, 12]);
    }

    #[test]
    fn s2_bounding_box_and_beyond() {
        let points = grid_points();
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.count(&[0.0, 0.0], &[4.0, 4.0]).unwrap(), 20);
        assert_eq!(tree.count(&[-1.0, -1.0], &[5.0, 5.0]).unwrap(), 20);
    }

    #[test]
    fn s3_disjoint_rectangle() {
        let points = grid_points();
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.count(&[5.0, 0.0], &[6.0, 4.0]).unwrap(), 0);
        assert!(tree.report(&[5.0, 0.0], &[6.0, 4.0]).unwrap().is_empty());
    }

    #[test]
    fn s4_single_point_three_dims() {
        let points = vec![vec![1.5, -2.25, 1e308]];
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.count(&[1.0, -3.0, 0.0], &[2.0, 0.0, 2e308]).unwrap(), 1);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(tree.sample(&[1.0, -3.0, 0.0], &[2.0, 0.0, 2e308], 10, &mut rng).unwrap(), vec![0]);
    }

    #[test]
    fn empty_rectangle_short_circuits() {
        let points = grid_points();
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.count(&[2.0, 2.0], &[1.0, 1.0]).unwrap(), 0);
        assert!(tree.report(&[2.0, 2.0], &[1.0, 1.0]).unwrap().is_empty());
    }

    #[test]
    fn externalized_ordering_agrees_with_zorder() {
        let points = grid_points();
        let z = KdwTree::with_ordering(&points, GlobalOrder::ZOrder).unwrap();
        let e = KdwTree::with_ordering(&points, GlobalOrder::Externalized).unwrap();
        assert_eq!(z.count(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), e.count(&[1.0, 1.0], &[2.0, 2.0]).unwrap());
        let mut z_report = z.report(&[1.0, 1.0], &[2.0, 2.0]).unwrap();
        let mut e_report = e.report(&[1.0, 1.0], &[2.0, 2.0]).unwrap();
        z_report.sort_unstable();
        e_report.sort_unstable();
        assert_eq!(z_report, e_report);
    }

    #[test]
    fn bounding_box_matches_input_extent() {
        let points = grid_points();
        let tree = KdwTree::new(&points).unwrap();
        assert_eq!(tree.bounding_box(), &[(0.0, 3.0), (0.0, 4.0)]);
    }
}
