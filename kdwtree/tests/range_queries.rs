//! End-to-end scenarios cross-checking both global orderings against a
//! linear scan oracle.

use kdwtree::{GlobalOrder, KdwTree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn linear_scan(points: &[Vec<f64>], min: &[f64], max: &[f64]) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .filter(|(_, p)| p.iter().zip(min).zip(max).all(|((&v, &lo), &hi)| v >= lo && v <= hi))
        .map(|(i, _)| i)
        .collect()
}

fn grid_points() -> Vec<Vec<f64>> {
    (0..4).flat_map(|x| (0..5).map(move |y| vec![x as f64, y as f64])).collect()
}

fn random_points(n: usize, k: usize, rng: &mut StdRng) -> Vec<Vec<f64>> {
    // Spec's domain is "uniform in (-MAX_DOUBLE, +MAX_DOUBLE)"; a magnitude that
    // wide makes almost every rectangle miss every point, which exercises disjointness
    // handling but nothing else. Use a tighter, still-signed range so most random
    // rectangles actually intersect some points.
    (0..n)
        .map(|_| (0..k).map(|_| rng.gen_range(-1e6..1e6)).collect())
        .collect()
}

fn random_rectangle(k: usize, rng: &mut StdRng) -> (Vec<f64>, Vec<f64>) {
    let mut min = vec![0.0; k];
    let mut max = vec![0.0; k];
    for d in 0..k {
        let a = rng.gen_range(-1e6..1e6);
        let b = rng.gen_range(-1e6..1e6);
        min[d] = a.min(b);
        max[d] = a.max(b);
    }
    (min, max)
}

fn as_set(v: &[usize]) -> HashSet<usize> {
    v.iter().copied().collect()
}

fn check_scenarios_for(ordering: GlobalOrder) {
    // S1
    let points = grid_points();
    let tree = KdwTree::with_ordering(&points, ordering).unwrap();
    assert_eq!(tree.count(&[1.0, 1.0], &[2.0, 2.0]).unwrap(), 4);
    assert_eq!(as_set(&tree.report(&[1.0, 1.0], &[2.0, 2.0]).unwrap()), HashSet::from([6, 7, 11, 12]));
    let mut rng = StdRng::seed_from_u64(77);
    let sample = tree.sample(&[1.0, 1.0], &[2.0, 2.0], 3, &mut rng).unwrap();
    assert_eq!(sample.len(), 3);
    assert!(as_set(&sample).is_subset(&HashSet::from([6, 7, 11, 12])));

    // S2
    assert_eq!(tree.count(&[0.0, 0.0], &[4.0, 4.0]).unwrap(), 20);
    assert_eq!(tree.count(&[-1.0, -1.0], &[5.0, 5.0]).unwrap(), 20);

    // S3
    assert_eq!(tree.count(&[5.0, 0.0], &[6.0, 4.0]).unwrap(), 0);
    assert!(tree.report(&[5.0, 0.0], &[6.0, 4.0]).unwrap().is_empty());

    // S4
    let single = vec![vec![1.5, -2.25, 1e308]];
    let tree = KdwTree::with_ordering(&single, ordering).unwrap();
    assert_eq!(tree.count(&[1.0, -3.0, 0.0], &[2.0, 0.0, 2e308]).unwrap(), 1);
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(tree.sample(&[1.0, -3.0, 0.0], &[2.0, 0.0, 2e308], 10, &mut rng).unwrap(), vec![0]);
}

#[test]
fn scenarios_pass_under_z_order() {
    check_scenarios_for(GlobalOrder::ZOrder);
}

#[test]
fn scenarios_pass_under_externalized_ordering() {
    check_scenarios_for(GlobalOrder::Externalized);
}

fn check_random_agreement_for(ordering: GlobalOrder, n: usize, k: usize, rectangles: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = random_points(n, k, &mut rng);
    let tree = KdwTree::with_ordering(&points, ordering).unwrap();

    for _ in 0..rectangles {
        let (min, max) = random_rectangle(k, &mut rng);
        let expected = linear_scan(&points, &min, &max);

        let count = tree.count(&min, &max).unwrap();
        assert_eq!(count, expected.len(), "count mismatch for rectangle {min:?}..{max:?}");

        let report = tree.report(&min, &max).unwrap();
        assert_eq!(report.len(), count);
        assert_eq!(as_set(&report), as_set(&expected));
    }
}

#[test]
fn s5_random_points_agree_with_linear_scan_z_order() {
    check_random_agreement_for(GlobalOrder::ZOrder, 1_000, 3, 100, 1);
}

#[test]
fn s5_random_points_agree_with_linear_scan_externalized() {
    check_random_agreement_for(GlobalOrder::Externalized, 1_000, 3, 100, 2);
}

fn check_sampling_for(ordering: GlobalOrder, n: usize, k: usize, rectangles: usize, s: usize, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let points = random_points(n, k, &mut rng);
    let tree = KdwTree::with_ordering(&points, ordering).unwrap();

    for _ in 0..rectangles {
        let (min, max) = random_rectangle(k, &mut rng);
        let expected = as_set(&linear_scan(&points, &min, &max));
        let sample = tree.sample(&min, &max, s, &mut rng).unwrap();

        let sample_set = as_set(&sample);
        assert_eq!(sample_set.len(), sample.len(), "sample must not contain duplicates");
        assert!(sample_set.is_subset(&expected), "every sampled index must pass the linear-scan check");
        if expected.len() <= s {
            assert_eq!(sample_set, expected);
        } else {
            assert_eq!(sample.len(), s);
        }
    }
}

#[test]
fn s6_sampling_membership_holds_z_order() {
    check_sampling_for(GlobalOrder::ZOrder, 100_000, 3, 50, 1_000, 5);
}

#[test]
fn s6_sampling_membership_holds_externalized() {
    check_sampling_for(GlobalOrder::Externalized, 100_000, 3, 50, 1_000, 6);
}

#[test]
fn empty_rectangle_never_matches_anything() {
    let mut rng = StdRng::seed_from_u64(11);
    let points = random_points(200, 3, &mut rng);
    for ordering in [GlobalOrder::ZOrder, GlobalOrder::Externalized] {
        let tree = KdwTree::with_ordering(&points, ordering).unwrap();
        let min = vec![5.0, 5.0, 5.0];
        let max = vec![4.0, 10.0, 10.0];
        assert_eq!(tree.count(&min, &max).unwrap(), 0);
        assert!(tree.report(&min, &max).unwrap().is_empty());
        let mut sample_rng = StdRng::seed_from_u64(12);
        assert!(tree.sample(&min, &max, 5, &mut sample_rng).unwrap().is_empty());
    }
}

#[test]
fn duplicate_coordinates_are_all_reported() {
    // every point shares the same value on one dimension; exercises the
    // rank-space dictionary's handling of repeated values and the
    // externalized tree's indivisible-dimension leaf rule (§4.6).
    let points: Vec<Vec<f64>> = (0..50).map(|i| vec![0.0, i as f64]).collect();
    for ordering in [GlobalOrder::ZOrder, GlobalOrder::Externalized] {
        let tree = KdwTree::with_ordering(&points, ordering).unwrap();
        assert_eq!(tree.count(&[0.0, 10.0], &[0.0, 20.0]).unwrap(), 11);
        let report = tree.report(&[0.0, 10.0], &[0.0, 20.0]).unwrap();
        assert_eq!(as_set(&report), (10..=20).collect());
    }
}

#[test]
fn skewed_dominant_value_above_stop_width_terminates() {
    // one dimension is 80% a single dominant value plus a scattered long
    // tail, above STOP_WIDTH, with the other dimension fully contained by
    // the query: the case that sent the bracket-midpoint split into
    // unconditional recursion before `Engine::choose_split` guarded it
    // (see DESIGN.md, "Correction (post-review)").
    let n = 3000;
    let points: Vec<Vec<f64>> = (0..n)
        .map(|i| {
            let x = if i % 5 == 0 { 1000.0 + i as f64 } else { 0.0 };
            vec![x, (i % 7) as f64]
        })
        .collect();
    for ordering in [GlobalOrder::ZOrder, GlobalOrder::Externalized] {
        let tree = KdwTree::with_ordering(&points, ordering).unwrap();
        let expected = linear_scan(&points, &[0.0, 0.0], &[0.0, 6.0]);
        let count = tree.count(&[0.0, 0.0], &[0.0, 6.0]).unwrap();
        assert_eq!(count, expected.len());
        let report = tree.report(&[0.0, 0.0], &[0.0, 6.0]).unwrap();
        assert_eq!(as_set(&report), as_set(&expected));
    }
}
