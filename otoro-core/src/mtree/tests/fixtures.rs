//! Shared helpers: deterministic tree construction and the brute-force
//! search oracle.

use crate::{ExtremesPromotion, MTree, MTreeBuilder, euclidean_distance};

pub(super) type Point = Vec<i32>;
pub(super) type PointMetric = fn(&Point, &Point) -> f64;

pub(super) fn euclid(a: &Point, b: &Point) -> f64 {
    euclidean_distance(a, b)
}

/// Builds a tree with deterministic splits: extremes promotion makes every
/// structural outcome reproducible.
pub(super) fn deterministic_tree(
    min_node_capacity: usize,
    max_node_capacity: usize,
) -> MTree<Point, PointMetric, ExtremesPromotion> {
    MTreeBuilder::new(euclid as PointMetric)
        .with_min_node_capacity(min_node_capacity)
        .with_max_node_capacity(max_node_capacity)
        .with_promotion(ExtremesPromotion)
        .build()
        .expect("test capacities are valid")
}

/// All live items within `radius` of `query`, sorted by distance then item.
pub(super) fn brute_force_within(live: &[Point], query: &Point, radius: f64) -> Vec<(Point, f64)> {
    let mut hits: Vec<(Point, f64)> = live
        .iter()
        .map(|item| (item.clone(), euclid(item, query)))
        .filter(|&(_, distance)| distance <= radius)
        .collect();
    hits.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    hits
}

/// Asserts that a range query over the tree agrees with the brute-force
/// oracle: sound (every hit is live and within radius, distances correct,
/// order non-decreasing) and complete (every qualifying live item appears
/// exactly once).
pub(super) fn assert_range_query_matches_oracle(
    tree: &MTree<Point, PointMetric, ExtremesPromotion>,
    live: &[Point],
    query: &Point,
    radius: f64,
) {
    let results: Vec<(Point, f64)> = tree
        .nearest_by_range(query.clone(), radius)
        .map(|neighbour| (neighbour.item.clone(), neighbour.distance))
        .collect();

    let mut previous = 0.0_f64;
    for (item, distance) in &results {
        assert!(
            *distance >= previous,
            "distances must be non-decreasing: {distance} after {previous}"
        );
        previous = *distance;
        assert!(*distance <= radius, "result outside the query radius");
        assert_eq!(*distance, euclid(item, query), "reported distance is wrong");
        assert!(live.contains(item), "result is not a live item");
    }

    let expected = brute_force_within(live, query, radius);
    assert_eq!(
        results.len(),
        expected.len(),
        "query returned {} items, oracle found {}",
        results.len(),
        expected.len()
    );
    for (item, _) in &expected {
        assert_eq!(
            results.iter().filter(|(hit, _)| hit == item).count(),
            1,
            "each qualifying item must appear exactly once"
        );
    }
}
