//! Synthetic point generation for the benches.

use std::collections::HashSet;

use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Coordinate range of the generated points.
const COORDINATE_RANGE: std::ops::RangeInclusive<i32> = -1_000..=1_000;

/// Dimensionality of the generated points.
pub const DIMENSIONS: usize = 3;

/// Generates `count` distinct integer points, deterministically from `seed`.
///
/// The index requires distinct items, so duplicates from the generator are
/// re-drawn.
#[must_use]
pub fn synthetic_points(count: usize, seed: u64) -> Vec<Vec<i32>> {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut seen = HashSet::with_capacity(count);
    let mut points = Vec::with_capacity(count);
    while points.len() < count {
        let point: Vec<i32> = (0..DIMENSIONS)
            .map(|_| rng.gen_range(COORDINATE_RANGE))
            .collect();
        if seen.insert(point.clone()) {
            points.push(point);
        }
    }
    points
}
