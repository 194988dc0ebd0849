//! Benchmark parameter types.
//!
//! Groups related benchmark parameters into structs so the bench ids stay
//! readable across the capacity sweep.

use std::fmt;

/// Parameters for one M-Tree capacity-sweep run.
#[derive(Clone, Debug)]
pub struct CapacitySweepParams {
    /// Number of points in the dataset.
    pub point_count: usize,
    /// Minimum node occupancy under test.
    pub min_capacity: usize,
}

impl fmt::Display for CapacitySweepParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n={},min={}", self.point_count, self.min_capacity)
    }
}
