//! Builder utilities for configuring an [`MTree`].
//!
//! Validates capacity bounds before any node exists, so an invalid
//! configuration is a construction-time failure rather than a latent
//! structural defect.

use crate::error::MTreeError;
use crate::metric::Metric;
use crate::mtree::{MTree, PromotionStrategy, RandomPromotion};

/// Default minimum node occupancy when the builder is left untouched.
pub const DEFAULT_MIN_NODE_CAPACITY: usize = 50;

/// Configures and constructs [`MTree`] instances.
///
/// The maximum node capacity defaults to `2 * min - 1` and must exceed the
/// minimum; the minimum must be at least two.
///
/// # Examples
/// ```
/// use otoro_core::{MTreeBuilder, levenshtein};
///
/// let tree = MTreeBuilder::new(|a: &String, b: &String| levenshtein(a, b))
///     .with_min_node_capacity(4)
///     .build::<String>()
///     .expect("capacity bounds are valid");
/// assert_eq!(tree.min_node_capacity(), 4);
/// assert_eq!(tree.max_node_capacity(), 7);
/// ```
#[derive(Debug)]
pub struct MTreeBuilder<D, P = RandomPromotion> {
    min_node_capacity: usize,
    max_node_capacity: Option<usize>,
    metric: D,
    promotion: P,
}

impl<D> MTreeBuilder<D, RandomPromotion> {
    /// Creates a builder around a metric, with default capacities and random
    /// promotion.
    #[must_use]
    pub fn new(metric: D) -> Self {
        Self {
            min_node_capacity: DEFAULT_MIN_NODE_CAPACITY,
            max_node_capacity: None,
            metric,
            promotion: RandomPromotion::new(),
        }
    }
}

impl<D, P> MTreeBuilder<D, P> {
    /// Overrides the minimum node occupancy.
    #[must_use]
    pub fn with_min_node_capacity(mut self, capacity: usize) -> Self {
        self.min_node_capacity = capacity;
        self
    }

    /// Overrides the maximum node occupancy. When unset, `build` derives
    /// `2 * min - 1`.
    #[must_use]
    pub fn with_max_node_capacity(mut self, capacity: usize) -> Self {
        self.max_node_capacity = Some(capacity);
        self
    }

    /// Replaces the node-split promotion strategy.
    ///
    /// Tests use [`crate::ExtremesPromotion`] to make splits deterministic.
    #[must_use]
    pub fn with_promotion<P2>(self, promotion: P2) -> MTreeBuilder<D, P2> {
        MTreeBuilder {
            min_node_capacity: self.min_node_capacity,
            max_node_capacity: self.max_node_capacity,
            metric: self.metric,
            promotion,
        }
    }

    /// Returns the configured minimum node occupancy.
    #[must_use]
    pub fn min_node_capacity(&self) -> usize {
        self.min_node_capacity
    }

    /// Returns the configured maximum node occupancy, if overridden.
    #[must_use]
    pub fn max_node_capacity(&self) -> Option<usize> {
        self.max_node_capacity
    }

    /// Validates the configuration and constructs an empty [`MTree`].
    ///
    /// # Errors
    /// Returns [`MTreeError::InvalidMinCapacity`] when the minimum is below
    /// two, and [`MTreeError::InvalidMaxCapacity`] when the maximum does not
    /// exceed the minimum.
    pub fn build<T>(self) -> crate::Result<MTree<T, D, P>>
    where
        T: Clone + Ord,
        D: Metric<T>,
        P: PromotionStrategy<T>,
    {
        if self.min_node_capacity < 2 {
            return Err(MTreeError::InvalidMinCapacity {
                got: self.min_node_capacity,
            });
        }
        let max_node_capacity = self
            .max_node_capacity
            .unwrap_or(2 * self.min_node_capacity - 1);
        if max_node_capacity <= self.min_node_capacity {
            return Err(MTreeError::InvalidMaxCapacity {
                min: self.min_node_capacity,
                max: max_node_capacity,
            });
        }
        Ok(MTree::with_parameters(
            self.min_node_capacity,
            max_node_capacity,
            self.metric,
            self.promotion,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use crate::error::{MTreeError, MTreeErrorCode};
    use crate::mtree::MTree;

    use super::MTreeBuilder;

    fn absolute(a: &i32, b: &i32) -> f64 {
        f64::from((a - b).abs())
    }

    #[test]
    fn derives_max_capacity_from_min() {
        let tree: MTree<i32, _, _> = MTreeBuilder::new(absolute)
            .with_min_node_capacity(8)
            .build()
            .expect("bounds are valid");
        assert_eq!(tree.max_node_capacity(), 15);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    fn rejects_min_capacity_below_two(#[case] min: usize) {
        let err = MTreeBuilder::new(absolute)
            .with_min_node_capacity(min)
            .build::<i32>()
            .expect_err("minimum below two must be rejected");
        assert_eq!(err, MTreeError::InvalidMinCapacity { got: min });
        assert_eq!(err.code(), MTreeErrorCode::InvalidMinCapacity);
    }

    #[rstest]
    #[case(4, 4)]
    #[case(4, 3)]
    fn rejects_max_capacity_not_above_min(#[case] min: usize, #[case] max: usize) {
        let err = MTreeBuilder::new(absolute)
            .with_min_node_capacity(min)
            .with_max_node_capacity(max)
            .build::<i32>()
            .expect_err("maximum must exceed minimum");
        assert_eq!(err.code(), MTreeErrorCode::InvalidMaxCapacity);
    }
}
