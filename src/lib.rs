//! Otoro library facade.
//!
//! Re-exports the public surface of `otoro-core`: the [`MTree`] metric index,
//! its builder, the promotion strategies, and the built-in example metrics.
//!
//! # Determinism
//!
//! Splits promote pivots through a [`PromotionStrategy`]; the default samples
//! uniformly from a seedable RNG, so fixing the seed (or swapping in
//! [`ExtremesPromotion`]) makes tree shapes reproducible. Query results are
//! deterministic regardless: emissions are ordered by distance, with ties
//! resolved by the stable child iteration order.

pub use otoro_core::{
    DEFAULT_MIN_NODE_CAPACITY, ExtremesPromotion, MTree, MTreeBuilder, MTreeError, MTreeErrorCode,
    Metric, Nearest, Neighbour, PromotionStrategy, RandomPromotion, Result,
    TreeInvariantViolation, euclidean_distance, levenshtein,
};
