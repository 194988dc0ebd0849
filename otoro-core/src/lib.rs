//! otoro core library.
//!
//! An in-memory M-Tree: a dynamic, balanced metric-space index supporting
//! insertion, deletion, and incremental nearest-neighbour retrieval over any
//! caller-supplied [`Metric`].

mod builder;
mod distance;
mod error;
mod metric;
mod mtree;

pub use crate::{
    builder::{DEFAULT_MIN_NODE_CAPACITY, MTreeBuilder},
    distance::{euclidean_distance, levenshtein},
    error::{MTreeError, MTreeErrorCode, Result},
    metric::Metric,
    mtree::{
        ExtremesPromotion, MTree, Nearest, Neighbour, PromotionStrategy, RandomPromotion,
        TreeInvariantViolation,
    },
};
