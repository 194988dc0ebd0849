//! Built-in example metrics.
//!
//! The tree itself is metric-agnostic; these routines cover the two domains
//! exercised by the test fixtures and the word-search CLI: Euclidean distance
//! over numeric vectors and Levenshtein edit distance over words.

mod euclidean;
mod levenshtein;

pub use self::euclidean::euclidean_distance;
pub use self::levenshtein::levenshtein;
