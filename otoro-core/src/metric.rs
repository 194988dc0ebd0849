//! Distance oracle abstraction shared by the tree and its callers.

/// A distance function over items of type `T`.
///
/// Implementations must satisfy the metric axioms: non-negativity, identity
/// of indiscernibles, symmetry, and the triangle inequality. The tree prunes
/// subtrees with the triangle inequality, so a non-metric oracle silently
/// loses results.
///
/// The oracle must be pure: repeated calls with the same arguments must
/// return the same value.
///
/// Any `Fn(&T, &T) -> f64` closure or function is a metric:
///
/// # Examples
/// ```
/// use otoro_core::Metric;
///
/// fn absolute(a: &i32, b: &i32) -> f64 {
///     f64::from((a - b).abs())
/// }
///
/// assert_eq!(absolute.distance(&3, &7), 4.0);
/// ```
pub trait Metric<T> {
    /// Computes the distance between two items.
    fn distance(&self, left: &T, right: &T) -> f64;
}

impl<T, F> Metric<T> for F
where
    F: Fn(&T, &T) -> f64,
{
    fn distance(&self, left: &T, right: &T) -> f64 {
        self(left, right)
    }
}
