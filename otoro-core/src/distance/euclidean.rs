/// Computes the Euclidean distance between two equal-length vectors.
///
/// Accepts any component type losslessly convertible to `f64`, so fixture
/// vectors of `i32` and plain `f32` data share one implementation.
///
/// # Examples
/// ```
/// use otoro_core::euclidean_distance;
///
/// let distance = euclidean_distance(&[0, 3], &[4, 0]);
/// assert_eq!(distance, 5.0);
/// ```
///
/// # Panics
/// Debug builds panic when the vectors have different lengths; release
/// builds ignore the excess components of the longer vector.
pub fn euclidean_distance<N>(left: &[N], right: &[N]) -> f64
where
    N: Copy + Into<f64>,
{
    debug_assert_eq!(
        left.len(),
        right.len(),
        "euclidean distance requires equal dimensions"
    );
    let mut sum = 0.0_f64;
    for (&l, &r) in left.iter().zip(right.iter()) {
        let diff = l.into() - r.into();
        sum += diff * diff;
    }
    sum.sqrt()
}
