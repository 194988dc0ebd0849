/// Computes the case-insensitive Levenshtein edit distance between two words.
///
/// Both inputs are lowercased before comparison, so `"Gol"` and `"gol"` are
/// zero apart. Comparison is per Unicode scalar value.
///
/// # Examples
/// ```
/// use otoro_core::levenshtein;
///
/// assert_eq!(levenshtein("gol", "bola"), 2.0);
/// assert_eq!(levenshtein("Word", "word"), 0.0);
/// ```
pub fn levenshtein(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.chars().flat_map(char::to_lowercase).collect();
    let right: Vec<char> = right.chars().flat_map(char::to_lowercase).collect();

    if left.is_empty() {
        return right.len() as f64;
    }
    if right.is_empty() {
        return left.len() as f64;
    }

    // Two-row form of the edit table.
    let mut previous: Vec<usize> = (0..=right.len()).collect();
    let mut current = vec![0_usize; right.len() + 1];

    for (i, &l) in left.iter().enumerate() {
        current[0] = i + 1;
        for (j, &r) in right.iter().enumerate() {
            current[j + 1] = if l == r {
                previous[j]
            } else {
                1 + previous[j].min(previous[j + 1]).min(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[right.len()] as f64
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    #[rstest]
    #[case("", "", 0.0)]
    #[case("", "abc", 3.0)]
    #[case("abc", "", 3.0)]
    #[case("kitten", "sitting", 3.0)]
    #[case("gol", "bola", 2.0)]
    #[case("flaw", "lawn", 2.0)]
    #[case("CASA", "casa", 0.0)]
    fn matches_known_edit_distances(#[case] left: &str, #[case] right: &str, #[case] expected: f64) {
        assert_eq!(super::levenshtein(left, right), expected);
    }

    #[test]
    fn is_symmetric() {
        assert_eq!(
            super::levenshtein("palavra", "lavra"),
            super::levenshtein("lavra", "palavra"),
        );
    }
}
