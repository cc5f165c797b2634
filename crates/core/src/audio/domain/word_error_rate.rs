/// Word error rate of `hypothesis` against `reference`: word-level edit
/// distance (substitutions, insertions, deletions) divided by the number of
/// reference words.
///
/// Inputs are split on whitespace; normalize them first. The result is
/// non-negative and can exceed 1.0 when the hypothesis has extra words. An
/// empty reference divides by one, so the rate equals the hypothesis length.
pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    let reference: Vec<&str> = reference.split_whitespace().collect();
    let hypothesis: Vec<&str> = hypothesis.split_whitespace().collect();
    let distance = edit_distance(&reference, &hypothesis);
    distance as f64 / reference.len().max(1) as f64
}

/// Levenshtein distance over word slices, two rolling rows.
fn edit_distance(a: &[&str], b: &[&str]) -> usize {
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, wa) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, wb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(wa != wb);
            let deletion = prev[j + 1] + 1;
            let insertion = curr[j] + 1;
            curr[j + 1] = substitution.min(deletion).min(insertion);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_identical_is_zero() {
        assert_eq!(word_error_rate("in the name of god", "in the name of god"), 0.0);
    }

    #[rstest]
    #[case::one_substitution("the people came", "the people went", 1.0 / 3.0)]
    #[case::one_deletion("the people came", "the people", 1.0 / 3.0)]
    #[case::one_insertion("the people came", "the people came home", 1.0 / 3.0)]
    #[case::all_wrong("a b", "c d", 1.0)]
    #[case::empty_hypothesis("a b c d", "", 1.0)]
    #[case::longer_than_reference("a", "x y z", 3.0)]
    fn test_word_error_rate(#[case] reference: &str, #[case] hypothesis: &str, #[case] expected: f64) {
        assert_relative_eq!(word_error_rate(reference, hypothesis), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_empty_reference() {
        assert_eq!(word_error_rate("", ""), 0.0);
        assert_eq!(word_error_rate("", "stray words"), 2.0);
    }

    #[test]
    fn test_whitespace_runs_ignored() {
        assert_eq!(word_error_rate("a  b\tc", " a b c "), 0.0);
    }

    #[test]
    fn test_edit_distance_transposition_costs_two() {
        assert_eq!(edit_distance(&["a", "b"], &["b", "a"]), 2);
    }
}
