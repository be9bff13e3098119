//! Embedding similarity.
//!
//! Zero doubles as the "cannot compare" sentinel: callers treat it as a
//! non-match, never as evidence of orthogonal faces.

/// Cosine similarity of two embeddings.
///
/// Returns 0 when either side is absent, the lengths differ, or either
/// vector has zero norm.
pub fn cosine_similarity(a: Option<&[f32]>, b: Option<&[f32]>) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    dot / denom
}

/// Highest pairwise similarity across two embedding sets, or `None` if
/// either set is empty.
pub fn max_similarity(before: &[Option<&[f32]>], after: &[Option<&[f32]>]) -> Option<f64> {
    before
        .iter()
        .flat_map(|a| after.iter().map(move |b| cosine_similarity(*a, *b)))
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::unit(vec![1.0, 0.0, 0.0])]
    #[case::unnormalized(vec![3.0, 4.0])]
    #[case::negative(vec![-0.2, 0.5, -0.9, 0.1])]
    fn test_self_similarity_is_one(#[case] v: Vec<f32>) {
        assert_relative_eq!(
            cosine_similarity(Some(v.as_slice()), Some(v.as_slice())),
            1.0,
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_orthogonal_is_zero() {
        let a = [1.0, 0.0];
        let b = [0.0, 1.0];
        assert_relative_eq!(cosine_similarity(Some(&a[..]), Some(&b[..])), 0.0);
    }

    #[test]
    fn test_opposite_is_minus_one() {
        let a = [1.0, 2.0];
        let b = [-1.0, -2.0];
        assert_relative_eq!(cosine_similarity(Some(&a[..]), Some(&b[..])), -1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_scale_invariant() {
        let a = [0.6, 0.8];
        let b = [6.0, 8.0];
        assert_relative_eq!(cosine_similarity(Some(&a[..]), Some(&b[..])), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_known_value() {
        let a = [1.0, 0.0];
        let b = [1.0, 1.0];
        assert_relative_eq!(
            cosine_similarity(Some(&a[..]), Some(&b[..])),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-7
        );
    }

    #[rstest]
    #[case::left_absent(None, Some(vec![1.0, 0.0]))]
    #[case::right_absent(Some(vec![1.0, 0.0]), None)]
    #[case::both_absent(None, None)]
    #[case::length_mismatch(Some(vec![1.0, 0.0]), Some(vec![1.0, 0.0, 0.0]))]
    #[case::zero_vector(Some(vec![0.0, 0.0]), Some(vec![1.0, 0.0]))]
    #[case::empty(Some(vec![]), Some(vec![]))]
    fn test_degenerate_inputs_are_zero(#[case] a: Option<Vec<f32>>, #[case] b: Option<Vec<f32>>) {
        assert_eq!(cosine_similarity(a.as_deref(), b.as_deref()), 0.0);
    }

    #[test]
    fn test_max_similarity_picks_best_pair() {
        let a1 = [1.0, 0.0];
        let a2 = [0.0, 1.0];
        let b1 = [1.0, 1.0];
        let b2 = [0.0, 1.0];
        let best = max_similarity(
            &[Some(&a1[..]), Some(&a2[..])],
            &[Some(&b1[..]), Some(&b2[..])],
        );
        assert_relative_eq!(best.unwrap(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_max_similarity_empty_side_is_none() {
        let a = [1.0, 0.0];
        assert!(max_similarity(&[Some(&a[..])], &[]).is_none());
        assert!(max_similarity(&[], &[Some(&a[..])]).is_none());
    }

    #[test]
    fn test_max_similarity_with_missing_embeddings_is_zero() {
        let a = [1.0, 0.0];
        let best = max_similarity(&[Some(&a[..])], &[None]);
        assert_eq!(best, Some(0.0));
    }
}
