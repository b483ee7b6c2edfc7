//! Vector similarity helpers.

use super::error::{CacheError, CacheResult};

/// Cosine similarity in `[-1, 1]`.
///
/// Returns `0.0` for mismatched lengths, empty input, or a zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0)
    }
}

/// Rejects empty or non-finite embeddings, and lengths other than `expected_dim`.
pub fn validate_embedding(embedding: &[f32], expected_dim: Option<usize>) -> CacheResult<()> {
    if embedding.is_empty() {
        return Err(CacheError::EmptyEmbedding);
    }

    if let Some(expected) = expected_dim
        && embedding.len() != expected
    {
        return Err(CacheError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }

    if let Some(index) = embedding.iter().position(|v| !v.is_finite()) {
        return Err(CacheError::NonFiniteEmbedding { index });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_vectors() {
        let v = vec![0.3, -0.2, 0.9];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_orthogonal_and_opposite() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vectors_are_zero_not_nan() {
        let sim = cosine_similarity(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]);
        assert_eq!(sim, 0.0);
        assert!(!sim.is_nan());
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_length_mismatch_and_empty() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
    }

    #[test]
    fn test_validate_embedding() {
        assert!(validate_embedding(&[0.1, 0.2], None).is_ok());
        assert!(validate_embedding(&[0.1, 0.2], Some(2)).is_ok());
        assert!(matches!(
            validate_embedding(&[], None),
            Err(CacheError::EmptyEmbedding)
        ));
        assert!(matches!(
            validate_embedding(&[0.1, 0.2], Some(3)),
            Err(CacheError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
        assert!(matches!(
            validate_embedding(&[0.1, f32::NAN], None),
            Err(CacheError::NonFiniteEmbedding { index: 1 })
        ));
    }
}
