//! Converts raw model scores into a calibrated end-of-utterance probability.

use endcue_turn::{EouError, Result};
use serde::{Deserialize, Serialize};

/// Which output head the loaded model variant exposes.
///
/// Chosen by configuration, never sniffed from tensor shape; two model
/// variants exist in the wild and the shapes are too close to disambiguate
/// reliably at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreMode {
    /// Single pre-activated scalar; used directly as the probability.
    Head,
    /// Full vocabulary logits; softmax, then the mass at the end-of-turn token.
    Logits,
}

/// Numerically stable softmax over one score vector.
///
/// The max is subtracted before exponentiation so large-magnitude logits
/// cannot overflow `exp`. Accumulation runs in f64.
pub fn softmax(scores: &[f32]) -> Result<Vec<f32>> {
    if scores.is_empty() {
        return Err(EouError::EmptyScoreVector);
    }
    let mut max = f32::NEG_INFINITY;
    for &s in scores {
        if !s.is_finite() {
            return Err(EouError::NonFiniteScore);
        }
        if s > max {
            max = s;
        }
    }

    let exps: Vec<f64> = scores.iter().map(|&s| f64::from(s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    Ok(exps.into_iter().map(|e| (e / sum) as f32).collect())
}

/// Probability from a single pre-activated scalar head.
///
/// The head is trained to emit a probability directly; no further activation
/// is applied beyond clamping calibration noise into [0, 1].
pub fn score_from_head(scores: &[f32]) -> Result<f32> {
    let raw = match scores.first() {
        Some(&p) => p,
        None => return Err(EouError::EmptyScoreVector),
    };
    if !raw.is_finite() {
        return Err(EouError::NonFiniteScore);
    }
    Ok(raw.clamp(0.0, 1.0))
}

/// Probability mass the model assigns to `end_token_id`.
pub fn score_from_logits(scores: &[f32], end_token_id: u32) -> Result<f32> {
    if scores.is_empty() {
        return Err(EouError::EmptyScoreVector);
    }
    let idx = end_token_id as usize;
    if idx >= scores.len() {
        return Err(EouError::InvalidTokenIndex {
            id: end_token_id,
            classes: scores.len(),
        });
    }
    let probs = softmax(scores)?;
    Ok(probs[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_softmax_sums_to_one() {
        let probs = softmax(&[0.3, -1.2, 4.0, 2.0]).unwrap();
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < EPS, "sum should be ~1, got {sum}");
    }

    #[test]
    fn test_softmax_shift_invariant() {
        let scores = [0.5, -2.0, 3.0, 1.5];
        let shifted: Vec<f32> = scores.iter().map(|s| s + 100.0).collect();

        let a = score_from_logits(&scores, 2).unwrap();
        let b = score_from_logits(&shifted, 2).unwrap();
        assert!((a - b).abs() < EPS, "shift changed the result: {a} vs {b}");
    }

    #[test]
    fn test_known_value_reproducible() {
        // softmax([1, 2, 3]) at index 2 == e^0 / (e^-2 + e^-1 + e^0)
        let p = score_from_logits(&[1.0, 2.0, 3.0], 2).unwrap();
        assert!((p - 0.665241).abs() < EPS, "got {p}");
    }

    #[test]
    fn test_large_magnitude_logits_do_not_overflow() {
        let p = score_from_logits(&[1000.0, 1001.0], 1).unwrap();
        assert!(p.is_finite());
        // 1 / (1 + e^-1)
        assert!((p - 0.731_058_6).abs() < EPS, "got {p}");
    }

    #[test]
    fn test_empty_scores_fail() {
        assert!(matches!(
            score_from_logits(&[], 0),
            Err(EouError::EmptyScoreVector)
        ));
        assert!(matches!(
            score_from_head(&[]),
            Err(EouError::EmptyScoreVector)
        ));
    }

    #[test]
    fn test_out_of_range_index_fails() {
        let err = score_from_logits(&[1.0, 2.0, 3.0], 3).unwrap_err();
        assert!(matches!(
            err,
            EouError::InvalidTokenIndex { id: 3, classes: 3 }
        ));
    }

    #[test]
    fn test_nan_fails_fast() {
        assert!(matches!(
            score_from_logits(&[1.0, f32::NAN, 3.0], 0),
            Err(EouError::NonFiniteScore)
        ));
        assert!(matches!(
            score_from_head(&[f32::NAN]),
            Err(EouError::NonFiniteScore)
        ));
        assert!(matches!(
            score_from_logits(&[1.0, f32::INFINITY], 0),
            Err(EouError::NonFiniteScore)
        ));
    }

    #[test]
    fn test_head_uses_first_element_directly() {
        assert_eq!(score_from_head(&[0.87]).unwrap(), 0.87);
        assert_eq!(score_from_head(&[0.2, 9.9]).unwrap(), 0.2);
    }

    #[test]
    fn test_head_clamps_calibration_noise() {
        assert_eq!(score_from_head(&[1.5]).unwrap(), 1.0);
        assert_eq!(score_from_head(&[-0.1]).unwrap(), 0.0);
    }
}
