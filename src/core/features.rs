//! Feature synthesis from band powers.
//!
//! The classifier was trained on 17 features. The headband only provides
//! three band powers, so the remaining positions are derived heuristically
//! from them. The mapping is fixed: positions must not move, and the
//! arithmetic order below is part of the contract (results are bit-for-bit
//! reproducible).

use serde::{Deserialize, Serialize};

/// Number of features the classifier expects.
pub const FEATURE_COUNT: usize = 17;

/// Additive floor on every ratio denominator.
const RATIO_FLOOR: f64 = 0.001;

/// Short names for each feature position, for display.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "raw_amplitude_alpha",
    "raw_amplitude_beta",
    "raw_amplitude_theta",
    "combined_amplitude",
    "constant_0",
    "alpha_beta_ratio",
    "beta_theta_ratio",
    "alpha_theta_ratio",
    "constant_1",
    "theta_alpha_ratio",
    "combined_power",
    "primary_power",
    "main_discriminator",
    "weighted_analysis",
    "attention_ratio",
    "statistical_combination",
    "spectral_complexity",
];

/// The 17 model-ready features for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn values(&self) -> [f64; FEATURE_COUNT] {
        self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.0.iter().copied()
    }
}

/// Synthesize the feature vector for one reading.
///
/// Total over finite inputs: every denominator carries a +0.001 floor, so
/// non-negative band powers can never divide by zero.
pub fn synthesize(alpha: f64, beta: f64, theta: f64) -> FeatureVector {
    FeatureVector([
        alpha * 50.0,
        beta * 60.0,
        theta * 80.0,
        (alpha + beta) * 40.0,
        0.0,
        alpha / (beta + RATIO_FLOOR),
        beta / (theta + RATIO_FLOOR),
        alpha / (theta + RATIO_FLOOR),
        0.0,
        theta / (alpha + RATIO_FLOOR),
        (alpha + beta + theta) * 6.0,
        beta * 20.0 + alpha * 8.0,
        (beta - theta) + alpha * 0.5,
        beta * 15.0 + alpha * 5.0,
        (beta / (alpha + RATIO_FLOOR)) * 3.0,
        alpha * beta * theta * 50.0,
        (alpha * beta * theta).sqrt() * 2.0,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        let a = synthesize(0.3829952605610029, 0.3278990489077491, 0.28910569053124796);
        let b = synthesize(0.3829952605610029, 0.3278990489077491, 0.28910569053124796);
        assert_eq!(a, b);
        for (x, y) in a.iter().zip(b.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }

    #[test]
    fn test_constant_positions_are_zero() {
        for (a, b, t) in [(0.0, 0.0, 0.0), (0.75, 0.45, 0.30), (3.0, 12.5, 0.01)] {
            let features = synthesize(a, b, t);
            assert_eq!(features.get(4), Some(0.0));
            assert_eq!(features.get(8), Some(0.0));
        }
    }

    #[test]
    fn test_all_zero_input_is_finite() {
        let features = synthesize(0.0, 0.0, 0.0);
        assert!(features.iter().all(f64::is_finite));
        assert!(features.iter().all(|v| v == 0.0));
    }

    #[test]
    fn test_known_values() {
        let f = synthesize(0.75, 0.45, 0.30);
        let expected = [
            37.5,
            27.0,
            24.0,
            48.0,
            0.0,
            0.75 / 0.451,
            0.45 / 0.301,
            0.75 / 0.301,
            0.0,
            0.30 / 0.751,
            9.0,
            15.0,
            0.525,
            10.5,
            (0.45 / 0.751) * 3.0,
            0.75 * 0.45 * 0.30 * 50.0,
            (0.75f64 * 0.45 * 0.30).sqrt() * 2.0,
        ];
        for (i, (got, want)) in f.iter().zip(expected).enumerate() {
            assert!((got - want).abs() < 1e-9, "feature {i}: {got} != {want}");
        }
    }

    #[test]
    fn test_out_of_range_inputs_tolerated() {
        let features = synthesize(2.5, 1.2, 4.0);
        assert!(features.iter().all(f64::is_finite));
        assert_eq!(features.as_slice().len(), FEATURE_COUNT);
    }
}
