//! Descriptive band statistics for a single batch.
//!
//! Complements the classifier verdict with plain readings of the band
//! ratios, for one-off analysis of a recorded batch.

use crate::acquisition::types::{Band, RawSample};
use crate::core::aggregate::Trend;
use crate::core::error::PipelineError;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Range, mean and intra-batch direction of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSummary {
    pub band: Band,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    /// Last sample compared with the first
    pub direction: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArousalReading {
    Relaxed,
    Alert,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrowsinessReading {
    High,
    Moderate,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusReading {
    Good,
    Moderate,
    Poor,
}

impl ArousalReading {
    pub fn describe(&self) -> &'static str {
        match self {
            ArousalReading::Relaxed => "Relaxed state",
            ArousalReading::Alert => "Alert state",
            ArousalReading::Neutral => "Neutral state",
        }
    }
}

impl DrowsinessReading {
    pub fn describe(&self) -> &'static str {
        match self {
            DrowsinessReading::High => "High drowsiness",
            DrowsinessReading::Moderate => "Moderate drowsiness",
            DrowsinessReading::Low => "Low drowsiness",
        }
    }
}

impl FocusReading {
    pub fn describe(&self) -> &'static str {
        match self {
            FocusReading::Good => "Good focus",
            FocusReading::Moderate => "Moderate focus",
            FocusReading::Poor => "Poor focus",
        }
    }
}

/// Band summaries and ratio readings for a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandInsights {
    pub bands: Vec<BandSummary>,
    pub alpha_beta_ratio: f64,
    pub theta_alpha_ratio: f64,
    pub beta_theta_ratio: f64,
    pub arousal: ArousalReading,
    pub drowsiness: DrowsinessReading,
    pub focus: FocusReading,
}

impl BandInsights {
    pub fn from_samples(samples: &[RawSample]) -> Result<Self, PipelineError> {
        let (Some(first), Some(last)) = (samples.first(), samples.last()) else {
            return Err(PipelineError::EmptyBatch);
        };

        let bands: Vec<BandSummary> = Band::ALL
            .into_iter()
            .map(|band| {
                let values = samples.iter().map(|s| s.band(band));
                let (start, end) = (first.band(band), last.band(band));
                BandSummary {
                    band,
                    min: Statistics::min(values.clone()),
                    max: Statistics::max(values.clone()),
                    avg: values.mean(),
                    direction: if end > start {
                        Trend::Increasing
                    } else if end < start {
                        Trend::Decreasing
                    } else {
                        Trend::Stable
                    },
                }
            })
            .collect();

        let (alpha, beta, theta) = (bands[0].avg, bands[1].avg, bands[2].avg);
        let alpha_beta_ratio = ratio(alpha, beta);
        let theta_alpha_ratio = ratio(theta, alpha);
        let beta_theta_ratio = ratio(beta, theta);

        Ok(Self {
            bands,
            alpha_beta_ratio,
            theta_alpha_ratio,
            beta_theta_ratio,
            arousal: if alpha_beta_ratio > 1.2 {
                ArousalReading::Relaxed
            } else if alpha_beta_ratio < 0.8 {
                ArousalReading::Alert
            } else {
                ArousalReading::Neutral
            },
            drowsiness: if theta_alpha_ratio > 0.8 {
                DrowsinessReading::High
            } else if theta_alpha_ratio > 0.6 {
                DrowsinessReading::Moderate
            } else {
                DrowsinessReading::Low
            },
            focus: if beta_theta_ratio > 1.2 {
                FocusReading::Good
            } else if beta_theta_ratio < 0.9 {
                FocusReading::Poor
            } else {
                FocusReading::Moderate
            },
        })
    }

    pub fn band(&self, band: Band) -> Option<&BandSummary> {
        self.bands.iter().find(|s| s.band == band)
    }
}

/// Ratio of two band averages; a zero denominator yields 0.
fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_batch() -> Vec<RawSample> {
        [
            (0.3829952605610029, 0.3278990489077491, 0.28910569053124796),
            (0.3837218405766482, 0.3221840013295427, 0.2940941580938092),
            (0.38497876721643043, 0.31592745623609036, 0.29909377654747915),
            (0.38673139067483014, 0.3091745569392213, 0.3040940523859487),
            (0.3902378705549261, 0.29820083124632074, 0.3115612981987532),
        ]
        .into_iter()
        .map(|(a, b, t)| RawSample::now(a, b, t))
        .collect()
    }

    #[test]
    fn test_empty_rejected() {
        assert!(matches!(
            BandInsights::from_samples(&[]),
            Err(PipelineError::EmptyBatch)
        ));
    }

    #[test]
    fn test_reference_batch_readings() {
        let insights = BandInsights::from_samples(&reference_batch()).unwrap();

        let alpha = insights.band(Band::Alpha).unwrap();
        assert_eq!(alpha.direction, Trend::Increasing);
        assert!(alpha.min < alpha.avg && alpha.avg < alpha.max);
        assert_eq!(insights.band(Band::Beta).unwrap().direction, Trend::Decreasing);
        assert_eq!(insights.band(Band::Theta).unwrap().direction, Trend::Increasing);

        // alpha/beta ~1.22, theta/alpha ~0.78, beta/theta ~1.05
        assert_eq!(insights.arousal, ArousalReading::Relaxed);
        assert_eq!(insights.drowsiness, DrowsinessReading::Moderate);
        assert_eq!(insights.focus, FocusReading::Moderate);
    }

    #[test]
    fn test_zero_band_does_not_divide_by_zero() {
        let insights = BandInsights::from_samples(&[RawSample::now(0.4, 0.3, 0.0)]).unwrap();
        assert_eq!(insights.beta_theta_ratio, 0.0);
        assert_eq!(insights.focus, FocusReading::Poor);
    }
}
