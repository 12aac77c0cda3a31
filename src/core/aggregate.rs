//! Batch aggregation of per-sample classifications.
//!
//! A batch is the group of samples returned by one poll. Aggregation turns
//! the per-sample verdicts into one [`BatchAnalysis`]: the dominant label,
//! how consistently the samples agree on it, mean confidence, mean class
//! probabilities and per-band averages. Trends are left `Stable` here and
//! filled in by the trend tracker, which owns the previous batch.

use crate::acquisition::types::{Band, RawSample};
use crate::core::classifier::{ClassificationResult, EmotionLabel, LabelProbabilities};
use crate::core::error::PipelineError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Direction of a band's average between consecutive batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    #[default]
    Stable,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Increasing => "↗",
            Trend::Decreasing => "↘",
            Trend::Stable => "→",
        }
    }
}

/// Average and trend of one band over a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandStat {
    pub avg: f64,
    pub trend: Trend,
}

/// Per-band statistics for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandStats {
    pub alpha: BandStat,
    pub beta: BandStat,
    pub theta: BandStat,
}

impl BandStats {
    /// Stats with the given averages and every trend `Stable`.
    pub fn from_averages(alpha: f64, beta: f64, theta: f64) -> Self {
        let stat = |avg| BandStat {
            avg,
            trend: Trend::Stable,
        };
        Self {
            alpha: stat(alpha),
            beta: stat(beta),
            theta: stat(theta),
        }
    }

    pub fn get(&self, band: Band) -> &BandStat {
        match band {
            Band::Alpha => &self.alpha,
            Band::Beta => &self.beta,
            Band::Theta => &self.theta,
        }
    }

    pub fn get_mut(&mut self, band: Band) -> &mut BandStat {
        match band {
            Band::Alpha => &mut self.alpha,
            Band::Beta => &mut self.beta,
            Band::Theta => &mut self.theta,
        }
    }

    /// Averages as an (alpha, beta, theta) triple.
    pub fn averages(&self) -> [f64; 3] {
        [self.alpha.avg, self.beta.avg, self.theta.avg]
    }
}

/// Aggregated verdict for one batch. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAnalysis {
    /// Timestamp of the latest sample in the batch
    pub timestamp: DateTime<Utc>,
    pub batch_size: usize,
    pub dominant_label: EmotionLabel,
    /// Number of samples whose label is the dominant one
    pub dominant_count: usize,
    /// `dominant_count / batch_size`
    pub consistency: f64,
    /// Mean over samples of the winning probability
    pub avg_confidence: f64,
    pub avg_probabilities: LabelProbabilities,
    pub band_stats: BandStats,
}

/// Aggregate classified samples into a batch verdict.
///
/// The dominant label is the most frequent one. Count ties go to the label
/// with the larger summed probability mass over the batch, and remaining
/// exact ties to the earlier label in canonical order.
pub fn aggregate(
    results: &[(RawSample, ClassificationResult)],
) -> Result<BatchAnalysis, PipelineError> {
    let Some(latest) = Iterator::max(results.iter().map(|(s, _)| s.timestamp)) else {
        return Err(PipelineError::EmptyBatch);
    };
    let batch_size = results.len();

    let count = |label: EmotionLabel| results.iter().filter(|(_, r)| r.label == label).count();
    let mass = |label: EmotionLabel| {
        results
            .iter()
            .map(|(_, r)| r.probabilities.get(label))
            .sum::<f64>()
    };

    let mut dominant = EmotionLabel::ALL[0];
    let mut dominant_key = (count(dominant), mass(dominant));
    for label in EmotionLabel::ALL.into_iter().skip(1) {
        let key = (count(label), mass(label));
        if key.0 > dominant_key.0 || (key.0 == dominant_key.0 && key.1 > dominant_key.1) {
            dominant = label;
            dominant_key = key;
        }
    }

    let mut avg_probabilities = LabelProbabilities::default();
    for label in EmotionLabel::ALL {
        avg_probabilities.set(
            label,
            results.iter().map(|(_, r)| r.probabilities.get(label)).mean(),
        );
    }

    let band_mean = |band: Band| results.iter().map(|(s, _)| s.band(band)).mean();

    Ok(BatchAnalysis {
        timestamp: latest,
        batch_size,
        dominant_label: dominant,
        dominant_count: dominant_key.0,
        consistency: dominant_key.0 as f64 / batch_size as f64,
        avg_confidence: results.iter().map(|(_, r)| r.confidence()).mean(),
        avg_probabilities,
        band_stats: BandStats::from_averages(
            band_mean(Band::Alpha),
            band_mean(Band::Beta),
            band_mean(Band::Theta),
        ),
    })
}
