//! Band trend tracking across consecutive batches.

use crate::acquisition::types::Band;
use crate::core::aggregate::{BatchAnalysis, Trend};

/// Minimum change in a band average that counts as a trend.
///
/// A fixed calibration constant, not derived from the data scale.
pub const TREND_SENSITIVITY: f64 = 0.01;

/// Remembers the previous batch's band averages.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    sensitivity: f64,
    previous: Option<[f64; 3]>,
}

impl TrendTracker {
    pub fn new(sensitivity: f64) -> Self {
        Self {
            sensitivity,
            previous: None,
        }
    }

    /// Classify a single change.
    pub fn classify(&self, previous: f64, current: f64) -> Trend {
        if (current - previous).abs() < self.sensitivity {
            Trend::Stable
        } else if current > previous {
            Trend::Increasing
        } else {
            Trend::Decreasing
        }
    }

    /// Fill in the trends of `batch` and remember its averages.
    ///
    /// The first batch of a session keeps every trend `Stable`. Callers must
    /// only pass batches that were analyzed successfully.
    pub fn update_trends(&mut self, mut batch: BatchAnalysis) -> BatchAnalysis {
        let current = batch.band_stats.averages();

        if let Some(previous) = self.previous {
            for (i, band) in Band::ALL.into_iter().enumerate() {
                batch.band_stats.get_mut(band).trend = self.classify(previous[i], current[i]);
            }
        }

        self.previous = Some(current);
        batch
    }

    /// Averages of the last tracked batch, if any.
    pub fn previous(&self) -> Option<[f64; 3]> {
        self.previous
    }

    /// Forget the previous batch (new session).
    pub fn reset(&mut self) {
        self.previous = None;
    }
}

impl Default for TrendTracker {
    fn default() -> Self {
        Self::new(TREND_SENSITIVITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::BandStats;
    use crate::core::classifier::{EmotionLabel, LabelProbabilities};
    use chrono::Utc;

    fn batch(alpha: f64, beta: f64, theta: f64) -> BatchAnalysis {
        BatchAnalysis {
            timestamp: Utc::now(),
            batch_size: 10,
            dominant_label: EmotionLabel::Relax,
            dominant_count: 10,
            consistency: 1.0,
            avg_confidence: 0.6,
            avg_probabilities: LabelProbabilities::new(0.2, 0.6, 0.2),
            band_stats: BandStats::from_averages(alpha, beta, theta),
        }
    }

    #[test]
    fn test_first_batch_is_stable() {
        let mut tracker = TrendTracker::default();
        let out = tracker.update_trends(batch(0.3, 0.5, 0.2));

        assert_eq!(out.band_stats.alpha.trend, Trend::Stable);
        assert_eq!(out.band_stats.beta.trend, Trend::Stable);
        assert_eq!(out.band_stats.theta.trend, Trend::Stable);
        assert_eq!(tracker.previous(), Some([0.3, 0.5, 0.2]));
    }

    #[test]
    fn test_identical_batches_are_stable() {
        let mut tracker = TrendTracker::default();
        tracker.update_trends(batch(0.3, 0.5, 0.2));
        let out = tracker.update_trends(batch(0.3, 0.5, 0.2));

        assert_eq!(out.band_stats.alpha.trend, Trend::Stable);
        assert_eq!(out.band_stats.beta.trend, Trend::Stable);
        assert_eq!(out.band_stats.theta.trend, Trend::Stable);
    }

    #[test]
    fn test_directions() {
        let mut tracker = TrendTracker::default();
        tracker.update_trends(batch(0.30, 0.50, 0.20));
        let out = tracker.update_trends(batch(0.35, 0.45, 0.205));

        assert_eq!(out.band_stats.alpha.trend, Trend::Increasing);
        assert_eq!(out.band_stats.beta.trend, Trend::Decreasing);
        assert_eq!(out.band_stats.theta.trend, Trend::Stable);
    }

    #[test]
    fn test_compares_with_immediately_preceding_batch() {
        let mut tracker = TrendTracker::default();
        tracker.update_trends(batch(0.30, 0.50, 0.20));
        tracker.update_trends(batch(0.40, 0.50, 0.20));
        let out = tracker.update_trends(batch(0.35, 0.50, 0.20));

        assert_eq!(out.band_stats.alpha.trend, Trend::Decreasing);
    }

    #[test]
    fn test_reset_forgets_previous() {
        let mut tracker = TrendTracker::default();
        tracker.update_trends(batch(0.30, 0.50, 0.20));
        tracker.reset();
        let out = tracker.update_trends(batch(0.60, 0.10, 0.50));

        assert_eq!(out.band_stats.alpha.trend, Trend::Stable);
    }
}
