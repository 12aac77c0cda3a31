//! Per-batch pipeline: synthesize, classify, aggregate, track, recommend.

use crate::acquisition::types::RawSample;
use crate::core::aggregate::{aggregate, BatchAnalysis};
use crate::core::classifier::{ClassificationAdapter, Classifier};
use crate::core::error::PipelineError;
use crate::core::features::synthesize;
use crate::core::recommend::{Recommendation, RecommendationEngine};
use crate::core::trend::TrendTracker;
use serde::{Deserialize, Serialize};

/// Batch verdict together with its guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub analysis: BatchAnalysis,
    pub recommendations: Vec<Recommendation>,
}

/// The inference-and-aggregation pipeline for consecutive batches.
pub struct BatchPipeline<C> {
    adapter: ClassificationAdapter<C>,
    tracker: TrendTracker,
    engine: RecommendationEngine,
}

impl<C: Classifier> BatchPipeline<C> {
    pub fn new(classifier: C, tracker: TrendTracker, engine: RecommendationEngine) -> Self {
        Self {
            adapter: ClassificationAdapter::new(classifier),
            tracker,
            engine,
        }
    }

    pub fn with_defaults(classifier: C) -> Self {
        Self::new(classifier, TrendTracker::default(), RecommendationEngine::default())
    }

    /// Analyze one batch.
    ///
    /// Trend state advances only when every step succeeds, so a failed batch
    /// leaves the next comparison against the last good one.
    pub fn analyze(&mut self, samples: &[RawSample]) -> Result<Assessment, PipelineError> {
        let classified = samples
            .iter()
            .map(|sample| {
                let features = synthesize(sample.alpha, sample.beta, sample.theta);
                self.adapter
                    .classify(features.as_slice())
                    .map(|result| (*sample, result))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let analysis = self.tracker.update_trends(aggregate(&classified)?);
        let recommendations = self.engine.recommend(
            analysis.dominant_label,
            analysis.avg_confidence,
            &analysis.band_stats,
        );

        Ok(Assessment {
            analysis,
            recommendations,
        })
    }

    pub fn tracker(&self) -> &TrendTracker {
        &self.tracker
    }

    pub fn adapter(&self) -> &ClassificationAdapter<C> {
        &self.adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::Trend;
    use crate::core::classifier::{EmotionLabel, LinearSoftmaxModel, ModelError, RawPrediction};

    struct BrokenClassifier;

    impl Classifier for BrokenClassifier {
        fn scale(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
            Ok(features.to_vec())
        }

        fn predict(&self, _scaled: &[f64]) -> Result<RawPrediction, ModelError> {
            Ok(RawPrediction {
                label: "focus".to_string(),
                probabilities: vec![("focus".to_string(), 2.0)],
            })
        }
    }

    fn batch(alpha: f64, beta: f64, theta: f64) -> Vec<RawSample> {
        (0..10).map(|_| RawSample::now(alpha, beta, theta)).collect()
    }

    #[test]
    fn test_focused_batch() {
        let mut pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
        let assessment = pipeline.analyze(&batch(0.30, 0.48, 0.22)).unwrap();

        assert_eq!(assessment.analysis.dominant_label, EmotionLabel::Focus);
        assert_eq!(assessment.analysis.consistency, 1.0);
        assert_eq!(assessment.recommendations, vec![Recommendation::MaintainFocus]);
    }

    #[test]
    fn test_empty_batch_leaves_tracker_untouched() {
        let mut pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
        pipeline.analyze(&batch(0.30, 0.48, 0.22)).unwrap();

        assert!(matches!(pipeline.analyze(&[]), Err(PipelineError::EmptyBatch)));
        assert_eq!(pipeline.tracker().previous(), Some([0.30, 0.48, 0.22]));
    }

    #[test]
    fn test_trends_follow_successive_batches() {
        let mut pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
        pipeline.analyze(&batch(0.30, 0.48, 0.22)).unwrap();
        let second = pipeline.analyze(&batch(0.30, 0.40, 0.22)).unwrap();

        assert_eq!(second.analysis.band_stats.alpha.trend, Trend::Stable);
        assert_eq!(second.analysis.band_stats.beta.trend, Trend::Decreasing);
    }

    #[test]
    fn test_contract_violation_propagates() {
        let mut pipeline = BatchPipeline::with_defaults(BrokenClassifier);
        let err = pipeline.analyze(&batch(0.3, 0.3, 0.3)).unwrap_err();

        assert!(err.is_dependency_error());
        assert_eq!(pipeline.tracker().previous(), None);
    }
}
