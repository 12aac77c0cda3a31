//! Inference and aggregation core.
//!
//! This module contains:
//! - Feature synthesis from three band powers to 17 model features
//! - The classifier capability and its validating adapter
//! - Batch aggregation, trend tracking and recommendations
//! - Descriptive band insights for one-off analysis

pub mod aggregate;
pub mod classifier;
pub mod error;
pub mod features;
pub mod insights;
pub mod pipeline;
pub mod recommend;
pub mod trend;

// Re-export commonly used types
pub use aggregate::{aggregate, BandStat, BandStats, BatchAnalysis, Trend};
pub use classifier::{
    ClassificationAdapter, ClassificationResult, Classifier, EmotionLabel, LabelProbabilities,
    LinearSoftmaxModel, ModelError, RawPrediction,
};
pub use error::PipelineError;
pub use features::{synthesize, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
pub use insights::BandInsights;
pub use pipeline::{Assessment, BatchPipeline};
pub use recommend::{
    recommend, Recommendation, RecommendationEngine, DROWSY_THETA_CUTOFF, HIGH_CONFIDENCE_CUTOFF,
};
pub use trend::{TrendTracker, TREND_SENSITIVITY};
