//! Error taxonomy of the inference-and-aggregation pipeline.

use crate::core::classifier::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Caller handed the classifier a vector of the wrong width.
    #[error("invalid feature count: expected {expected}, got {actual}")]
    InvalidFeatureCount { expected: usize, actual: usize },

    /// Aggregation needs at least one classified sample.
    #[error("cannot aggregate an empty batch")]
    EmptyBatch,

    /// The classifier returned something that breaks the result invariants.
    #[error("classifier contract violation: {0}")]
    ClassifierContractViolation(String),

    /// The classifier itself failed.
    #[error("classifier failed: {0}")]
    Model(#[from] ModelError),
}

impl PipelineError {
    /// Whether the failure originated outside the crate (classifier misbehaving).
    pub fn is_dependency_error(&self) -> bool {
        matches!(
            self,
            PipelineError::ClassifierContractViolation(_) | PipelineError::Model(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PipelineError::InvalidFeatureCount {
            expected: 17,
            actual: 3,
        };
        assert_eq!(err.to_string(), "invalid feature count: expected 17, got 3");
        assert!(!err.is_dependency_error());
        assert!(PipelineError::ClassifierContractViolation("x".into()).is_dependency_error());
    }
}
