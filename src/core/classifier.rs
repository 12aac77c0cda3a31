//! Classification of synthesized feature vectors.
//!
//! The trained model is opaque to the pipeline: it is reached only through
//! the two-method [`Classifier`] capability. [`ClassificationAdapter`] sits
//! in front of it, validates the input width, and turns the model's native
//! label/probability output into a [`ClassificationResult`] whose invariants
//! (probabilities sum to 1, label is the argmax) are checked, not assumed.

use crate::core::error::PipelineError;
use crate::core::features::FEATURE_COUNT;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Allowed deviation of a probability sum from 1.0.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Slack when checking that the reported label is the argmax.
const ARGMAX_TOLERANCE: f64 = 1e-9;

/// Emotional state predicted by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmotionLabel {
    Focus,
    Relax,
    Fatigue,
}

impl EmotionLabel {
    /// Canonical order, used for iteration and final tie-breaks.
    pub const ALL: [EmotionLabel; 3] = [EmotionLabel::Focus, EmotionLabel::Relax, EmotionLabel::Fatigue];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmotionLabel::Focus => "focus",
            EmotionLabel::Relax => "relax",
            EmotionLabel::Fatigue => "fatigue",
        }
    }

    /// Parse a classifier label, ignoring case and surrounding whitespace.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "focus" => Some(EmotionLabel::Focus),
            "relax" => Some(EmotionLabel::Relax),
            "fatigue" => Some(EmotionLabel::Fatigue),
            _ => None,
        }
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One probability per known label.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelProbabilities {
    pub focus: f64,
    pub relax: f64,
    pub fatigue: f64,
}

impl LabelProbabilities {
    pub fn new(focus: f64, relax: f64, fatigue: f64) -> Self {
        Self {
            focus,
            relax,
            fatigue,
        }
    }

    pub fn get(&self, label: EmotionLabel) -> f64 {
        match label {
            EmotionLabel::Focus => self.focus,
            EmotionLabel::Relax => self.relax,
            EmotionLabel::Fatigue => self.fatigue,
        }
    }

    pub fn set(&mut self, label: EmotionLabel, value: f64) {
        match label {
            EmotionLabel::Focus => self.focus = value,
            EmotionLabel::Relax => self.relax = value,
            EmotionLabel::Fatigue => self.fatigue = value,
        }
    }

    /// Pairs in canonical label order.
    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, f64)> + '_ {
        EmotionLabel::ALL.into_iter().map(move |l| (l, self.get(l)))
    }

    pub fn sum(&self) -> f64 {
        self.focus + self.relax + self.fatigue
    }

    pub fn max(&self) -> f64 {
        self.focus.max(self.relax).max(self.fatigue)
    }

    /// Label with the highest probability; exact ties go to the earlier canonical label.
    pub fn argmax(&self) -> EmotionLabel {
        let mut best = EmotionLabel::Focus;
        for label in EmotionLabel::ALL {
            if self.get(label) > self.get(best) {
                best = label;
            }
        }
        best
    }
}

/// Canonical per-sample classification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub label: EmotionLabel,
    pub probabilities: LabelProbabilities,
}

impl ClassificationResult {
    /// Probability of the winning label.
    pub fn confidence(&self) -> f64 {
        self.probabilities.max()
    }
}

/// Native output of a classifier, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPrediction {
    pub label: String,
    pub probabilities: Vec<(String, f64)>,
}

/// Errors raised by a concrete classifier.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("could not read model: {0}")]
    Io(String),
    #[error("could not parse model: {0}")]
    Parse(String),
    #[error("{what}: expected {expected} values, got {actual}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("invalid model: {0}")]
    Invalid(String),
}

/// A pre-trained classifier over 17 features.
pub trait Classifier {
    /// Apply the model's feature scaling.
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, ModelError>;

    /// Predict a label and per-class probabilities from scaled features.
    fn predict(&self, scaled: &[f64]) -> Result<RawPrediction, ModelError>;
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        (**self).scale(features)
    }

    fn predict(&self, scaled: &[f64]) -> Result<RawPrediction, ModelError> {
        (**self).predict(scaled)
    }
}

/// Validating front of a [`Classifier`].
pub struct ClassificationAdapter<C> {
    classifier: C,
}

impl<C: Classifier> ClassificationAdapter<C> {
    pub fn new(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    /// Scale, predict and normalize one feature vector.
    pub fn classify(&self, features: &[f64]) -> Result<ClassificationResult, PipelineError> {
        if features.len() != FEATURE_COUNT {
            return Err(PipelineError::InvalidFeatureCount {
                expected: FEATURE_COUNT,
                actual: features.len(),
            });
        }

        let scaled = self.classifier.scale(features)?;
        if scaled.len() != FEATURE_COUNT {
            return Err(PipelineError::ClassifierContractViolation(format!(
                "scaler returned {} features, expected {FEATURE_COUNT}",
                scaled.len()
            )));
        }

        let raw = self.classifier.predict(&scaled)?;
        normalize(raw)
    }
}

/// Convert a native prediction into a checked [`ClassificationResult`].
pub fn normalize(raw: RawPrediction) -> Result<ClassificationResult, PipelineError> {
    let violation = PipelineError::ClassifierContractViolation;

    let label = EmotionLabel::parse(&raw.label)
        .ok_or_else(|| violation(format!("unknown label '{}'", raw.label)))?;

    let mut probabilities = LabelProbabilities::default();
    let mut seen = Vec::with_capacity(EmotionLabel::ALL.len());
    for (name, p) in raw.probabilities {
        let class = EmotionLabel::parse(&name)
            .ok_or_else(|| violation(format!("unknown class '{name}' in probabilities")))?;
        if seen.contains(&class) {
            return Err(violation(format!("class '{class}' reported twice")));
        }
        if !p.is_finite() || p < 0.0 {
            return Err(violation(format!("invalid probability {p} for '{class}'")));
        }
        seen.push(class);
        probabilities.set(class, p);
    }

    let sum = probabilities.sum();
    if (sum - 1.0).abs() > PROBABILITY_TOLERANCE {
        return Err(violation(format!("probabilities sum to {sum}")));
    }

    if probabilities.get(label) + ARGMAX_TOLERANCE < probabilities.max() {
        return Err(violation(format!(
            "label '{label}' is not the most probable class"
        )));
    }

    Ok(ClassificationResult {
        label,
        probabilities,
    })
}

/// Min-max feature scaler: `(x - min) / (max - min) * (hi - lo) + lo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub data_min: Vec<f64>,
    pub data_max: Vec<f64>,
    #[serde(default = "default_feature_range")]
    pub feature_range: (f64, f64),
}

fn default_feature_range() -> (f64, f64) {
    (0.0, 1.0)
}

impl MinMaxScaler {
    /// A scaler that leaves values unchanged.
    pub fn identity(width: usize) -> Self {
        Self {
            data_min: vec![0.0; width],
            data_max: vec![1.0; width],
            feature_range: default_feature_range(),
        }
    }

    pub fn transform(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        if features.len() != self.data_min.len() {
            return Err(ModelError::Dimension {
                what: "scaler input",
                expected: self.data_min.len(),
                actual: features.len(),
            });
        }

        let (lo, hi) = self.feature_range;
        Ok(features
            .iter()
            .zip(self.data_min.iter().zip(&self.data_max))
            .map(|(&x, (&min, &max))| {
                // Constant training features have no range; treat it as 1.
                let range = if max - min == 0.0 { 1.0 } else { max - min };
                (x - min) / range * (hi - lo) + lo
            })
            .collect())
    }
}

/// Multinomial logistic model with a min-max scaler, loadable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearSoftmaxModel {
    pub classes: Vec<String>,
    pub scaler: MinMaxScaler,
    pub coefficients: Vec<Vec<f64>>,
    pub intercepts: Vec<f64>,
}

impl LinearSoftmaxModel {
    /// Load a model from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ModelError::Io(format!("{path:?}: {e}")))?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let model: Self = serde_json::from_str(json).map_err(|e| ModelError::Parse(e.to_string()))?;
        model.validate()?;
        Ok(model)
    }

    /// Built-in model for running without a trained one.
    ///
    /// Encodes the usual band reading: high beta with low theta is focus,
    /// high alpha with low beta is relax, high theta is fatigue.
    pub fn baseline() -> Self {
        let row = |weights: &[(usize, f64)]| {
            let mut row = vec![0.0; FEATURE_COUNT];
            for &(index, weight) in weights {
                row[index] = weight;
            }
            row
        };

        Self {
            classes: EmotionLabel::ALL.iter().map(|l| l.to_string()).collect(),
            scaler: MinMaxScaler::identity(FEATURE_COUNT),
            coefficients: vec![
                // focus: main discriminator and attention ratio
                row(&[(12, 4.0), (14, 0.5)]),
                // relax: alpha/beta ratio
                row(&[(5, 2.0)]),
                // fatigue: theta/alpha ratio and theta amplitude
                row(&[(9, 3.0), (2, 0.05)]),
            ],
            intercepts: vec![0.0; 3],
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.classes.is_empty() {
            return Err(ModelError::Invalid("model has no classes".to_string()));
        }
        if self.coefficients.len() != self.classes.len() {
            return Err(ModelError::Dimension {
                what: "coefficient rows",
                expected: self.classes.len(),
                actual: self.coefficients.len(),
            });
        }
        if self.intercepts.len() != self.classes.len() {
            return Err(ModelError::Dimension {
                what: "intercepts",
                expected: self.classes.len(),
                actual: self.intercepts.len(),
            });
        }
        if let Some(row) = self.coefficients.iter().find(|r| r.len() != FEATURE_COUNT) {
            return Err(ModelError::Dimension {
                what: "coefficient row",
                expected: FEATURE_COUNT,
                actual: row.len(),
            });
        }
        if self.scaler.data_min.len() != FEATURE_COUNT || self.scaler.data_max.len() != FEATURE_COUNT {
            return Err(ModelError::Dimension {
                what: "scaler bounds",
                expected: FEATURE_COUNT,
                actual: self.scaler.data_min.len().min(self.scaler.data_max.len()),
            });
        }
        let (lo, hi) = self.scaler.feature_range;
        if lo >= hi {
            return Err(ModelError::Invalid(format!(
                "feature range ({lo}, {hi}) is empty"
            )));
        }
        Ok(())
    }
}

impl Classifier for LinearSoftmaxModel {
    // Fields are public, so a hand-built model may never have been validated.
    fn scale(&self, features: &[f64]) -> Result<Vec<f64>, ModelError> {
        self.validate()?;
        self.scaler.transform(features)
    }

    fn predict(&self, scaled: &[f64]) -> Result<RawPrediction, ModelError> {
        self.validate()?;
        if scaled.len() != FEATURE_COUNT {
            return Err(ModelError::Dimension {
                what: "model input",
                expected: FEATURE_COUNT,
                actual: scaled.len(),
            });
        }

        let logits: Vec<f64> = self
            .coefficients
            .iter()
            .zip(&self.intercepts)
            .map(|(row, b)| row.iter().zip(scaled).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect();

        let peak = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = logits.iter().map(|z| (z - peak).exp()).collect();
        let total: f64 = exps.iter().sum();

        let mut best = 0;
        for (i, e) in exps.iter().enumerate() {
            if *e > exps[best] {
                best = i;
            }
        }

        Ok(RawPrediction {
            label: self.classes[best].clone(),
            probabilities: self
                .classes
                .iter()
                .cloned()
                .zip(exps.iter().map(|e| e / total))
                .collect(),
        })
    }
}
