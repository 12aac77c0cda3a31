//! Rule-based guidance from an aggregated batch.
//!
//! Rules are evaluated in a fixed order, one category per dominant state.
//! Nothing here learns; identical inputs always give identical guidance.

use crate::core::aggregate::BandStats;
use crate::core::classifier::EmotionLabel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean confidence above which fatigue is treated as high.
pub const HIGH_CONFIDENCE_CUTOFF: f64 = 0.5;

/// Theta average above which a relaxed state is read as drowsy.
pub const DROWSY_THETA_CUTOFF: f64 = 0.35;

/// A guidance tag with its advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    HighFatigue,
    ModerateFatigue,
    MaintainFocus,
    RelaxedDrowsy,
    CalmAlert,
}

impl Recommendation {
    pub fn tag(&self) -> &'static str {
        match self {
            Recommendation::HighFatigue => "high-fatigue: stop and rest",
            Recommendation::ModerateFatigue => "moderate-fatigue: light movement",
            Recommendation::MaintainFocus => "maintain task, stay hydrated",
            Recommendation::RelaxedDrowsy => "relaxed-but-drowsy: light activity",
            Recommendation::CalmAlert => "calm-and-alert: good for focused work",
        }
    }

    /// Concrete actions to show under the tag.
    pub fn advice(&self) -> &'static [&'static str] {
        match self {
            Recommendation::HighFatigue => &[
                "Stop current tasks and take a break",
                "Consider a 15-20 minute power nap",
                "Hydrate and get fresh air",
            ],
            Recommendation::ModerateFatigue => &[
                "Light stretching or movement",
                "Stay hydrated",
                "Monitor your state",
            ],
            Recommendation::MaintainFocus => &[
                "Continue with cognitive tasks",
                "Maintain current environment",
                "Stay hydrated",
            ],
            Recommendation::RelaxedDrowsy => &[
                "Light activity to maintain alertness",
                "Consider if rest is needed",
            ],
            Recommendation::CalmAlert => &[
                "Good state for learning or creativity",
                "Maintain current conditions",
            ],
        }
    }

    /// Whether the tag concerns fatigue.
    pub fn is_fatigue(&self) -> bool {
        matches!(
            self,
            Recommendation::HighFatigue | Recommendation::ModerateFatigue
        )
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Rule table with its calibration cutoffs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecommendationEngine {
    pub high_confidence: f64,
    pub drowsy_theta: f64,
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self {
            high_confidence: HIGH_CONFIDENCE_CUTOFF,
            drowsy_theta: DROWSY_THETA_CUTOFF,
        }
    }
}

impl RecommendationEngine {
    pub fn recommend(
        &self,
        dominant: EmotionLabel,
        avg_confidence: f64,
        band_stats: &BandStats,
    ) -> Vec<Recommendation> {
        let mut out = Vec::new();

        match dominant {
            EmotionLabel::Fatigue if avg_confidence > self.high_confidence => {
                out.push(Recommendation::HighFatigue)
            }
            EmotionLabel::Fatigue => out.push(Recommendation::ModerateFatigue),
            EmotionLabel::Focus => out.push(Recommendation::MaintainFocus),
            EmotionLabel::Relax if band_stats.theta.avg > self.drowsy_theta => {
                out.push(Recommendation::RelaxedDrowsy)
            }
            EmotionLabel::Relax => out.push(Recommendation::CalmAlert),
        }

        out
    }
}

/// Recommend with the default cutoffs.
pub fn recommend(
    dominant: EmotionLabel,
    avg_confidence: f64,
    band_stats: &BandStats,
) -> Vec<Recommendation> {
    RecommendationEngine::default().recommend(dominant, avg_confidence, band_stats)
}
