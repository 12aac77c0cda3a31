//! Configuration for the EEG state monitor.

use crate::core::recommend::{RecommendationEngine, DROWSY_THETA_CUTOFF, HIGH_CONFIDENCE_CUTOFF};
use crate::core::trend::{TrendTracker, TREND_SENSITIVITY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Main configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Delay between polls of the acquisition source
    #[serde(with = "duration_serde")]
    pub poll_interval: Duration,

    /// Samples expected per poll (informational)
    pub expected_batch_size: usize,

    /// Where band powers come from
    pub source: SourceKind,

    /// Bridge data endpoint for the `http` source
    pub api_url: String,

    /// Per-request timeout for the `http` source
    #[serde(with = "duration_serde")]
    pub fetch_timeout: Duration,

    /// JSON model file; the built-in baseline model is used when unset
    pub model_path: Option<PathBuf>,

    /// Calibration cutoffs
    pub thresholds: Thresholds,

    /// Path for session dumps
    pub export_path: PathBuf,

    /// Path for cumulative stats
    pub data_path: PathBuf,

    /// Port of the live view server
    pub server_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eeg-state-monitor");

        Self {
            poll_interval: Duration::from_secs(5),
            expected_batch_size: 10,
            source: SourceKind::Simulated,
            api_url: "http://127.0.0.1:5000/api/data".to_string(),
            fetch_timeout: Duration::from_secs(10),
            model_path: None,
            thresholds: Thresholds::default(),
            export_path: data_dir.join("sessions"),
            data_path: data_dir,
            server_port: 5001,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::Io(e.to_string()))?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration JSON; missing fields take their defaults.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let config_path = Self::config_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration as pretty JSON, creating parent directories.
    pub fn save_to(&self, config_path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Io(e.to_string()))?;
        }

        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        std::fs::write(config_path, content).map_err(|e| ConfigError::Io(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("eeg-state-monitor")
            .join("config.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.export_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        std::fs::create_dir_all(&self.data_path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Ok(())
    }

    /// Path of the cumulative stats file.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("monitor_stats.json")
    }
}

/// Acquisition source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Simulated,
    Http,
}

impl SourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "sim" => Some(SourceKind::Simulated),
            "http" | "api" => Some(SourceKind::Http),
            _ => None,
        }
    }
}

/// Calibration cutoffs of the trend tracker and recommendation rules.
///
/// These are fixed design constants; override only with domain input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Minimum band-average change counted as a trend
    pub trend_sensitivity: f64,
    /// Theta average above which relaxation reads as drowsiness
    pub drowsy_theta: f64,
    /// Mean confidence above which fatigue is high
    pub high_confidence: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            trend_sensitivity: TREND_SENSITIVITY,
            drowsy_theta: DROWSY_THETA_CUTOFF,
            high_confidence: HIGH_CONFIDENCE_CUTOFF,
        }
    }
}

impl Thresholds {
    pub fn tracker(&self) -> TrendTracker {
        TrendTracker::new(self.trend_sensitivity)
    }

    pub fn engine(&self) -> RecommendationEngine {
        RecommendationEngine {
            high_confidence: self.high_confidence,
            drowsy_theta: self.drowsy_theta,
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Serialize error: {0}")]
    Serialize(String),
}

/// Serde support for Duration.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.expected_batch_size, 10);
        assert_eq!(config.source, SourceKind::Simulated);
        assert!(config.model_path.is_none());
        assert_eq!(config.thresholds.trend_sensitivity, 0.01);
        assert_eq!(config.thresholds.drowsy_theta, 0.35);
        assert_eq!(config.thresholds.high_confidence, 0.5);
    }

    #[test]
    fn test_source_kind_parsing() {
        assert_eq!(SourceKind::parse("HTTP"), Some(SourceKind::Http));
        assert_eq!(SourceKind::parse("sim"), Some(SourceKind::Simulated));
        assert_eq!(SourceKind::parse("serial"), None);
    }

    #[test]
    fn test_round_trip_and_partial_thresholds() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed = Config::from_json(&json).unwrap();
        assert_eq!(parsed.poll_interval, config.poll_interval);
        assert_eq!(parsed.thresholds, config.thresholds);

        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        value["thresholds"] = serde_json::json!({ "drowsy_theta": 0.4 });
        let parsed = Config::from_json(&value.to_string()).unwrap();
        assert_eq!(parsed.thresholds.drowsy_theta, 0.4);
        assert_eq!(parsed.thresholds.trend_sensitivity, 0.01);
    }

    #[test]
    fn test_thresholds_build_components() {
        let thresholds = Thresholds {
            trend_sensitivity: 0.05,
            drowsy_theta: 0.3,
            high_confidence: 0.7,
        };
        let engine = thresholds.engine();
        assert_eq!(engine.drowsy_theta, 0.3);
        assert_eq!(engine.high_confidence, 0.7);
        assert!(thresholds.tracker().previous().is_none());
    }

    #[test]
    fn test_save_to_writes_loadable_file() {
        let dir = std::env::temp_dir().join(format!("eeg-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("config.json");

        let mut config = Config::default();
        config.server_port = 6001;
        config.thresholds.drowsy_theta = 0.4;
        config.save_to(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let loaded = Config::from_json(&content).unwrap();
        assert_eq!(loaded.server_port, 6001);
        assert_eq!(loaded.thresholds.drowsy_theta, 0.4);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
