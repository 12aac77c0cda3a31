//! Band-power sample types produced by the acquisition layer.
//!
//! A sample carries only the three relative band powers the classifier
//! pipeline consumes. Raw electrode voltages never reach this crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One EEG frequency band tracked by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    /// 8-12 Hz, associated with relaxation
    Alpha,
    /// 13-30 Hz, associated with focus and attention
    Beta,
    /// 4-8 Hz, associated with drowsiness
    Theta,
}

impl Band {
    /// All bands in display order.
    pub const ALL: [Band; 3] = [Band::Alpha, Band::Beta, Band::Theta];

    pub fn name(&self) -> &'static str {
        match self {
            Band::Alpha => "alpha",
            Band::Beta => "beta",
            Band::Theta => "theta",
        }
    }

    /// What the band is usually read as.
    pub fn meaning(&self) -> &'static str {
        match self {
            Band::Alpha => "Relaxation",
            Band::Beta => "Focus",
            Band::Theta => "Drowsiness",
        }
    }
}

/// A timestamped band-power reading.
///
/// Values are relative power ratios, typically in [0, 1]. Nothing downstream
/// requires them to be bounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// When the bridge produced the reading
    #[serde(with = "timestamp_serde")]
    pub timestamp: DateTime<Utc>,
    pub alpha: f64,
    pub beta: f64,
    pub theta: f64,
}

impl RawSample {
    pub fn new(timestamp: DateTime<Utc>, alpha: f64, beta: f64, theta: f64) -> Self {
        Self {
            timestamp,
            alpha,
            beta,
            theta,
        }
    }

    /// Create a sample stamped with the current time.
    pub fn now(alpha: f64, beta: f64, theta: f64) -> Self {
        Self::new(Utc::now(), alpha, beta, theta)
    }

    /// Read a single band.
    pub fn band(&self, band: Band) -> f64 {
        match band {
            Band::Alpha => self.alpha,
            Band::Beta => self.beta,
            Band::Theta => self.theta,
        }
    }
}

/// Serde support for bridge timestamps.
///
/// The headband bridge emits naive ISO-8601 strings
/// (`2025-05-31T11:03:37.450414`); those are read as UTC. RFC 3339 strings
/// with an offset are accepted as well. Output is always RFC 3339.
pub mod timestamp_serde {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(timestamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&timestamp.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(de::Error::custom)
    }

    /// Parse an RFC 3339 or naive ISO-8601 timestamp.
    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Ok(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{raw}': {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_band_lookup() {
        let sample = RawSample::now(0.4, 0.3, 0.2);
        assert_eq!(sample.band(Band::Alpha), 0.4);
        assert_eq!(sample.band(Band::Beta), 0.3);
        assert_eq!(sample.band(Band::Theta), 0.2);
    }

    #[test]
    fn test_naive_bridge_timestamp() {
        let json = r#"{"alpha":0.38,"beta":0.33,"theta":0.29,"timestamp":"2025-05-31T11:03:37.450414"}"#;
        let sample: RawSample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.timestamp.hour(), 11);
        assert_eq!(sample.timestamp.nanosecond(), 450_414_000);
    }

    #[test]
    fn test_rfc3339_timestamp_with_offset() {
        let ts = timestamp_serde::parse("2025-05-31T13:03:37+02:00").unwrap();
        assert_eq!(ts.hour(), 11);
    }

    #[test]
    fn test_invalid_timestamp_rejected() {
        assert!(timestamp_serde::parse("yesterday").is_err());
    }
}
