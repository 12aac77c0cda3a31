//! Simulated headband for running the monitor without hardware.
//!
//! Band powers follow slow sinusoidal drift around a profile's baseline, so
//! successive batches show real trends. Output is fully deterministic for a
//! given profile and start time.

use crate::acquisition::types::RawSample;
use crate::acquisition::{AcquisitionError, AcquisitionSource, FetchOutcome};
use chrono::{DateTime, Duration, Utc};

/// Spacing between simulated samples (~28 Hz, as the bridge streams).
const SAMPLE_PERIOD_MS: i64 = 36;

/// Baseline band levels the simulation drifts around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulationProfile {
    /// Beta-dominant, low theta
    Focused,
    /// Alpha-dominant
    Relaxed,
    /// Theta creeping up, beta falling
    Drowsy,
}

impl SimulationProfile {
    fn baseline(&self) -> (f64, f64, f64) {
        match self {
            SimulationProfile::Focused => (0.30, 0.48, 0.22),
            SimulationProfile::Relaxed => (0.52, 0.28, 0.20),
            SimulationProfile::Drowsy => (0.38, 0.32, 0.30),
        }
    }

    /// Parse a profile name; unknown names fall back to `Drowsy`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "focus" | "focused" => SimulationProfile::Focused,
            "relax" | "relaxed" => SimulationProfile::Relaxed,
            _ => SimulationProfile::Drowsy,
        }
    }
}

/// A deterministic stand-in for the headband bridge.
pub struct SimulatedSource {
    profile: SimulationProfile,
    batch_size: usize,
    warmup_fetches: u32,
    fetches: u32,
    samples_emitted: u64,
    start: DateTime<Utc>,
}

impl SimulatedSource {
    /// Create a source emitting `batch_size` samples per fetch.
    pub fn new(profile: SimulationProfile, batch_size: usize) -> Self {
        Self {
            profile,
            batch_size: batch_size.max(1),
            warmup_fetches: 0,
            fetches: 0,
            samples_emitted: 0,
            start: Utc::now(),
        }
    }

    /// Report `NotReady` for the first `fetches` polls, as a calibrating device does.
    pub fn with_warmup(mut self, fetches: u32) -> Self {
        self.warmup_fetches = fetches;
        self
    }

    /// Pin the timestamp of the first sample.
    pub fn with_start(mut self, start: DateTime<Utc>) -> Self {
        self.start = start;
        self
    }

    fn sample_at(&self, n: u64) -> RawSample {
        let (alpha0, beta0, theta0) = self.profile.baseline();
        let t = n as f64;

        // Slow drift with distinct periods per band, plus a faster ripple.
        let alpha = alpha0 + 0.04 * (t / 90.0).sin() + 0.004 * (t / 3.0).sin();
        let beta = beta0 - 0.05 * (t / 70.0).sin() + 0.004 * (t / 4.0).cos();
        let theta = theta0 + 0.05 * (t / 60.0).sin() + 0.003 * (t / 5.0).sin();

        RawSample::new(
            self.start + Duration::milliseconds(n as i64 * SAMPLE_PERIOD_MS),
            alpha.max(0.0),
            beta.max(0.0),
            theta.max(0.0),
        )
    }
}

impl AcquisitionSource for SimulatedSource {
    fn fetch_batch(&mut self) -> Result<FetchOutcome, AcquisitionError> {
        self.fetches += 1;
        if self.fetches <= self.warmup_fetches {
            return Ok(FetchOutcome::NotReady(format!(
                "calibrating ({}/{})",
                self.fetches, self.warmup_fetches
            )));
        }

        let first = self.samples_emitted;
        let batch = (first..first + self.batch_size as u64)
            .map(|n| self.sample_at(n))
            .collect();
        self.samples_emitted += self.batch_size as u64;

        Ok(FetchOutcome::Batch(batch))
    }

    fn describe(&self) -> String {
        format!(
            "simulated headband ({:?}, {} samples/batch)",
            self.profile, self.batch_size
        )
    }
}
