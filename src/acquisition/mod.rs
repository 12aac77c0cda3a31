//! Band-power acquisition for the monitor.
//!
//! The hardware bridge (device pairing, calibration, artifact rejection)
//! runs outside this crate. The monitor only sees it through
//! [`AcquisitionSource`], a polled "fetch the latest batch" capability.

pub mod simulated;
pub mod types;

#[cfg(feature = "http-source")]
pub mod http;

// Re-export commonly used types
pub use simulated::{SimulatedSource, SimulationProfile};
pub use types::{Band, RawSample};

#[cfg(feature = "http-source")]
pub use http::{HttpSource, HttpSourceConfig};

use thiserror::Error;

/// Result of a single poll of the acquisition layer.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// A batch of consecutive samples, oldest first
    Batch(Vec<RawSample>),
    /// The device is not producing data yet (pairing, calibrating, warming up)
    NotReady(String),
}

/// Errors reported by an acquisition source.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed payload: {0}")]
    Decode(String),
    #[error("device error: {0}")]
    Device(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// A polled source of band-power batches.
pub trait AcquisitionSource {
    /// Fetch the latest batch. May block up to the source's own timeout.
    fn fetch_batch(&mut self) -> Result<FetchOutcome, AcquisitionError>;

    /// Human-readable description for startup output.
    fn describe(&self) -> String;
}

impl<S: AcquisitionSource + ?Sized> AcquisitionSource for Box<S> {
    fn fetch_batch(&mut self) -> Result<FetchOutcome, AcquisitionError> {
        (**self).fetch_batch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
