//! EEG State Monitor - real-time emotional state estimation from EEG band powers.
//!
//! The monitor polls a headband bridge for alpha, beta and theta relative
//! band powers, expands each reading into the 17 features a pre-trained
//! classifier expects, and turns every batch of per-sample verdicts into a
//! dominant state (focus, relax or fatigue), band trends and guidance.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                       EEG State Monitor                          │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐            │
//! │  │ Acquisition │──▶│  Features   │──▶│ Classifier  │            │
//! │  │ (bridge/sim)│   │ (3 → 17)    │   │  (adapter)  │            │
//! │  └─────────────┘   └─────────────┘   └─────────────┘            │
//! │         │                                   │                    │
//! │         ▼                                   ▼                    │
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐            │
//! │  │   Session   │◀──│  Guidance   │◀──│ Aggregation │            │
//! │  │ (history)   │   │  + Trends   │   │  (batch)    │            │
//! │  └─────────────┘   └─────────────┘   └─────────────┘            │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use eeg_state_monitor::acquisition::{SimulatedSource, SimulationProfile};
//! use eeg_state_monitor::core::{BatchPipeline, LinearSoftmaxModel};
//! use eeg_state_monitor::session::{stop_pair, SessionOrchestrator};
//! use std::time::Duration;
//!
//! let source = SimulatedSource::new(SimulationProfile::Drowsy, 10);
//! let pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
//! let mut session = SessionOrchestrator::new(source, pipeline);
//!
//! let (_stop_handle, stop) = stop_pair();
//! let log = session.run(&stop, Duration::from_secs(5), Some(3));
//! println!("analyzed {} batches", log.total_batches);
//! ```

pub mod acquisition;
pub mod config;
pub mod core;
pub mod report;
pub mod session;
pub mod stats;

#[cfg(feature = "server")]
pub mod server;

// Re-export key types at crate root for convenience
pub use acquisition::{AcquisitionError, AcquisitionSource, FetchOutcome, RawSample};
pub use config::{Config, Thresholds};
pub use core::{
    synthesize, Assessment, BatchAnalysis, BatchPipeline, Classifier, EmotionLabel,
    LinearSoftmaxModel, PipelineError, Recommendation,
};
pub use session::{SessionLog, SessionOrchestrator, TickOutcome};
pub use stats::{MonitorStats, SharedMonitorStats};

#[cfg(feature = "http-source")]
pub use acquisition::{HttpSource, HttpSourceConfig};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
