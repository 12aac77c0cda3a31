//! Monitoring sessions.
//!
//! A session polls the acquisition source on a fixed cadence, runs each
//! batch through the pipeline, keeps the history and writes it out at the
//! end.

pub mod live;
pub mod log;
pub mod orchestrator;
pub mod stop;

// Re-export commonly used types
pub use live::{create_live_feed, LiveFeed, LiveSnapshot, SharedLiveFeed, HISTORY_LIMIT};
pub use log::{PersistError, SessionLog};
pub use orchestrator::{SessionOrchestrator, SessionState, TickOutcome};
pub use stop::{stop_pair, StopHandle, StopSignal};
