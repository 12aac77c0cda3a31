//! Monitor statistics.
//!
//! Counts what the monitor polled and analyzed, across runs.

pub mod counters;

// Re-export commonly used types
pub use counters::{
    create_shared_stats, create_shared_stats_with_persistence, MonitorStats, PersistedStats,
    SharedMonitorStats, StatsSnapshot,
};
