//! Cumulative monitor counters.
//!
//! Tracks how many polls the monitor made and what came of them. Counters
//! are atomics so the session loop and the live view server can share one
//! instance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Poll and batch counters for the monitor.
#[derive(Debug)]
pub struct MonitorStats {
    /// Number of polls of the acquisition source
    ticks: AtomicU64,
    /// Number of batches analyzed successfully
    batches_analyzed: AtomicU64,
    /// Number of samples received in analyzed batches
    samples_analyzed: AtomicU64,
    /// Polls that found the device not ready
    not_ready_ticks: AtomicU64,
    /// Polls skipped because of an error
    skipped_ticks: AtomicU64,
    /// Session logs written
    sessions_saved: AtomicU64,
    /// Start of the current run
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            batches_analyzed: AtomicU64::new(0),
            samples_analyzed: AtomicU64::new(0),
            not_ready_ticks: AtomicU64::new(0),
            skipped_ticks: AtomicU64::new(0),
            sessions_saved: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create counters that continue from the totals stored at `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            tracing::warn!("Could not load previous monitor stats: {}", e);
        }

        stats
    }

    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an analyzed batch of `samples` samples.
    pub fn record_batch(&self, samples: u64) {
        self.batches_analyzed.fetch_add(1, Ordering::Relaxed);
        self.samples_analyzed.fetch_add(samples, Ordering::Relaxed);
    }

    pub fn record_not_ready(&self) {
        self.not_ready_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_session_saved(&self) {
        self.sessions_saved.fetch_add(1, Ordering::Relaxed);
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            batches_analyzed: self.batches_analyzed.load(Ordering::Relaxed),
            samples_analyzed: self.samples_analyzed.load(Ordering::Relaxed),
            not_ready_ticks: self.not_ready_ticks.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            sessions_saved: self.sessions_saved.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Monitor Statistics:\n\
             - Polls: {}\n\
             - Batches analyzed: {}\n\
             - Samples analyzed: {}\n\
             - Device not ready: {}\n\
             - Skipped (errors): {}\n\
             - Sessions saved: {}\n\
             - Run duration: {} seconds",
            stats.ticks,
            stats.batches_analyzed,
            stats.samples_analyzed,
            stats.not_ready_ticks,
            stats.skipped_ticks,
            stats.sessions_saved,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.snapshot();
            let persisted = PersistedStats {
                ticks: stats.ticks,
                batches_analyzed: stats.batches_analyzed,
                samples_analyzed: stats.samples_analyzed,
                not_ready_ticks: stats.not_ready_ticks,
                skipped_ticks: stats.skipped_ticks,
                sessions_saved: stats.sessions_saved,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;

            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if path.exists() {
                let content = std::fs::read_to_string(path)?;
                let persisted: PersistedStats =
                    serde_json::from_str(&content).map_err(std::io::Error::other)?;

                self.ticks.store(persisted.ticks, Ordering::Relaxed);
                self.batches_analyzed
                    .store(persisted.batches_analyzed, Ordering::Relaxed);
                self.samples_analyzed
                    .store(persisted.samples_analyzed, Ordering::Relaxed);
                self.not_ready_ticks
                    .store(persisted.not_ready_ticks, Ordering::Relaxed);
                self.skipped_ticks
                    .store(persisted.skipped_ticks, Ordering::Relaxed);
                self.sessions_saved
                    .store(persisted.sessions_saved, Ordering::Relaxed);
            }
        }
        Ok(())
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub batches_analyzed: u64,
    pub samples_analyzed: u64,
    pub not_ready_ticks: u64,
    pub skipped_ticks: u64,
    pub sessions_saved: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// On-disk format.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedStats {
    pub ticks: u64,
    pub batches_analyzed: u64,
    pub samples_analyzed: u64,
    pub not_ready_ticks: u64,
    pub skipped_ticks: u64,
    pub sessions_saved: u64,
    pub last_updated: DateTime<Utc>,
}

/// Thread-safe shared counters.
pub type SharedMonitorStats = Arc<MonitorStats>;

pub fn create_shared_stats() -> SharedMonitorStats {
    Arc::new(MonitorStats::new())
}

pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedMonitorStats {
    Arc::new(MonitorStats::with_persistence(path))
}
