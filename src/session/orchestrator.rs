//! Polling loop binding acquisition to the batch pipeline.
//!
//! One tick is one fetch followed, when a batch arrived, by one analysis.
//! The orchestrator owns the session history; nothing else appends to it.

use crate::acquisition::types::RawSample;
use crate::acquisition::{AcquisitionSource, FetchOutcome};
use crate::core::aggregate::BatchAnalysis;
use crate::core::classifier::Classifier;
use crate::core::error::PipelineError;
use crate::core::pipeline::{Assessment, BatchPipeline};
use crate::session::live::SharedLiveFeed;
use crate::session::log::{host_name, SessionLog};
use crate::session::stop::StopSignal;
use crate::stats::{create_shared_stats, SharedMonitorStats};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

/// Append-only record of a session.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    history: Vec<BatchAnalysis>,
    raw_samples: Vec<RawSample>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, samples: Vec<RawSample>, analysis: BatchAnalysis) {
        self.raw_samples.extend(samples);
        self.history.push(analysis);
    }

    pub fn history(&self) -> &[BatchAnalysis] {
        &self.history
    }

    pub fn raw_samples(&self) -> &[RawSample] {
        &self.raw_samples
    }

    pub fn total_batches(&self) -> usize {
        self.history.len()
    }

    pub fn total_samples(&self) -> usize {
        self.raw_samples.len()
    }
}

/// What happened on one poll.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Analyzed(Assessment),
    /// The device had nothing to offer yet
    NotReady(String),
    /// The poll or its analysis failed; state is unchanged
    Skipped(String),
}

/// Drives a monitoring session.
pub struct SessionOrchestrator<S, C> {
    source: S,
    pipeline: BatchPipeline<C>,
    state: SessionState,
    stats: SharedMonitorStats,
    live: Option<SharedLiveFeed>,
    expected_batch_size: Option<usize>,
    session_id: Uuid,
    session_start: DateTime<Utc>,
}

impl<S: AcquisitionSource, C: Classifier> SessionOrchestrator<S, C> {
    pub fn new(source: S, pipeline: BatchPipeline<C>) -> Self {
        Self {
            source,
            pipeline,
            state: SessionState::new(),
            stats: create_shared_stats(),
            live: None,
            expected_batch_size: None,
            session_id: Uuid::new_v4(),
            session_start: Utc::now(),
        }
    }

    pub fn with_stats(mut self, stats: SharedMonitorStats) -> Self {
        self.stats = stats;
        self
    }

    /// Publish every analyzed batch to `feed`.
    pub fn with_live_feed(mut self, feed: SharedLiveFeed) -> Self {
        self.live = Some(feed);
        self
    }

    /// Note batches whose size differs from `size`. They are still analyzed.
    pub fn with_expected_batch_size(mut self, size: usize) -> Self {
        self.expected_batch_size = Some(size);
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn pipeline(&self) -> &BatchPipeline<C> {
        &self.pipeline
    }

    pub fn stats(&self) -> &SharedMonitorStats {
        &self.stats
    }

    /// Analyze one batch and append it to the session.
    ///
    /// On error neither the history nor the trend state changes.
    pub fn analyze_batch(&mut self, samples: Vec<RawSample>) -> Result<Assessment, PipelineError> {
        let assessment = self.pipeline.analyze(&samples)?;

        self.stats.record_batch(samples.len() as u64);
        self.state.record(samples, assessment.analysis.clone());

        if let Some(ref live) = self.live {
            live.publish(
                &assessment,
                self.state.total_batches(),
                self.state.total_samples(),
            );
        }

        Ok(assessment)
    }

    /// Fetch and analyze one batch. Failures are reported, never raised.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.record_tick();

        match self.source.fetch_batch() {
            Ok(FetchOutcome::Batch(samples)) if samples.is_empty() => {
                self.stats.record_not_ready();
                tracing::debug!("Source returned an empty batch");
                TickOutcome::NotReady("no samples in batch".to_string())
            }
            Ok(FetchOutcome::Batch(samples)) => {
                tracing::debug!(samples = samples.len(), "Fetched batch");
                if let Some(expected) = self.expected_batch_size {
                    if samples.len() != expected {
                        tracing::debug!(
                            expected,
                            actual = samples.len(),
                            "Batch size differs from expected"
                        );
                    }
                }

                match self.analyze_batch(samples) {
                    Ok(assessment) => {
                        let analysis = &assessment.analysis;
                        tracing::info!(
                            label = %analysis.dominant_label,
                            consistency = analysis.consistency,
                            confidence = analysis.avg_confidence,
                            "Batch analyzed"
                        );
                        TickOutcome::Analyzed(assessment)
                    }
                    Err(e) => {
                        self.stats.record_skipped();
                        if e.is_dependency_error() {
                            tracing::error!("Classifier misbehaved, skipping batch: {}", e);
                        } else {
                            tracing::warn!("Skipping batch: {}", e);
                        }
                        TickOutcome::Skipped(e.to_string())
                    }
                }
            }
            Ok(FetchOutcome::NotReady(reason)) => {
                self.stats.record_not_ready();
                tracing::debug!("Device not ready: {}", reason);
                TickOutcome::NotReady(reason)
            }
            Err(e) => {
                self.stats.record_skipped();
                tracing::warn!("Fetch failed: {}", e);
                TickOutcome::Skipped(e.to_string())
            }
        }
    }

    /// Poll until stopped or until `max_batches` batches were analyzed.
    pub fn run(
        &mut self,
        stop: &StopSignal,
        interval: Duration,
        max_batches: Option<usize>,
    ) -> SessionLog {
        self.run_with(stop, interval, max_batches, |_, _| {})
    }

    /// Like [`run`](Self::run), calling `on_tick` after every poll.
    pub fn run_with<F>(
        &mut self,
        stop: &StopSignal,
        interval: Duration,
        max_batches: Option<usize>,
        mut on_tick: F,
    ) -> SessionLog
    where
        F: FnMut(&TickOutcome, &SessionState),
    {
        tracing::info!(
            session = %self.session_id,
            source = %self.source.describe(),
            interval_secs = interval.as_secs_f64(),
            "Session started"
        );

        let reached = |state: &SessionState| match max_batches {
            Some(max) if state.total_batches() >= max => {
                tracing::info!("Reached {} batches", max);
                true
            }
            _ => false,
        };

        while !stop.is_stopped() && !reached(&self.state) {
            let outcome = self.tick();
            on_tick(&outcome, &self.state);

            if reached(&self.state) || stop.wait(interval) {
                break;
            }
        }

        tracing::info!(
            batches = self.state.total_batches(),
            samples = self.state.total_samples(),
            "Session stopped"
        );

        self.session_log()
    }

    /// Snapshot of the session so far.
    pub fn session_log(&self) -> SessionLog {
        SessionLog {
            session_id: self.session_id,
            host: host_name(),
            session_start: self.session_start,
            session_end: Utc::now(),
            total_batches: self.state.total_batches(),
            total_samples: self.state.total_samples(),
            batch_history: self.state.history.clone(),
            raw_samples: self.state.raw_samples.clone(),
        }
    }

    /// Best-effort save of `log` into `dir`.
    ///
    /// Returns the written path, or `None` when there was nothing to save
    /// or the write failed.
    pub fn persist(&self, log: &SessionLog, dir: &Path) -> Option<PathBuf> {
        if log.is_empty() {
            tracing::debug!("No samples received, session not saved");
            return None;
        }

        match log.save(dir) {
            Ok(path) => {
                self.stats.record_session_saved();
                tracing::info!("Session saved to {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::error!("Could not save session: {}", e);
                None
            }
        }
    }
}
