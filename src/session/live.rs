//! Latest-session view shared with the live view server.
//!
//! The orchestrator is the only writer. Readers get a cloned snapshot so a
//! slow HTTP client never holds the lock.

use crate::core::aggregate::BatchAnalysis;
use crate::core::pipeline::Assessment;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// Number of recent analyses kept for the history view.
pub const HISTORY_LIMIT: usize = 20;

/// Point-in-time copy of the live session.
#[derive(Debug, Clone, Serialize)]
pub struct LiveSnapshot {
    pub session_start: DateTime<Utc>,
    pub latest: Option<Assessment>,
    /// Most recent analyses, oldest first
    pub history: VecDeque<BatchAnalysis>,
    pub total_batches: usize,
    pub total_samples: usize,
}

impl LiveSnapshot {
    pub fn session_duration_secs(&self) -> i64 {
        (Utc::now() - self.session_start).num_seconds().max(0)
    }
}

#[derive(Debug)]
pub struct LiveFeed {
    inner: RwLock<LiveSnapshot>,
}

impl LiveFeed {
    pub fn new(session_start: DateTime<Utc>) -> Self {
        Self {
            inner: RwLock::new(LiveSnapshot {
                session_start,
                latest: None,
                history: VecDeque::with_capacity(HISTORY_LIMIT),
                total_batches: 0,
                total_samples: 0,
            }),
        }
    }

    /// Publish a freshly analyzed batch.
    pub fn publish(&self, assessment: &Assessment, total_batches: usize, total_samples: usize) {
        let mut view = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if view.history.len() == HISTORY_LIMIT {
            view.history.pop_front();
        }
        view.history.push_back(assessment.analysis.clone());
        view.latest = Some(assessment.clone());
        view.total_batches = total_batches;
        view.total_samples = total_samples;
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Thread-safe shared live feed.
pub type SharedLiveFeed = Arc<LiveFeed>;

pub fn create_live_feed(session_start: DateTime<Utc>) -> SharedLiveFeed {
    Arc::new(LiveFeed::new(session_start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::BandStats;
    use crate::core::classifier::{EmotionLabel, LabelProbabilities};

    fn assessment(batch_size: usize) -> Assessment {
        Assessment {
            analysis: BatchAnalysis {
                timestamp: Utc::now(),
                batch_size,
                dominant_label: EmotionLabel::Focus,
                dominant_count: batch_size,
                consistency: 1.0,
                avg_confidence: 0.8,
                avg_probabilities: LabelProbabilities::new(0.8, 0.1, 0.1),
                band_stats: BandStats::from_averages(0.3, 0.48, 0.22),
            },
            recommendations: Vec::new(),
        }
    }

    #[test]
    fn test_empty_feed() {
        let feed = LiveFeed::new(Utc::now());
        let snapshot = feed.snapshot();
        assert!(snapshot.latest.is_none());
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.total_batches, 0);
    }

    #[test]
    fn test_history_is_bounded() {
        let feed = LiveFeed::new(Utc::now());
        for i in 1..=(HISTORY_LIMIT + 5) {
            feed.publish(&assessment(i), i, i * 10);
        }

        let snapshot = feed.snapshot();
        assert_eq!(snapshot.history.len(), HISTORY_LIMIT);
        assert_eq!(snapshot.history.front().unwrap().batch_size, 6);
        assert_eq!(snapshot.latest.unwrap().analysis.batch_size, HISTORY_LIMIT + 5);
        assert_eq!(snapshot.total_samples, (HISTORY_LIMIT + 5) * 10);
    }
}
