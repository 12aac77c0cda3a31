//! End-to-end tests of the batch pipeline and session loop.

use eeg_state_monitor::acquisition::{
    AcquisitionError, AcquisitionSource, FetchOutcome, RawSample,
};
use eeg_state_monitor::core::{
    aggregate, BatchPipeline, ClassificationAdapter, EmotionLabel, LinearSoftmaxModel,
    PipelineError, Recommendation, Trend, FEATURE_COUNT,
};
use eeg_state_monitor::session::{stop_pair, SessionLog, SessionOrchestrator, TickOutcome};
use std::collections::VecDeque;
use std::time::Duration;

/// Ten consecutive readings from a recorded headband session.
const REFERENCE_SESSION: &str = r#"[
    {"alpha": 0.3829952605610029, "beta": 0.3278990489077491, "theta": 0.28910569053124796, "timestamp": "2025-05-31T11:03:37.450414"},
    {"alpha": 0.3832901360439825, "beta": 0.3251087128169748, "theta": 0.2916011511390427, "timestamp": "2025-05-31T11:03:37.509961"},
    {"alpha": 0.3837218405766482, "beta": 0.3221840013295427, "theta": 0.2940941580938092, "timestamp": "2025-05-31T11:03:37.509961"},
    {"alpha": 0.3842788892920541, "beta": 0.3191195095658467, "theta": 0.29660160114209905, "timestamp": "2025-05-31T11:03:37.566273"},
    {"alpha": 0.38497876721643043, "beta": 0.31592745623609036, "theta": 0.29909377654747915, "timestamp": "2025-05-31T11:03:37.623412"},
    {"alpha": 0.3857994496213299, "beta": 0.3126133628831309, "theta": 0.3015871874955391, "timestamp": "2025-05-31T11:03:37.630123"},
    {"alpha": 0.38673139067483014, "beta": 0.3091745569392213, "theta": 0.3040940523859487, "timestamp": "2025-05-31T11:03:37.687385"},
    {"alpha": 0.3877840598217534, "beta": 0.3056196260600903, "theta": 0.3065963141181562, "timestamp": "2025-05-31T11:03:37.747432"},
    {"alpha": 0.3889478529477842, "beta": 0.30195610149985175, "theta": 0.3090960455523639, "timestamp": "2025-05-31T11:03:37.810166"},
    {"alpha": 0.3902378705549261, "beta": 0.29820083124632074, "theta": 0.3115612981987532, "timestamp": "2025-05-31T11:03:37.810166"}
]"#;

fn reference_session() -> Vec<RawSample> {
    serde_json::from_str(REFERENCE_SESSION).expect("reference session parses")
}

/// A calmer batch preceding the reference one, with lower theta.
fn earlier_batch() -> Vec<RawSample> {
    (0..10)
        .map(|_| RawSample::now(0.38, 0.34, 0.27))
        .collect()
}

#[test]
fn test_reference_session_reads_as_fatigue() {
    let mut pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
    pipeline.analyze(&earlier_batch()).unwrap();

    let assessment = pipeline.analyze(&reference_session()).unwrap();
    let analysis = &assessment.analysis;

    assert_eq!(analysis.batch_size, 10);
    assert_eq!(analysis.dominant_label, EmotionLabel::Fatigue);
    assert_eq!(analysis.consistency, 1.0);
    assert!(analysis.avg_confidence > 0.5);
    assert!((analysis.avg_probabilities.sum() - 1.0).abs() < 1e-6);

    assert_eq!(analysis.band_stats.alpha.trend, Trend::Stable);
    assert_eq!(analysis.band_stats.beta.trend, Trend::Decreasing);
    assert_eq!(analysis.band_stats.theta.trend, Trend::Increasing);

    assert!(assessment.recommendations.iter().any(|r| r.is_fatigue()));
    assert_eq!(assessment.recommendations, vec![Recommendation::HighFatigue]);
}

#[test]
fn test_first_batch_trends_are_stable() {
    let mut pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
    let analysis = pipeline.analyze(&reference_session()).unwrap().analysis;

    assert_eq!(analysis.band_stats.alpha.trend, Trend::Stable);
    assert_eq!(analysis.band_stats.beta.trend, Trend::Stable);
    assert_eq!(analysis.band_stats.theta.trend, Trend::Stable);
}

#[test]
fn test_aggregate_is_idempotent() {
    let adapter = ClassificationAdapter::new(LinearSoftmaxModel::baseline());
    let classified: Vec<_> = reference_session()
        .into_iter()
        .map(|s| {
            let features = eeg_state_monitor::core::synthesize(s.alpha, s.beta, s.theta);
            (s, adapter.classify(features.as_slice()).unwrap())
        })
        .collect();

    let first = serde_json::to_string(&aggregate(&classified).unwrap()).unwrap();
    let second = serde_json::to_string(&aggregate(&classified).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_adapter_rejects_short_vectors() {
    let adapter = ClassificationAdapter::new(LinearSoftmaxModel::baseline());
    let err = adapter.classify(&[0.0; 16]).unwrap_err();

    assert!(matches!(
        err,
        PipelineError::InvalidFeatureCount {
            expected: FEATURE_COUNT,
            actual: 16
        }
    ));
}

/// Replays the reference recording after one calibrating poll and one
/// dropped connection.
struct ReplaySource {
    polls: VecDeque<Result<FetchOutcome, AcquisitionError>>,
}

impl AcquisitionSource for ReplaySource {
    fn fetch_batch(&mut self) -> Result<FetchOutcome, AcquisitionError> {
        self.polls
            .pop_front()
            .unwrap_or_else(|| Ok(FetchOutcome::NotReady("recording finished".to_string())))
    }

    fn describe(&self) -> String {
        "replay".to_string()
    }
}

#[test]
fn test_session_survives_bad_polls_and_persists() {
    let source = ReplaySource {
        polls: VecDeque::from(vec![
            Ok(FetchOutcome::NotReady("calibrating".to_string())),
            Ok(FetchOutcome::Batch(earlier_batch())),
            Err(AcquisitionError::Network("connection reset".to_string())),
            Ok(FetchOutcome::Batch(reference_session())),
        ]),
    };
    let mut session = SessionOrchestrator::new(
        source,
        BatchPipeline::with_defaults(LinearSoftmaxModel::baseline()),
    );
    let (_stop_handle, stop) = stop_pair();

    let mut last = None;
    let log = session.run_with(&stop, Duration::from_millis(1), Some(2), |outcome, _| {
        last = Some(outcome.clone())
    });

    // The failed poll between the two batches must not disturb the trend.
    let Some(TickOutcome::Analyzed(assessment)) = last else {
        panic!("last tick was not an analysis: {last:?}");
    };
    assert_eq!(assessment.analysis.band_stats.theta.trend, Trend::Increasing);

    assert_eq!(log.total_batches, 2);
    assert_eq!(log.total_samples, 20);
    assert_eq!(log.batch_history[1].dominant_label, EmotionLabel::Fatigue);

    let stats = session.stats().snapshot();
    assert_eq!(stats.ticks, 4);
    assert_eq!(stats.not_ready_ticks, 1);
    assert_eq!(stats.skipped_ticks, 1);

    let dir = std::env::temp_dir().join(format!("eeg-pipeline-test-{}", uuid::Uuid::new_v4()));
    let path = session.persist(&log, &dir).expect("session saved");
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("eeg_session_"));

    let saved = SessionLog::load(&path).unwrap();
    assert_eq!(saved.session_id, log.session_id);
    assert_eq!(saved.raw_samples.len(), 20);
    assert_eq!(saved.raw_samples[10].timestamp, reference_session()[0].timestamp);

    let _ = std::fs::remove_dir_all(&dir);
}
