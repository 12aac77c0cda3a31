//! Demonstration of a monitoring session on the simulated headband.
//!
//! This example shows how to:
//! 1. Create a simulated acquisition source
//! 2. Build the batch pipeline around the built-in model
//! 3. Drive a session for a fixed number of batches
//! 4. Render each analysis and save the session log
//!
//! Run with: cargo run --example replay_demo [focused|relaxed|drowsy]

use std::time::Duration;

use chrono::Utc;
use eeg_state_monitor::{
    acquisition::{SimulatedSource, SimulationProfile},
    core::{BatchPipeline, LinearSoftmaxModel},
    report::{self, SessionTotals},
    session::{stop_pair, SessionOrchestrator, TickOutcome},
};

fn main() {
    let profile = std::env::args()
        .nth(1)
        .map(|name| SimulationProfile::from_name(&name))
        .unwrap_or(SimulationProfile::Drowsy);

    println!("EEG State Monitor - Replay Demo");
    println!("================================");
    println!();

    let source = SimulatedSource::new(profile, 10).with_warmup(1);
    let pipeline = BatchPipeline::with_defaults(LinearSoftmaxModel::baseline());
    let mut session = SessionOrchestrator::new(source, pipeline);
    let started = session.session_start();

    // Keep the handle alive; dropping it would stop the session.
    let (_stop_handle, stop) = stop_pair();

    let log = session.run_with(
        &stop,
        Duration::from_millis(500),
        Some(4),
        |outcome, state| match outcome {
            TickOutcome::Analyzed(assessment) => {
                let totals = SessionTotals {
                    total_batches: state.total_batches(),
                    total_samples: state.total_samples(),
                    duration_secs: (Utc::now() - started).num_seconds().max(0) as u64,
                };
                println!("{}", report::render(assessment, &totals));
                println!();
            }
            TickOutcome::NotReady(reason) => println!("Waiting for device: {reason}"),
            TickOutcome::Skipped(reason) => println!("Skipped: {reason}"),
        },
    );

    let dir = std::env::temp_dir().join("eeg-state-monitor-demo");
    match session.persist(&log, &dir) {
        Some(path) => println!("Session log written to {path:?}"),
        None => println!("Session log not written"),
    }

    println!();
    println!("{}", session.stats().summary());
}
