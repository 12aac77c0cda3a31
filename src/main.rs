//! EEG State Monitor CLI
//!
//! Real-time emotional state monitoring from EEG band powers.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use eeg_state_monitor::{
    acquisition::{AcquisitionSource, RawSample, SimulatedSource, SimulationProfile},
    config::{Config, SourceKind},
    core::{synthesize, BandInsights, BatchPipeline, LinearSoftmaxModel, FEATURE_NAMES},
    report::{self, SessionTotals},
    session::{stop_pair, SessionOrchestrator, TickOutcome},
    stats::{create_shared_stats_with_persistence, PersistedStats},
    VERSION,
};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "eeg-monitor")]
#[command(version = VERSION)]
#[command(about = "Real-time emotional state monitor for EEG band powers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a monitoring session
    Monitor(MonitorArgs),

    /// Analyze a recorded batch of samples
    Predict {
        /// JSON file holding a list of {alpha, beta, theta, timestamp}
        #[arg(long, short)]
        input: PathBuf,

        /// JSON model file (built-in baseline model if omitted)
        #[arg(long)]
        model: Option<PathBuf>,
    },

    /// Show the 17 model features for one reading
    Features {
        #[arg(long)]
        alpha: f64,
        #[arg(long)]
        beta: f64,
        #[arg(long)]
        theta: f64,
    },

    /// Show cumulative monitor statistics
    Status,

    /// Show configuration
    Config {
        /// Write the effective configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args)]
struct MonitorArgs {
    /// Band-power source (simulated or http)
    #[arg(long)]
    source: Option<String>,

    /// Bridge data endpoint for the http source
    #[arg(long)]
    url: Option<String>,

    /// Seconds between polls
    #[arg(long)]
    interval: Option<u64>,

    /// Stop after this many analyzed batches
    #[arg(long)]
    batches: Option<usize>,

    /// JSON model file (built-in baseline model if omitted)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Simulated state (focused, relaxed or drowsy)
    #[arg(long, default_value = "focused")]
    profile: String,

    /// Serve the live view over HTTP (requires server feature)
    #[arg(long)]
    serve: bool,

    /// Live view port
    #[arg(long)]
    port: Option<u16>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eeg_state_monitor=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Monitor(args) => cmd_monitor(args),
        Commands::Predict { input, model } => cmd_predict(&input, model),
        Commands::Features { alpha, beta, theta } => {
            cmd_features(alpha, beta, theta);
            Ok(())
        }
        Commands::Status => {
            cmd_status();
            Ok(())
        }
        Commands::Config { init } => cmd_config(init),
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config, using defaults: {}", e);
        Config::default()
    })
}

fn load_model(path: Option<&Path>) -> anyhow::Result<LinearSoftmaxModel> {
    match path {
        Some(path) => LinearSoftmaxModel::load(path)
            .with_context(|| format!("loading model from {}", path.display())),
        None => Ok(LinearSoftmaxModel::baseline()),
    }
}

fn build_source(config: &Config, profile: &str) -> anyhow::Result<Box<dyn AcquisitionSource>> {
    match config.source {
        SourceKind::Simulated => Ok(Box::new(
            SimulatedSource::new(SimulationProfile::from_name(profile), config.expected_batch_size)
                .with_warmup(1),
        )),
        #[cfg(feature = "http-source")]
        SourceKind::Http => {
            use eeg_state_monitor::acquisition::{HttpSource, HttpSourceConfig};
            let source = HttpSource::new(HttpSourceConfig::new(
                config.api_url.clone(),
                config.fetch_timeout,
            ))?;
            Ok(Box::new(source))
        }
        #[cfg(not(feature = "http-source"))]
        SourceKind::Http => {
            bail!("the http source requires the http-source feature at compile time")
        }
    }
}

fn cmd_monitor(args: MonitorArgs) -> anyhow::Result<()> {
    let mut config = load_config();

    // Command-line flags override the config file for this run
    if let Some(ref source) = args.source {
        config.source = match SourceKind::parse(source) {
            Some(kind) => kind,
            None => bail!("unknown source '{source}' (expected simulated or http)"),
        };
    }
    if let Some(url) = args.url {
        config.api_url = url;
    }
    if let Some(secs) = args.interval {
        config.poll_interval = Duration::from_secs(secs.max(1));
    }
    if let Some(model) = args.model {
        config.model_path = Some(model);
    }
    if let Some(port) = args.port {
        config.server_port = port;
    }

    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let model = load_model(config.model_path.as_deref())?;
    let source = build_source(&config, &args.profile)?;
    let stats = create_shared_stats_with_persistence(config.stats_path());

    println!("EEG State Monitor v{VERSION}");
    println!();
    println!("  Source: {}", source.describe());
    println!(
        "  Model: {}",
        config
            .model_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in baseline".to_string())
    );
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!(
        "  Batch size: expected {} samples per fetch",
        config.expected_batch_size
    );

    let pipeline = BatchPipeline::new(
        model,
        config.thresholds.tracker(),
        config.thresholds.engine(),
    );
    #[cfg_attr(not(feature = "server"), allow(unused_mut))]
    let mut session = SessionOrchestrator::new(source, pipeline)
        .with_stats(stats.clone())
        .with_expected_batch_size(config.expected_batch_size);
    let session_start = session.session_start();

    #[cfg(feature = "server")]
    let live_view = if args.serve {
        let feed = eeg_state_monitor::session::create_live_feed(session_start);
        session = session.with_live_feed(feed.clone());
        Some(start_live_view(config.server_port, feed, stats.clone())?)
    } else {
        None
    };

    #[cfg(not(feature = "server"))]
    if args.serve {
        eprintln!("Warning: --serve flag ignored (server feature not enabled at compile time)");
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let (stop_handle, stop) = stop_pair();
    ctrlc::set_handler(move || stop_handle.stop()).context("setting Ctrl+C handler")?;

    let log = session.run_with(
        &stop,
        config.poll_interval,
        args.batches,
        |outcome, state| match outcome {
            TickOutcome::Analyzed(assessment) => {
                let totals = SessionTotals {
                    total_batches: state.total_batches(),
                    total_samples: state.total_samples(),
                    duration_secs: (Utc::now() - session_start).num_seconds().max(0) as u64,
                };
                println!("{}", report::render(assessment, &totals));
                println!();
            }
            TickOutcome::NotReady(reason) => {
                println!("[{}] Device not ready: {}", Utc::now().format("%H:%M:%S"), reason);
            }
            TickOutcome::Skipped(reason) => {
                eprintln!("[{}] Skipped: {}", Utc::now().format("%H:%M:%S"), reason);
            }
        },
    );

    println!();
    println!("Stopping monitor...");

    #[cfg(feature = "server")]
    if let Some((runtime, shutdown_tx)) = live_view {
        let _ = shutdown_tx.send(());
        runtime.shutdown_timeout(Duration::from_secs(2));
    }

    if let Some(path) = session.persist(&log, &config.export_path) {
        println!(
            "Saved {} batches ({} samples) to {:?}",
            log.total_batches, log.total_samples, path
        );
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save monitor stats: {e}");
    }

    println!();
    println!("{}", stats.summary());

    Ok(())
}

/// Start the live view on its own runtime; the monitor loop stays on this thread.
#[cfg(feature = "server")]
fn start_live_view(
    port: u16,
    feed: eeg_state_monitor::session::SharedLiveFeed,
    stats: eeg_state_monitor::SharedMonitorStats,
) -> anyhow::Result<(tokio::runtime::Runtime, tokio::sync::oneshot::Sender<()>)> {
    use eeg_state_monitor::server::{run, ServerConfig};

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("building server runtime")?;
    let (addr, shutdown_tx) = runtime.block_on(run(ServerConfig::new(port, feed, stats)))?;
    println!("  Live view: http://{addr}/api/eeg-data");

    Ok((runtime, shutdown_tx))
}

fn cmd_predict(input: &Path, model: Option<PathBuf>) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let samples: Vec<RawSample> = serde_json::from_str(&content)
        .with_context(|| format!("parsing samples in {}", input.display()))?;

    let model = load_model(model.as_deref())?;
    let mut pipeline = BatchPipeline::with_defaults(model);
    let assessment = pipeline.analyze(&samples)?;
    let insights = BandInsights::from_samples(&samples)?;

    let totals = SessionTotals {
        total_batches: 1,
        total_samples: samples.len(),
        duration_secs: match (samples.first(), samples.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_seconds().max(0) as u64
            }
            _ => 0,
        },
    };

    println!("{}", report::render(&assessment, &totals));
    println!();
    println!("{}", report::render_insights(&insights));

    Ok(())
}

fn cmd_features(alpha: f64, beta: f64, theta: f64) {
    let features = synthesize(alpha, beta, theta);

    println!("Features for alpha={alpha}, beta={beta}, theta={theta}");
    println!();
    for (i, (name, value)) in FEATURE_NAMES.iter().zip(features.iter()).enumerate() {
        println!("  [{i:>2}] {name:<28} {value:.6}");
    }
}

fn cmd_status() {
    let config = load_config();

    println!("EEG State Monitor Status");
    println!("========================");
    println!();
    println!("Configuration:");
    println!("  Source: {:?}", config.source);
    println!("  Poll interval: {}s", config.poll_interval.as_secs());
    println!(
        "  Model: {}",
        config
            .model_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "built-in baseline".to_string())
    );
    println!();

    let stats_path = config.stats_path();
    let persisted = std::fs::read_to_string(&stats_path)
        .ok()
        .and_then(|content| serde_json::from_str::<PersistedStats>(&content).ok());

    match persisted {
        Some(stats) => {
            println!("Cumulative Statistics:");
            println!("  Polls: {}", stats.ticks);
            println!("  Batches analyzed: {}", stats.batches_analyzed);
            println!("  Samples analyzed: {}", stats.samples_analyzed);
            println!("  Device not ready: {}", stats.not_ready_ticks);
            println!("  Skipped (errors): {}", stats.skipped_ticks);
            println!("  Sessions saved: {}", stats.sessions_saved);
            println!("  Last updated: {}", stats.last_updated.format("%Y-%m-%d %H:%M:%S"));
        }
        None => println!("No previous session data found."),
    }

    let session_files = std::fs::read_dir(&config.export_path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| {
                    e.file_name()
                        .to_string_lossy()
                        .starts_with("eeg_session_")
                })
                .count()
        })
        .unwrap_or(0);
    println!();
    println!("Saved sessions: {} in {:?}", session_files, config.export_path);
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let config = load_config();

    if init {
        let path = config.save()?;
        println!("Configuration written to {:?}", path);
        return Ok(());
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}
