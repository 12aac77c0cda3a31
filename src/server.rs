//! Read-only HTTP view of the running session.
//!
//! Serves the latest analysis, recent history and monitor counters to a
//! browser dashboard on the local machine.
//!
//! # Architecture
//!
//! ```text
//! orchestrator ──publish──→ LiveFeed ←──read── GET /api/* ←── dashboard
//! ```

use crate::core::aggregate::{BandStats, BatchAnalysis};
use crate::core::classifier::{EmotionLabel, LabelProbabilities};
use crate::core::recommend::Recommendation;
use crate::session::live::SharedLiveFeed;
use crate::stats::{SharedMonitorStats, StatsSnapshot};
use axum::{
    extract::State,
    http::{HeaderValue, Method},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Session view to serve
    pub feed: SharedLiveFeed,
    /// Counters reported by /api/status
    pub stats: SharedMonitorStats,
}

impl ServerConfig {
    pub fn new(port: u16, feed: SharedLiveFeed, stats: SharedMonitorStats) -> Self {
        Self { port, feed, stats }
    }
}

struct ServerState {
    feed: SharedLiveFeed,
    stats: SharedMonitorStats,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Envelope used by the data endpoints.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    fn empty(message: &str) -> Self {
        Self {
            success: false,
            message: Some(message.to_string()),
            data: None,
        }
    }
}

/// Latest analysis as shown on the dashboard.
#[derive(Debug, Serialize)]
pub struct EegData {
    pub timestamp: DateTime<Utc>,
    pub dominant_emotion: EmotionLabel,
    pub consistency: f64,
    pub avg_confidence: f64,
    pub probabilities: LabelProbabilities,
    pub eeg_stats: BandStats,
    pub recommendations: Vec<RecommendationView>,
    pub session_stats: SessionStatsView,
}

#[derive(Debug, Serialize)]
pub struct RecommendationView {
    pub tag: &'static str,
    pub advice: &'static [&'static str],
}

impl From<&Recommendation> for RecommendationView {
    fn from(rec: &Recommendation) -> Self {
        Self {
            tag: rec.tag(),
            advice: rec.advice(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionStatsView {
    pub total_batches: usize,
    pub total_samples: usize,
    /// Seconds since the session started
    pub session_duration: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionHistory {
    pub prediction_history: Vec<BatchAnalysis>,
    pub start_time: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub stats: StatsSnapshot,
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /api/eeg-data
async fn eeg_data(State(state): State<Arc<ServerState>>) -> Json<ApiResponse<EegData>> {
    let snapshot = state.feed.snapshot();
    let session_duration = snapshot.session_duration_secs();

    let Some(latest) = snapshot.latest else {
        return Json(ApiResponse::empty("No data available yet"));
    };

    let analysis = latest.analysis;
    Json(ApiResponse::ok(EegData {
        timestamp: analysis.timestamp,
        dominant_emotion: analysis.dominant_label,
        consistency: analysis.consistency,
        avg_confidence: analysis.avg_confidence,
        probabilities: analysis.avg_probabilities,
        eeg_stats: analysis.band_stats,
        recommendations: latest.recommendations.iter().map(Into::into).collect(),
        session_stats: SessionStatsView {
            total_batches: snapshot.total_batches,
            total_samples: snapshot.total_samples,
            session_duration,
        },
    }))
}

/// GET /api/session-history
async fn session_history(
    State(state): State<Arc<ServerState>>,
) -> Json<ApiResponse<SessionHistory>> {
    let snapshot = state.feed.snapshot();
    Json(ApiResponse::ok(SessionHistory {
        prediction_history: snapshot.history.into_iter().collect(),
        start_time: snapshot.session_start,
    }))
}

/// GET /api/status
async fn status(State(state): State<Arc<ServerState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running".to_string(),
        timestamp: Utc::now(),
        stats: state.stats.snapshot(),
    })
}

/// Build the router without binding.
pub fn router(config: &ServerConfig) -> Router {
    let state = Arc::new(ServerState {
        feed: config.feed.clone(),
        stats: config.stats.clone(),
    });

    Router::new()
        .route("/health", get(health))
        .route("/api/eeg-data", get(eeg_data))
        .route("/api/session-history", get(session_history))
        .route("/api/status", get(status))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods([Method::GET, Method::OPTIONS])
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, tokio::sync::oneshot::Sender<()>)> {
    let app = router(&config);

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("Live view listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok((actual_addr, shutdown_tx))
}
