//! ThermaSafe API Server
//!
//! REST boundary between the heat monitoring core and the dashboard:
//! reading ingestion, live device statistics, classifications and alerts.

use alert_store::AlertStore;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use heat_monitor::{spawn_silence_watch, Monitor};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod error;
mod rate_limit;
mod routes;
mod settings;

pub use error::ApiError;
pub use rate_limit::{create_governor_config, IngestGovernorConfig};
pub use settings::{
    AlertSettings, LoggingSettings, RateLimitSettings, ServerSettings, Settings, DEFAULT_CONFIG_PATH,
};

/// Application state shared across handlers
pub struct AppState {
    pub monitor: Arc<Monitor>,
    pub alerts: Arc<AlertStore>,
    /// Prometheus renderer, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
    pub version: String,
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create state and register the alert store as a subscriber
    pub fn new(monitor: Arc<Monitor>, alerts: Arc<AlertStore>) -> Self {
        monitor.subscribe(alerts.clone());
        Self {
            monitor,
            alerts,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub device_count: usize,
    pub alert_count: usize,
    pub unacknowledged_alerts: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, rate_limit: Option<Arc<IngestGovernorConfig>>) -> Router {
    let mut ingest = Router::new().route("/api/v1/readings", post(routes::readings::ingest));
    if let Some(config) = rate_limit {
        ingest = ingest.layer(GovernorLayer { config });
    }

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/devices", get(routes::devices::list_devices))
        .route("/api/v1/devices/:id", axum::routing::delete(routes::devices::unregister))
        .route("/api/v1/devices/:id/stats", get(routes::devices::get_stats))
        .route(
            "/api/v1/devices/:id/classification",
            get(routes::devices::get_classification),
        )
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id/ack", post(routes::alerts::acknowledge))
        .route("/metrics", get(metrics_handler))
        .merge(ingest)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        device_count: state.monitor.device_count(),
        alert_count: state.alerts.len(),
        unacknowledged_alerts: state.alerts.pending_count(),
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if settings.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Run the server until Ctrl-C
pub async fn run_server(settings: Settings) -> anyhow::Result<()> {
    let monitor = Arc::new(Monitor::new(settings.monitor.clone())?);
    let alerts = Arc::new(AlertStore::new(settings.alerts.history_capacity));
    let metrics = PrometheusBuilder::new().install_recorder()?;
    let state = Arc::new(AppState::new(Arc::clone(&monitor), alerts).with_metrics(metrics));

    let watch = spawn_silence_watch(
        Arc::clone(&monitor),
        settings.monitor.silence_check_interval(),
    );

    let app = create_router(state, create_governor_config(&settings.rate_limit));

    info!("Starting API server on {}", settings.server.bind_addr);
    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr.as_str()).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        tokio::signal::ctrl_c().await.ok();
        info!("Shutdown requested");
    })
    .await?;

    watch.abort();
    info!("API server stopped");
    Ok(())
}
