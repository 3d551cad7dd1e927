//! REST API for a completed model run.
//!
//! Provides three GET endpoints:
//! - `/summary`: configuration, cost report, and ensemble summary
//! - `/states`: weighted upgrade cost per state
//! - `/buildings`: per-building results with optional filters

mod handlers;
mod types;

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use log::info;

use crate::config::ModelConfig;
use crate::model::{BuildingRecord, CostReport, EnsembleSummary};

pub use types::{BuildingQuery, ErrorResponse, StateCost, SummaryResponse};

/// Default port of the dashboard API.
pub const DEFAULT_PORT: u16 = 8000;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the model run completes and wrapped in `Arc`.
pub struct AppState {
    /// Configuration used for this run.
    pub config: ModelConfig,
    /// Cost report of the first run.
    pub report: CostReport,
    /// Total cost distribution when more than one iteration ran.
    pub summary: Option<EnsembleSummary>,
    /// Per-building results of the first run.
    pub buildings: Vec<BuildingRecord>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/summary", get(handlers::get_summary))
        .route("/states", get(handlers::get_states))
        .route("/buildings", get(handlers::get_buildings))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("API server listening on http://{addr}");
    axum::serve(listener, app).await
}
