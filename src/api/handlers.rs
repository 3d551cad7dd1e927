//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{BuildingQuery, ErrorResponse, StateCost, SummaryResponse};
use crate::model::BuildingRecord;

/// Returns configuration, cost report, and ensemble summary.
///
/// `GET /summary` → 200 + `SummaryResponse` JSON
pub async fn get_summary(State(state): State<Arc<AppState>>) -> Json<SummaryResponse> {
    Json(SummaryResponse {
        config: state.config.clone(),
        report: state.report.clone(),
        ensemble: state.summary.clone(),
    })
}

/// Returns weighted costs per state, sorted by state.
///
/// `GET /states` → 200 + `Vec<StateCost>` JSON
pub async fn get_states(State(state): State<Arc<AppState>>) -> Json<Vec<StateCost>> {
    let costs = state
        .report
        .state_costs
        .iter()
        .map(|(s, c)| StateCost {
            state: s.clone(),
            weighted_cost: *c,
        })
        .collect();
    Json(costs)
}

/// Returns per-building results, optionally filtered.
///
/// `GET /buildings` → 200 + `Vec<BuildingRecord>` JSON
/// `GET /buildings?state=CO&upgrade_required=true` → filtered
/// `GET /buildings?upgrade_required=maybe` → 400 + `ErrorResponse`
/// `GET /buildings?state=ZZ` → 400 when no building is in the state
pub async fn get_buildings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BuildingQuery>,
) -> impl IntoResponse {
    let bad_request = |error: String| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error }));

    let upgrade = query
        .upgrade_filter()
        .map_err(|v| bad_request(format!("`upgrade_required` must be true/false or 1/0, got \"{v}\"")))?;

    if let Some(s) = query.state.as_deref() {
        if !state.buildings.iter().any(|b| b.state == s) {
            return Err(bad_request(format!("no modeled buildings in state \"{s}\"")));
        }
    }

    let records: Vec<BuildingRecord> = state
        .buildings
        .iter()
        .filter(|b| query.state.as_deref().is_none_or(|s| b.state == s))
        .filter(|b| upgrade.is_none_or(|u| b.upgrade_required == u))
        .cloned()
        .collect();

    Ok(Json(records))
}
