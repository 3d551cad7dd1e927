//! API response and query types.

use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::model::{CostReport, EnsembleSummary};

/// Configuration, cost report, and ensemble summary of the run.
#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub config: ModelConfig,
    pub report: CostReport,
    /// Present when the run had more than one iteration.
    pub ensemble: Option<EnsembleSummary>,
}

/// Weighted upgrade cost of one state.
#[derive(Debug, Serialize)]
pub struct StateCost {
    pub state: String,
    pub weighted_cost: f64,
}

/// Optional filters for the buildings endpoint.
///
/// `upgrade_required` accepts `true`/`false` or `1`/`0`.
#[derive(Debug, Deserialize)]
pub struct BuildingQuery {
    pub state: Option<String>,
    pub upgrade_required: Option<String>,
}

impl BuildingQuery {
    /// Parsed upgrade filter; `Err` carries the rejected value.
    pub fn upgrade_filter(&self) -> Result<Option<bool>, String> {
        match self.upgrade_required.as_deref() {
            None => Ok(None),
            Some("true" | "1") => Ok(Some(true)),
            Some("false" | "0") => Ok(Some(false)),
            Some(other) => Err(other.to_string()),
        }
    }
}

/// Error response body for 400-class errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}
