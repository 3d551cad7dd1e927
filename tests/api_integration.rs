//! Integration tests for the REST API feature over a sample model run.

#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::util::ServiceExt;

use bicep::api::{AppState, router};
use bicep::model::run_ensemble;

use common::{sample_config, sample_dataset};

/// Runs a three-iteration ensemble and returns the API state.
fn build_api_state() -> Arc<AppState> {
    let mut config = sample_config();
    config.model.iterations = 3;
    let dataset = sample_dataset(&config);
    let ensemble = run_ensemble(&config, &dataset).expect("ensemble should run");

    Arc::new(AppState {
        config,
        report: ensemble.first.report,
        summary: Some(ensemble.summary),
        buildings: ensemble.first.buildings,
    })
}

async fn get(uri: &str) -> (StatusCode, Value) {
    let app = router(build_api_state());
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn summary_contains_config_report_and_ensemble() {
    let (status, json) = get("/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["config"]["model"]["scenario"], "bau");
    assert_eq!(json["report"]["buildings_modeled"], 25);
    assert_eq!(json["ensemble"]["iterations"], 3);
}

#[tokio::test]
async fn states_sum_to_total_cost() {
    let (_, summary) = get("/summary").await;
    let (status, states) = get("/states").await;
    assert_eq!(status, StatusCode::OK);

    let rows = states.as_array().cloned().unwrap_or_default();
    assert!(!rows.is_empty());
    let sum: f64 = rows
        .iter()
        .filter_map(|r| r["weighted_cost"].as_f64())
        .sum();
    let total = summary["report"]["total_cost"].as_f64().unwrap_or_default();
    assert!((sum - total).abs() < 1e-6 * total.max(1.0));
}

#[tokio::test]
async fn buildings_filter_by_upgrade() {
    let (_, all) = get("/buildings").await;
    let (status, upgraded) = get("/buildings?upgrade_required=1").await;
    let (_, not_upgraded) = get("/buildings?upgrade_required=false").await;
    assert_eq!(status, StatusCode::OK);

    let len = |v: &Value| v.as_array().map_or(0, Vec::len);
    assert_eq!(len(&all), 25);
    assert_eq!(len(&upgraded) + len(&not_upgraded), 25);
    assert!(
        upgraded
            .as_array()
            .into_iter()
            .flatten()
            .all(|b| b["upgrade_required"] == true)
    );
}

#[tokio::test]
async fn buildings_filter_by_state() {
    let (status, json) = get("/buildings?state=TX").await;
    assert_eq!(status, StatusCode::OK);
    let rows = json.as_array().cloned().unwrap_or_default();
    assert!(!rows.is_empty());
    assert!(rows.iter().all(|b| b["state"] == "TX"));
}

#[tokio::test]
async fn invalid_filter_is_rejected() {
    let (status, json) = get("/buildings?upgrade_required=sometimes").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|e| e.contains("upgrade_required"))
    );
}
