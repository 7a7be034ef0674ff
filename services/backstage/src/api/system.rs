//! Health API handlers.
//!
//! # Purpose
//! Liveness answers from process state alone; readiness also probes the
//! backing store so orchestrators stop routing when storage is gone.
use crate::api::types::{HealthCheck, HealthReport};
use crate::app::AppState;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

const APP_CHECK: &str = "APP";
const STORE_CHECK: &str = "STORE";

#[utoipa::path(
    get,
    path = "/health/live",
    tag = "health",
    responses((status = 200, description = "Process is running", body = HealthReport))
)]
pub(crate) async fn liveness() -> Json<HealthReport> {
    Json(HealthReport::from_checks(vec![HealthCheck::new(
        APP_CHECK, true,
    )]))
}

#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "Ready to serve", body = HealthReport),
        (status = 503, description = "Storage unavailable", body = HealthReport)
    )
)]
pub(crate) async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<HealthReport>) {
    let store_up = match state.store.health_check().await {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(
                error = %err,
                backend = state.store.backend_name(),
                "storage health check failed"
            );
            false
        }
    };
    let report = HealthReport::from_checks(vec![
        HealthCheck::new(APP_CHECK, true),
        HealthCheck::new(STORE_CHECK, store_up),
    ]);
    let status = if report.is_up() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}
