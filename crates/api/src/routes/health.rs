//! `GET /health`, mounted at the root rather than under `/api`.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when a dependency check failed.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Round trip of the `SELECT 1` check.
    pub db_latency_ms: u128,
    /// Whether the attachment directory exists and is usable.
    pub uploads_ready: bool,
}

/// 200 when healthy, 503 when degraded. The body is the same either way.
async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let started = Instant::now();
    let db_healthy = match sitetrack_db::health_check(&state.pool).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Database health check failed");
            false
        }
    };
    let db_latency_ms = started.elapsed().as_millis();

    let uploads_ready = match state.attachments.ensure_root().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "Upload directory unavailable");
            false
        }
    };

    let healthy = db_healthy && uploads_ready;
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(HealthResponse {
            status: if healthy { "ok" } else { "degraded" },
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
            db_latency_ms,
            uploads_ready,
        }),
    )
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
