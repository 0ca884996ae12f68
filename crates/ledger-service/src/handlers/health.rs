//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Storage backend and its state.
    pub storage: StorageHealth,
}

/// Storage part of the health response.
#[derive(Debug, Serialize)]
pub struct StorageHealth {
    /// Backend name.
    pub backend: String,
    /// `ok` or `unavailable`.
    pub status: String,
}

/// Health check endpoint. Returns 503 when the store cannot serve requests.
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let (code, status) = match state.store.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: if code == StatusCode::OK { "ok" } else { "degraded" }.to_string(),
            service: "ledger".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            storage: StorageHealth {
                backend: state.store.backend().to_string(),
                status: status.to_string(),
            },
        }),
    )
}
