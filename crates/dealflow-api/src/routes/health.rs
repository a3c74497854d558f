use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Health check endpoint
///
/// Returns the health status of the API and its thread store
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    ),
    tag = "health"
)]
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Json<HealthResponse> {
    let mut services = HashMap::new();

    let store_ok = match state.sessions.ping().await {
        Ok(_) => true,
        Err(e) => {
            tracing::warn!("Thread store health check failed: {}", e);
            false
        }
    };
    services.insert(
        "thread_store".to_string(),
        if store_ok { "connected" } else { "disconnected" }.to_string(),
    );

    Json(HealthResponse {
        status: if store_ok { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}
