pub mod config;
pub mod error;
pub mod identity;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::{
    routing::{delete, get, post},
    Json, Router,
};
use std::{sync::Arc, time::Duration};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::config::Config;
use crate::routes::{health, session};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        session::current_thread,
        session::resolve_thread,
        session::list_threads,
        session::clear_memory,
    ),
    components(schemas(
        health::HealthResponse,
        session::ThreadResponse,
        session::ResolveResponse,
        session::ClearMemoryResponse,
        session::ListThreadsResponse,
    )),
    tags(
        (name = "health", description = "Service status"),
        (name = "session", description = "Assistant session lifecycle")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health
        .route("/health", get(health::health_check))
        .route("/api-docs/openapi.json", get(openapi_json))
        // Session
        .route("/session/current", get(session::current_thread))
        .route("/session/resolve", post(session::resolve_thread))
        .route("/session/threads", get(session::list_threads))
        .route("/session/memory", delete(session::clear_memory));

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    api_routes
        .layer(axum::middleware::from_fn(middleware::logging::log_request))
        .layer(TimeoutLayer::new(timeout))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.cors.enabled {
        let cors = CorsLayer::new()
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers(Any);

        if config.cors.origins.iter().any(|o| o == "*") {
            cors.allow_origin(Any)
        } else {
            let parsed_origins: Vec<axum::http::HeaderValue> = config.cors.origins
                .iter()
                .filter_map(|o| o.parse::<axum::http::HeaderValue>().ok())
                .collect();

            cors.allow_origin(parsed_origins)
        }
    } else {
        CorsLayer::new()
    }
}
