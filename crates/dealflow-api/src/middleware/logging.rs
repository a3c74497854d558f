use axum::{
    extract::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::identity::SUBJECT_HEADER;

/// Request logging middleware
///
/// Records whether the gateway attached an identity, never the identity itself.
pub async fn log_request(
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let authenticated = req.headers().contains_key(SUBJECT_HEADER);
    let start = Instant::now();

    let response = next.run(req).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            path = %path,
            status = %status,
            authenticated,
            duration_ms = %duration_ms,
            "Request failed"
        );
    } else {
        tracing::info!(
            method = %method,
            path = %path,
            status = %status,
            authenticated,
            duration_ms = %duration_ms,
            "Request processed"
        );
    }

    response
}
