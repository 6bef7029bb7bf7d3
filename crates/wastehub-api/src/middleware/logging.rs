//! Access log for the REST API.

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{debug, info, warn};

/// Log one line per request with its route template, status, and latency.
///
/// `5xx` is logged at `warn`, `429` at `debug` (the guard already logs it),
/// everything else at `info`.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status().as_u16();
    let duration_ms = started.elapsed().as_millis() as u64;
    match status {
        500.. => warn!(%method, %route, status, duration_ms, "Request failed"),
        429 => debug!(%method, %route, status, duration_ms, "Request throttled"),
        _ => info!(%method, %route, status, duration_ms, "Request served"),
    }

    response
}
