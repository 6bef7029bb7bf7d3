//! Tiered rate limiting middleware.
//!
//! Each route group is wrapped in exactly one tier. The check runs before
//! the handler, so a rejected request never reaches a service.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use wastehub_service::{RateLimitGuard, RateLimitTier};

use crate::error::ApiError;
use crate::extractors::client_ip::resolve_client_ip;
use crate::state::AppState;

const LIMIT_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");

/// Middleware state: the guard plus the tier one route group maps to.
#[derive(Debug, Clone)]
pub struct TierState {
    guard: Arc<RateLimitGuard>,
    tier: RateLimitTier,
    trust_forwarded_for: bool,
}

impl TierState {
    /// State for wrapping a route group in `tier`.
    pub fn new(state: &AppState, tier: RateLimitTier) -> Self {
        Self {
            guard: state.rate_limiter.clone(),
            tier,
            trust_forwarded_for: state.config.server.trust_forwarded_for,
        }
    }
}

/// Charge the request to its tier, or reject it with `429`.
///
/// Failure-only tiers are checked up front and charged afterwards when the
/// handler answered `401`.
pub async fn enforce(State(limit): State<TierState>, request: Request, next: Next) -> Response {
    let key = resolve_client_ip(
        request.headers(),
        request.extensions(),
        limit.trust_forwarded_for,
    );

    let admitted = if limit.tier.counts_failures_only() {
        limit.guard.check(limit.tier, &key)
    } else {
        limit.guard.acquire(limit.tier, &key)
    };
    if let Err(err) = admitted {
        debug!(tier = %limit.tier, client = %key, path = %request.uri().path(), "Request rate limited");
        return ApiError(err).into_response();
    }

    let mut response = next.run(request).await;

    if limit.tier.counts_failures_only() && response.status() == StatusCode::UNAUTHORIZED {
        limit.guard.record_failure(limit.tier, &key);
    }

    let headers = response.headers_mut();
    headers.insert(
        LIMIT_HEADER,
        HeaderValue::from(limit.guard.ceiling(limit.tier)),
    );
    headers.insert(
        REMAINING_HEADER,
        HeaderValue::from(limit.guard.remaining(limit.tier, &key)),
    );
    response
}
