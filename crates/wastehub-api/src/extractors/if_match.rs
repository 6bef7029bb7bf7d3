//! Optimistic concurrency precondition from the `If-Match` header.

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::IF_MATCH;
use axum::http::request::Parts;

use wastehub_core::error::AppError;

use crate::error::ApiError;

/// Expected task version taken from `If-Match`, if the header is present.
///
/// Accepts `3`, `"3"` and `W/"3"`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IfMatch(pub Option<i64>);

impl IfMatch {
    /// Combine with a version given in the body or query. The body wins.
    pub fn or(self, explicit: Option<i64>) -> Option<i64> {
        explicit.or(self.0)
    }
}

/// Parse the header value into a version number.
pub fn parse_if_match(headers: &HeaderMap) -> Result<Option<i64>, AppError> {
    let Some(value) = headers.get(IF_MATCH) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| AppError::validation("If-Match header is not valid text"))?
        .trim();
    if raw == "*" {
        return Ok(None);
    }
    let tag = raw.strip_prefix("W/").unwrap_or(raw).trim_matches('"');
    tag.parse::<i64>()
        .map(Some)
        .map_err(|_| AppError::validation(format!("If-Match must be a task version, got '{raw}'")))
}

impl<S: Send + Sync> FromRequestParts<S> for IfMatch {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IfMatch(parse_if_match(&parts.headers)?))
    }
}
