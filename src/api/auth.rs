//! Bearer token authentication middleware
//!
//! Active only when `OCR_AUTH_TOKEN` is configured; the token is accepted
//! either as `Authorization: Bearer <token>` or `X-API-Key: <token>`.
//! Comparison goes through SHA-256 digests so it does not leak length or
//! prefix timing.

use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use sha2::{Digest, Sha256};
use tracing::warn;

use super::errors::ApiError;
use super::server::AppState;
use crate::monitoring::metrics::AUTH_FAILURES_TOTAL;

pub async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(expected) = &state.config.auth_token else {
        return next.run(req).await;
    };

    match extract_token(req.headers()) {
        Some(token) if digest_eq(&token, expected) => next.run(req).await,
        Some(_) => {
            AUTH_FAILURES_TOTAL.inc();
            warn!("Rejected request with invalid token");
            ApiError::Unauthorized("Invalid token".to_string()).into_response()
        }
        None => {
            AUTH_FAILURES_TOTAL.inc();
            ApiError::Unauthorized("Missing authentication token".to_string()).into_response()
        }
    }
}

/// Pull the client token from Authorization or X-API-Key.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        if let Some(token) = auth.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
}

/// Constant-time token comparison via fixed-width digests.
fn digest_eq(provided: &str, expected: &str) -> bool {
    Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
}
