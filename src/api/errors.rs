//! API error taxonomy and wire format
//!
//! Every failure surfaces as a JSON body with a stable `errorType`, a
//! human-readable message and a request id for log correlation.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_type: String,
    pub message: String,
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    ValidationError { field: String, message: String },
    Unauthorized(String),
    /// `size` is `None` when the stream-level body limit tripped before the
    /// upload could be read in full.
    PayloadTooLarge { size: Option<usize>, max: usize },
    RateLimitExceeded { retry_after: u64 },
    ServiceUnavailable(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self, request_id: Option<String>) -> ErrorResponse {
        let (error_type, message, details) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone(), None),
            ApiError::ValidationError { field, message } => {
                let mut details = HashMap::new();
                details.insert(
                    "field".to_string(),
                    serde_json::Value::String(field.clone()),
                );
                ("validation_error", message.clone(), Some(details))
            }
            ApiError::Unauthorized(msg) => ("unauthorized", msg.clone(), None),
            ApiError::PayloadTooLarge { size, max } => {
                let mut details = HashMap::new();
                if let Some(size) = size {
                    details.insert("size".to_string(), serde_json::Value::Number((*size).into()));
                }
                details.insert(
                    "maxSize".to_string(),
                    serde_json::Value::Number((*max).into()),
                );
                let message = match size {
                    Some(size) => format!("File too large: {} bytes (max: {} bytes)", size, max),
                    None => format!("File too large (max: {} bytes)", max),
                };
                ("payload_too_large", message, Some(details))
            }
            ApiError::RateLimitExceeded { retry_after } => {
                let mut details = HashMap::new();
                details.insert(
                    "retryAfter".to_string(),
                    serde_json::Value::Number((*retry_after).into()),
                );
                (
                    "rate_limit_exceeded",
                    "Rate limit exceeded".to_string(),
                    Some(details),
                )
            }
            ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone(), None),
            ApiError::InternalError(msg) => ("internal_error", msg.clone(), None),
        };

        ErrorResponse {
            error_type: error_type.to_string(),
            message,
            request_id,
            details,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::PayloadTooLarge { .. } => 413,
            ApiError::RateLimitExceeded { .. } => 429,
            ApiError::InternalError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::PayloadTooLarge {
                size: Some(size),
                max,
            } => {
                write!(f, "Payload too large: {} bytes (max: {})", size, max)
            }
            ApiError::PayloadTooLarge { size: None, max } => {
                write!(f, "Payload too large (max: {})", max)
            }
            ApiError::RateLimitExceeded { retry_after } => write!(
                f,
                "Rate limit exceeded, retry after {} seconds",
                retry_after
            ),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let request_id = Uuid::new_v4().to_string();
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = self.to_response(Some(request_id));

        let mut response = (status, Json(body)).into_response();

        if let ApiError::RateLimitExceeded { retry_after } = self {
            if let Ok(value) = header::HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}
