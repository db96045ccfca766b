//! HTTP API surface
//!
//! Routes:
//! - `GET /health` - readiness and model status
//! - `POST /ocr` - multipart image upload, returns extracted text
//! - `GET /languages` - supported codes (multi-language variant only)
//! - `GET /metrics` - Prometheus text exposition

pub mod auth;
pub mod errors;
pub mod handlers;
pub mod ocr;
pub mod rate_limiter;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use server::{create_router, start_server, AppState};
