//! Health, languages and metrics endpoints

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::server::AppState;
use crate::monitoring::encode_metrics;
use crate::version::VERSION;
use crate::vision::easyocr::languages::{DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model_loaded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub version: String,
    pub uptime_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguagesResponse {
    pub languages: Vec<String>,
    pub default: String,
}

/// GET /health
///
/// 200 with model details once the engine is loaded, 503 while it is not.
pub async fn health_handler(State(state): State<AppState>) -> Response {
    let uptime_secs = state.started_at.elapsed().as_secs();
    let engine = state.engine.read().await;

    match engine.as_ref() {
        Some(engine) => {
            let body = HealthResponse {
                status: "healthy".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                model_loaded: true,
                model: Some(engine.model_name().to_string()),
                version: VERSION.to_string(),
                uptime_secs,
                languages: Some(engine.supported_languages().to_vec()),
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        None => {
            let body = HealthResponse {
                status: "unhealthy".to_string(),
                timestamp: chrono::Utc::now().to_rfc3339(),
                model_loaded: false,
                model: None,
                version: VERSION.to_string(),
                uptime_secs,
                languages: None,
            };
            (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
        }
    }
}

/// GET /languages
pub async fn languages_handler() -> Json<LanguagesResponse> {
    Json(LanguagesResponse {
        languages: SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect(),
        default: DEFAULT_LANGUAGE.to_string(),
    })
}

/// GET /metrics
pub async fn metrics_handler() -> (StatusCode, String) {
    encode_metrics()
}
