//! POST /ocr request handling
//!
//! Order of checks: rate limit, multipart parsing (including the upload
//! size cap), image validation, cache lookup, then engine availability.
//! A valid image against an unloaded engine is a 503, not a 400.

use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::Multipart;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{debug, error, info};

use super::request::{parse_multipart, OcrUpload};
use super::response::{OcrMetadata, OcrResponse};
use crate::api::auth::extract_token;
use crate::api::errors::ApiError;
use crate::api::server::AppState;
use crate::cache::ResultCache;
use crate::monitoring::metrics::{
    OCR_CACHE_HITS_TOTAL, OCR_DURATION, OCR_ERRORS_TOTAL, OCR_REQUESTS_TOTAL, OCR_SUCCESS_TOTAL,
    RATE_LIMITED_TOTAL,
};
use crate::vision::easyocr::languages::filter_supported;
use crate::vision::image_utils::{decode_image_bytes, format_to_extension};
use crate::vision::TextRegion;

/// Regions at or below this confidence are dropped from responses
pub const CONFIDENCE_FILTER: f32 = 0.1;

pub async fn ocr_handler(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<OcrResponse>, ApiError> {
    let start = Instant::now();
    OCR_REQUESTS_TOTAL.inc();
    let _timer = OCR_DURATION.start_timer();

    // Rate limit per API key when auth is enabled, per client IP otherwise.
    // With auth off, header tokens are unverified and must not pick the key.
    let client_key = state
        .config
        .auth_enabled()
        .then(|| extract_token(&headers))
        .flatten()
        .or_else(|| connect_info.map(|ConnectInfo(addr)| addr.ip().to_string()))
        .unwrap_or_else(|| "local".to_string());

    if let Err(err) = state.rate_limiter.check(&client_key) {
        RATE_LIMITED_TOTAL.inc();
        return Err(err);
    }

    let upload: OcrUpload = parse_multipart(multipart, state.config.max_upload_bytes).await?;
    let languages = filter_supported(&upload.languages);

    debug!(
        "OCR request: {} bytes, languages {:?}, file {:?}",
        upload.image_bytes.len(),
        languages,
        upload.file_name
    );

    // Decode and validate before touching the engine
    let (image, info) = decode_image_bytes(&upload.image_bytes).map_err(|e| {
        ApiError::InvalidRequest(e.to_string())
    })?;

    let cache_key = ResultCache::<OcrResponse>::key(&upload.image_bytes, &languages);
    if let Some(mut cached) = state.cache.get(&cache_key) {
        OCR_CACHE_HITS_TOTAL.inc();
        cached.cached = true;
        cached.processing_time = start.elapsed().as_millis() as u64;
        return Ok(Json(cached));
    }

    let engine = {
        let slot = state.engine.read().await;
        slot.clone()
    };
    let Some(engine) = engine else {
        return Err(ApiError::ServiceUnavailable(
            "OCR engine is not loaded".to_string(),
        ));
    };

    let result = engine.process(&image).map_err(|e| {
        OCR_ERRORS_TOTAL.inc();
        error!("OCR processing failed: {:#}", e);
        ApiError::InternalError("OCR processing failed".to_string())
    })?;

    let detected_regions = result.regions.len();
    let regions: Vec<TextRegion> = result
        .regions
        .into_iter()
        .filter(|r| r.confidence > CONFIDENCE_FILTER)
        .collect();

    let text = regions
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let confidence = if regions.is_empty() {
        0.0
    } else {
        regions.iter().map(|r| r.confidence).sum::<f32>() / regions.len() as f32
    };

    let message = if text.is_empty() {
        Some("No text detected in image".to_string())
    } else {
        None
    };

    let response = OcrResponse {
        text,
        confidence,
        processing_time: start.elapsed().as_millis() as u64,
        regions: regions.len(),
        language: languages.clone(),
        cached: false,
        message,
        metadata: OcrMetadata {
            ocr_time: result.processing_time_ms,
            image_width: info.width,
            image_height: info.height,
            image_format: format_to_extension(info.format).to_string(),
            detected_regions,
            filtered_regions: detected_regions - regions.len(),
            model: engine.model_name().to_string(),
        },
    };

    state.cache.put(cache_key, response.clone());
    OCR_SUCCESS_TOTAL.inc();

    info!(
        "OCR complete: {} region(s), confidence {:.2}, {}ms",
        response.regions, response.confidence, response.processing_time
    );

    Ok(Json(response))
}
