//! Multipart upload parsing for POST /ocr

use axum::body::Bytes;
use axum::http::StatusCode;
use axum_extra::extract::multipart::MultipartError;
use axum_extra::extract::Multipart;
use serde_json::Value;

use crate::api::errors::ApiError;

/// Parsed multipart form: the image bytes plus the requested languages.
#[derive(Debug)]
pub struct OcrUpload {
    pub image_bytes: Bytes,
    pub file_name: Option<String>,
    /// Raw language codes as sent by the client, not yet validated
    pub languages: Vec<String>,
}

/// Read the `image` and optional `languages` fields from a multipart body.
///
/// The `languages` field is a JSON array string (e.g. `["en","fr"]`); a
/// comma-separated list is accepted as a fallback. Malformed values are
/// ignored rather than rejected, validation happens against the supported
/// set later.
pub async fn parse_multipart(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<OcrUpload, ApiError> {
    let mut image_bytes: Option<Bytes> = None;
    let mut file_name: Option<String> = None;
    let mut languages: Vec<String> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_upload_bytes))?
    {
        match field.name() {
            Some("image") => {
                file_name = field.file_name().map(|n| n.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;

                if bytes.len() > max_upload_bytes {
                    return Err(ApiError::PayloadTooLarge {
                        size: Some(bytes.len()),
                        max: max_upload_bytes,
                    });
                }

                image_bytes = Some(bytes);
            }
            Some("languages") => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_upload_bytes))?;
                languages = parse_languages(&raw);
            }
            _ => {
                // Unknown fields are skipped
            }
        }
    }

    let image_bytes = image_bytes.ok_or_else(|| ApiError::ValidationError {
        field: "image".to_string(),
        message: "No image file provided".to_string(),
    })?;

    if image_bytes.is_empty() {
        return Err(ApiError::ValidationError {
            field: "image".to_string(),
            message: "Image file is empty".to_string(),
        });
    }

    Ok(OcrUpload {
        image_bytes,
        file_name,
        languages,
    })
}

/// Map a multipart read failure to an API error.
///
/// A tripped stream-level body limit surfaces here as a 413 rather than a
/// malformed-body 400; the exact upload size is unknown at that point.
fn multipart_error(err: MultipartError, max_upload_bytes: usize) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiError::PayloadTooLarge {
            size: None,
            max: max_upload_bytes,
        };
    }
    ApiError::InvalidRequest(format!("Malformed multipart body: {}", err))
}

/// Parse a languages field value: JSON array first, comma list second.
fn parse_languages(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) {
        return items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.to_string()))
            .collect();
    }

    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
