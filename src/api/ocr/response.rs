//! Response types for POST /ocr

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrResponse {
    /// All recognized text, regions joined in reading order
    pub text: String,
    /// Mean confidence over the surviving regions (0.0-1.0)
    pub confidence: f32,
    /// Total request handling time in milliseconds
    pub processing_time: u64,
    /// Number of regions in the result
    pub regions: usize,
    /// Languages the request was processed with
    pub language: Vec<String>,
    /// Whether this response came from the result cache
    pub cached: bool,
    /// Present when no text was found
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub metadata: OcrMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OcrMetadata {
    /// Model inference time in milliseconds
    pub ocr_time: u64,
    pub image_width: u32,
    pub image_height: u32,
    pub image_format: String,
    /// Regions the detector produced before confidence filtering
    pub detected_regions: usize,
    /// Regions dropped by the confidence filter
    pub filtered_regions: usize,
    pub model: String,
}
