//! Vision processing module for CPU/GPU image-to-text pipelines
//!
//! Two engines implement the [`OcrEngine`] seam:
//! - `easyocr`: multi-language detection + CTC recognition
//! - `trocr`: transformer encoder-decoder for handwritten text
//!
//! Model inference is delegated to ONNX Runtime sessions; this module owns
//! only preprocessing, postprocessing, and pipeline assembly.

pub mod easyocr;
pub mod image_utils;
pub(crate) mod session;
pub mod trocr;

use anyhow::Result;
use image::DynamicImage;

pub use image_utils::{decode_image_bytes, detect_format, ImageError, ImageInfo};

/// Bounding box for detected text
#[derive(Debug, Clone)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// A detected text region with bounding box
#[derive(Debug, Clone)]
pub struct TextRegion {
    /// Extracted text content
    pub text: String,
    /// Confidence score (0.0-1.0)
    pub confidence: f32,
    /// Bounding box location
    pub bounding_box: BoundingBox,
}

/// Result of OCR processing
#[derive(Debug, Clone)]
pub struct OcrResult {
    /// Full extracted text (all regions combined)
    pub text: String,
    /// Average confidence score
    pub confidence: f32,
    /// Individual text regions
    pub regions: Vec<TextRegion>,
    /// Processing time in milliseconds
    pub processing_time_ms: u64,
}

/// The engine seam shared by both service variants.
///
/// One engine instance lives for the whole process and is shared across
/// request handlers behind an `Arc`; implementations guard their ONNX
/// sessions internally.
pub trait OcrEngine: Send + Sync {
    /// Extract text from a decoded image.
    fn process(&self, image: &DynamicImage) -> Result<OcrResult>;

    /// Model identifier reported in responses and health checks.
    fn model_name(&self) -> &str;

    /// ISO 639-1 codes this engine can recognize.
    fn supported_languages(&self) -> &[String];
}
