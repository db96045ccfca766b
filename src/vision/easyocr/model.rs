//! End-to-end multi-language OCR pipeline
//!
//! Detection finds text boxes, each box is cropped from the original image
//! and run through the recognizers for the configured script groups; the
//! highest-confidence reading wins.

use anyhow::{Context, Result};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

use super::detection::{TextDetector, DETECTION_MODEL_FILE};
use super::languages::{filter_supported, script_groups_for, ScriptGroup};
use super::preprocessing::{preprocess_for_detection, preprocess_for_recognition};
use super::recognition::TextRecognizer;
use crate::vision::{BoundingBox, OcrEngine, OcrResult, TextRegion};

/// Padding in pixels added around detected boxes before cropping
const CROP_MARGIN: u32 = 2;

/// Multi-language OCR engine over CRAFT detection and CRNN recognition.
pub struct EasyOcrEngine {
    detector: TextDetector,
    recognizers: Vec<(ScriptGroup, TextRecognizer)>,
    languages: Vec<String>,
    model_name: String,
}

impl std::fmt::Debug for EasyOcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EasyOcrEngine")
            .field("languages", &self.languages)
            .field("recognizers", &self.recognizers.len())
            .finish_non_exhaustive()
    }
}

impl EasyOcrEngine {
    /// Load the detector and one recognizer per script group covering
    /// `languages` from checkpoint files in `model_dir`.
    pub fn new(model_dir: &str, languages: &[String], use_gpu: bool) -> Result<Self> {
        let model_dir = Path::new(model_dir);
        let languages = filter_supported(languages);

        info!(
            "Initializing OCR engine for languages {:?} from {}",
            languages,
            model_dir.display()
        );

        let detector = TextDetector::new(model_dir.join(DETECTION_MODEL_FILE), use_gpu)
            .context("Failed to load detection model")?;

        let mut recognizers = Vec::new();
        for group in script_groups_for(&languages) {
            let recognizer = TextRecognizer::new(
                model_dir.join(group.model_file()),
                model_dir.join(group.dict_file()),
                use_gpu,
            )
            .context(format!("Failed to load recognizer for {:?}", group))?;
            recognizers.push((group, recognizer));
        }

        info!(
            "OCR engine ready with {} recognizer(s)",
            recognizers.len()
        );

        Ok(Self {
            detector,
            recognizers,
            languages,
            model_name: "easyocr".to_string(),
        })
    }

    /// Crop a detected box out of the original image, clamped to bounds.
    fn crop_region(
        image: &DynamicImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) -> Option<(DynamicImage, BoundingBox)> {
        let (img_w, img_h) = image.dimensions();

        let x0 = (x.max(0.0) as u32).saturating_sub(CROP_MARGIN).min(img_w);
        let y0 = (y.max(0.0) as u32).saturating_sub(CROP_MARGIN).min(img_h);
        let x1 = (((x + width).max(0.0) as u32) + CROP_MARGIN).min(img_w);
        let y1 = (((y + height).max(0.0) as u32) + CROP_MARGIN).min(img_h);

        if x1 <= x0 + 1 || y1 <= y0 + 1 {
            return None;
        }

        let bbox = BoundingBox {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        };

        Some((image.crop_imm(x0, y0, bbox.width, bbox.height), bbox))
    }

    /// Run each recognizer on a crop and keep the best-confidence reading.
    fn recognize_best(&self, crop: &DynamicImage) -> Result<(String, f32)> {
        let tensor = preprocess_for_recognition(crop);

        let mut best_text = String::new();
        let mut best_confidence = 0.0f32;

        for (group, recognizer) in &self.recognizers {
            let recognized = recognizer
                .recognize(&tensor)
                .context(format!("Recognition failed for {:?}", group))?;

            if !recognized.is_empty() && recognized.confidence > best_confidence {
                best_confidence = recognized.confidence;
                best_text = recognized.text;
            }
        }

        Ok((best_text, best_confidence))
    }
}

impl OcrEngine for EasyOcrEngine {
    fn process(&self, image: &DynamicImage) -> Result<OcrResult> {
        let start = Instant::now();

        let (det_input, scale) = preprocess_for_detection(image);
        let boxes = self.detector.detect(&det_input)?;

        debug!("Detection produced {} candidate boxes", boxes.len());

        let mut regions = Vec::new();

        for text_box in &boxes {
            let (orig_x, orig_y) = scale.to_original(text_box.x, text_box.y);
            let orig_w = text_box.width / scale.ratio;
            let orig_h = text_box.height / scale.ratio;

            let Some((crop, bbox)) = Self::crop_region(image, orig_x, orig_y, orig_w, orig_h)
            else {
                continue;
            };

            let (text, confidence) = self.recognize_best(&crop)?;

            if text.is_empty() {
                continue;
            }

            regions.push(TextRegion {
                text,
                confidence,
                bounding_box: bbox,
            });
        }

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

        Ok(OcrResult {
            text,
            confidence,
            regions,
            processing_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn supported_languages(&self) -> &[String] {
        &self.languages
    }
}
