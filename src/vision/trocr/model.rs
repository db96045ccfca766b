//! Handwriting OCR pipeline
//!
//! Wires the vision encoder and text decoder into a single engine. Missing
//! checkpoint files can be fetched from the HuggingFace hub on startup.

use anyhow::{Context, Result};
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

use super::decoder::TextDecoder;
use super::encoder::VisionEncoder;
use super::preprocessing::preprocess_image;
use crate::vision::{BoundingBox, OcrEngine, OcrResult, TextRegion};

/// Hub repository holding the ONNX export
pub const TROCR_REPO: &str = "microsoft/trocr-base-handwritten";

/// Checkpoint file names inside the model directory
pub const ENCODER_MODEL_FILE: &str = "encoder_model.onnx";
pub const DECODER_MODEL_FILE: &str = "decoder_model.onnx";
pub const TOKENIZER_FILE: &str = "tokenizer.json";

/// Transformer OCR engine for handwritten text.
///
/// Treats the whole image as one text line, which is what the underlying
/// model was trained on.
pub struct TrOcrEngine {
    encoder: VisionEncoder,
    decoder: TextDecoder,
    languages: Vec<String>,
    model_name: String,
}

impl std::fmt::Debug for TrOcrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrOcrEngine")
            .field("model_name", &self.model_name)
            .finish_non_exhaustive()
    }
}

impl TrOcrEngine {
    /// Load the engine, fetching missing checkpoint files from the hub
    /// when `download_enabled` is set.
    pub async fn new(model_dir: &str, use_gpu: bool, download_enabled: bool) -> Result<Self> {
        let model_dir = Path::new(model_dir);

        let encoder_path =
            resolve_model_file(model_dir, ENCODER_MODEL_FILE, download_enabled).await?;
        let decoder_path =
            resolve_model_file(model_dir, DECODER_MODEL_FILE, download_enabled).await?;
        let tokenizer_path =
            resolve_model_file(model_dir, TOKENIZER_FILE, download_enabled).await?;

        let encoder = VisionEncoder::new(&encoder_path, use_gpu)
            .context("Failed to load vision encoder")?;
        let decoder = TextDecoder::new(&decoder_path, &tokenizer_path, use_gpu)
            .context("Failed to load text decoder")?;

        info!("Handwriting OCR engine ready");

        Ok(Self {
            encoder,
            decoder,
            languages: vec!["en".to_string()],
            model_name: "trocr-base-handwritten".to_string(),
        })
    }
}

/// Locate a checkpoint file, preferring the local model directory and
/// falling back to the hub cache when downloads are allowed.
async fn resolve_model_file(
    model_dir: &Path,
    file_name: &str,
    download_enabled: bool,
) -> Result<PathBuf> {
    let local = model_dir.join(file_name);
    if local.exists() {
        return Ok(local);
    }

    if !download_enabled {
        anyhow::bail!(
            "Model file not found and downloads disabled: {}",
            local.display()
        );
    }

    info!("Fetching {} from {}", file_name, TROCR_REPO);

    let api = hf_hub::api::tokio::Api::new().context("Failed to initialize hub client")?;
    let repo = api.model(TROCR_REPO.to_string());

    // ONNX exports live under onnx/ in the repo; the tokenizer at the root
    let repo_path = if file_name.ends_with(".onnx") {
        format!("onnx/{}", file_name)
    } else {
        file_name.to_string()
    };

    repo.get(&repo_path)
        .await
        .context(format!("Failed to download {} from {}", repo_path, TROCR_REPO))
}

impl OcrEngine for TrOcrEngine {
    fn process(&self, image: &DynamicImage) -> Result<OcrResult> {
        let start = Instant::now();

        let input = preprocess_image(image);
        let embeddings = self.encoder.encode(&input)?;
        let decoded = self.decoder.generate(&embeddings)?;

        let mut regions = Vec::new();
        if !decoded.text.is_empty() {
            regions.push(TextRegion {
                text: decoded.text.clone(),
                confidence: decoded.confidence,
                bounding_box: BoundingBox {
                    x: 0,
                    y: 0,
                    width: image.width(),
                    height: image.height(),
                },
            });
        }

        let confidence = if regions.is_empty() {
            0.0
        } else {
            decoded.confidence
        };

        Ok(OcrResult {
            text: decoded.text,
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
