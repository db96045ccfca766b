//! Vision transformer encoder
//!
//! Extracts patch embeddings from a preprocessed image for the text decoder.

use anyhow::{Context, Result};
use ndarray::{Array2, Array4, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use super::preprocessing::TROCR_INPUT_SIZE;
use crate::vision::session::build_session;

/// Vision encoder over an ONNX Runtime session.
#[derive(Clone)]
pub struct VisionEncoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for VisionEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisionEncoder")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl VisionEncoder {
    /// Load the encoder from a file.
    pub fn new<P: AsRef<Path>>(model_path: P, use_gpu: bool) -> Result<Self> {
        let session = build_session(model_path.as_ref(), use_gpu)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "pixel_values".to_string());

        debug!("Vision encoder loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Encode an image into patch embeddings of shape [seq_len, embed_dim].
    ///
    /// The input tensor should come from `preprocess_image()`.
    pub fn encode(&self, input: &Array4<f32>) -> Result<Array2<f32>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        if shape[2] != TROCR_INPUT_SIZE as usize || shape[3] != TROCR_INPUT_SIZE as usize {
            debug!(
                "Input size {}x{} differs from expected {}x{}",
                shape[2], shape[3], TROCR_INPUT_SIZE, TROCR_INPUT_SIZE
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Encoder session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Encoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let output_shape = output_tensor.shape().to_vec();
        debug!("Encoder output shape: {:?}", output_shape);

        // Expected [batch, seq_len, embed_dim], tolerate [seq_len, embed_dim]
        let (seq_len, embed_dim) = match output_shape.len() {
            3 => (output_shape[1], output_shape[2]),
            2 => (output_shape[0], output_shape[1]),
            _ => anyhow::bail!("Unexpected encoder output shape: {:?}", output_shape),
        };

        let mut embeddings = Array2::<f32>::zeros((seq_len, embed_dim));
        for s in 0..seq_len {
            for e in 0..embed_dim {
                embeddings[[s, e]] = match output_shape.len() {
                    3 => output_tensor[IxDyn(&[0, s, e])],
                    _ => output_tensor[IxDyn(&[s, e])],
                };
            }
        }

        Ok(embeddings)
    }
}
