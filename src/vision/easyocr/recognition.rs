//! CRNN text recognition with CTC greedy decoding

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::preprocessing::REC_INPUT_HEIGHT;
use crate::vision::session::build_session;

/// Recognized text with confidence score
#[derive(Debug, Clone)]
pub struct RecognizedText {
    /// The recognized text content
    pub text: String,
    /// Overall confidence score (0.0-1.0)
    pub confidence: f32,
}

impl RecognizedText {
    pub fn new(text: String, confidence: f32) -> Self {
        Self { text, confidence }
    }

    /// Check if the text is empty or whitespace only
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// CRNN recognition model for one script family.
#[derive(Clone)]
pub struct TextRecognizer {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Character dictionary for CTC decoding, blank at index 0
    dictionary: Arc<Vec<char>>,
    /// Model input name
    input_name: String,
}

impl std::fmt::Debug for TextRecognizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRecognizer")
            .field("dictionary_size", &self.dictionary.len())
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl TextRecognizer {
    /// Load a recognition model and its character dictionary.
    pub fn new<P: AsRef<Path>>(model_path: P, dict_path: P, use_gpu: bool) -> Result<Self> {
        let dict_path = dict_path.as_ref();
        if !dict_path.exists() {
            anyhow::bail!("Character dictionary not found: {}", dict_path.display());
        }

        let dictionary = Self::load_dictionary(dict_path)?;
        info!(
            "Loaded character dictionary with {} characters",
            dictionary.len()
        );

        let session = build_session(model_path.as_ref(), use_gpu)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input".to_string());

        debug!("Recognition model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            dictionary: Arc::new(dictionary),
            input_name,
        })
    }

    /// Load character dictionary from file.
    ///
    /// One character per line; index 0 is reserved for the CTC blank token.
    fn load_dictionary<P: AsRef<Path>>(path: P) -> Result<Vec<char>> {
        let file = File::open(path.as_ref()).context(format!(
            "Failed to open dictionary: {}",
            path.as_ref().display()
        ))?;

        let reader = BufReader::new(file);
        let mut dictionary = vec!['\0']; // Index 0 is blank token for CTC

        for line in reader.lines() {
            let line = line.context("Failed to read dictionary line")?;
            if let Some(ch) = line.chars().next() {
                dictionary.push(ch);
            }
        }

        if !dictionary.contains(&' ') {
            dictionary.push(' ');
        }

        Ok(dictionary)
    }

    /// Get the dictionary size
    pub fn dictionary_size(&self) -> usize {
        self.dictionary.len()
    }

    /// Recognize text from a preprocessed crop tensor.
    ///
    /// Expects shape [1, 1, 64, W] from `preprocess_for_recognition()`.
    pub fn recognize(&self, input: &Array4<f32>) -> Result<RecognizedText> {
        let shape = input.shape();
        if shape.len() != 4
            || shape[0] != 1
            || shape[1] != 1
            || shape[2] != REC_INPUT_HEIGHT as usize
            || shape[3] < 4
        {
            anyhow::bail!(
                "Invalid input shape: {:?}, expected [1, 1, {}, W>=4]",
                shape,
                REC_INPUT_HEIGHT
            );
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Recognition session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Recognition inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let (text, confidence) = self.ctc_decode(output_tensor.view())?;

        Ok(RecognizedText { text, confidence })
    }

    /// CTC greedy decoding: best path with repeat collapsing and blank
    /// removal. The model emits a distribution over dictionary entries at
    /// each timestep.
    fn ctc_decode(&self, output: ArrayViewD<f32>) -> Result<(String, f32)> {
        let output_shape = output.shape();

        // Expected shape: [batch, seq_len, num_classes] or [seq_len, num_classes]
        let (seq_len, num_classes) = if output_shape.len() == 3 {
            (output_shape[1], output_shape[2])
        } else if output_shape.len() == 2 {
            (output_shape[0], output_shape[1])
        } else {
            anyhow::bail!("Unexpected output shape: {:?}", output_shape);
        };

        let mut text = String::new();
        let mut total_confidence = 0.0f32;
        let mut emitted = 0usize;
        let mut prev_index: Option<usize> = None;

        for t in 0..seq_len {
            let mut max_prob = f32::NEG_INFINITY;
            let mut max_index = 0usize;

            for c in 0..num_classes {
                let prob = if output_shape.len() == 3 {
                    output[IxDyn(&[0, t, c])]
                } else {
                    output[IxDyn(&[t, c])]
                };

                if prob > max_prob {
                    max_prob = prob;
                    max_index = c;
                }
            }

            // Skip blank (index 0) and collapse repeats
            if max_index != 0 && Some(max_index) != prev_index {
                if max_index < self.dictionary.len() {
                    text.push(self.dictionary[max_index]);
                    total_confidence += max_prob;
                    emitted += 1;
                }
            }

            prev_index = if max_index == 0 {
                None
            } else {
                Some(max_index)
            };
        }

        let avg_confidence = if emitted == 0 {
            0.0
        } else {
            total_confidence / emitted as f32
        };

        // Map log probabilities into (0, 1) if the model emits logits
        let avg_confidence = if avg_confidence < 0.0 {
            1.0 / (1.0 + (-avg_confidence).exp())
        } else {
            avg_confidence.min(1.0)
        };

        Ok((text.trim().to_string(), avg_confidence))
    }
}
