//! Autoregressive text decoder
//!
//! Generates the transcription token by token from the encoder's patch
//! embeddings, greedy decoding with light repetition masking.

use anyhow::{Context, Result};
use ndarray::{Array2, Array3, ArrayViewD, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokenizers::Tokenizer;
use tracing::debug;

use crate::vision::session::build_session;

/// Hard cap on generated tokens per image
pub const MAX_DECODE_TOKENS: usize = 128;

/// How many trailing tokens are masked to break short repetition loops
const REPETITION_WINDOW: usize = 5;

/// Decoded transcription with a confidence score.
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    /// Mean softmax probability of the selected tokens (0.0-1.0)
    pub confidence: f32,
}

/// Text decoder over an ONNX Runtime session plus tokenizer.
#[derive(Clone)]
pub struct TextDecoder {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Tokenizer for decoding generated IDs
    tokenizer: Arc<Tokenizer>,
    /// Special token IDs
    bos_token_id: u32,
    eos_token_id: u32,
}

impl std::fmt::Debug for TextDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDecoder")
            .field("bos_token_id", &self.bos_token_id)
            .field("eos_token_id", &self.eos_token_id)
            .finish_non_exhaustive()
    }
}

impl TextDecoder {
    /// Load the decoder model and tokenizer from files.
    pub fn new<P: AsRef<Path>>(model_path: P, tokenizer_path: P, use_gpu: bool) -> Result<Self> {
        let tokenizer_path = tokenizer_path.as_ref();
        if !tokenizer_path.exists() {
            anyhow::bail!("Tokenizer not found: {}", tokenizer_path.display());
        }

        let tokenizer = Tokenizer::from_file(tokenizer_path)
            .map_err(|e| anyhow::anyhow!("Failed to load tokenizer: {}", e))?;

        debug!(
            "Loaded tokenizer with {} tokens",
            tokenizer.get_vocab_size(true)
        );

        let session = build_session(model_path.as_ref(), use_gpu)?;

        let input_names: Vec<_> = session.inputs.iter().map(|i| &i.name).collect();
        debug!("Decoder inputs: {:?}", input_names);

        let bos_token_id = tokenizer
            .token_to_id("<s>")
            .or_else(|| tokenizer.token_to_id("[CLS]"))
            .unwrap_or(0);
        let eos_token_id = tokenizer
            .token_to_id("</s>")
            .or_else(|| tokenizer.token_to_id("[SEP]"))
            .unwrap_or(2);

        debug!(
            "Special tokens - BOS: {}, EOS: {}",
            bos_token_id, eos_token_id
        );

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            tokenizer: Arc::new(tokenizer),
            bos_token_id,
            eos_token_id,
        })
    }

    /// Generate a transcription from encoder embeddings.
    ///
    /// Runs the autoregressive loop starting from BOS, stopping at EOS or
    /// `MAX_DECODE_TOKENS`. Confidence is the mean softmax probability of
    /// the emitted tokens.
    pub fn generate(&self, image_embeddings: &Array2<f32>) -> Result<DecodedText> {
        let mut tokens = vec![self.bos_token_id];
        let mut token_probs: Vec<f32> = Vec::new();

        for step in 0..MAX_DECODE_TOKENS {
            let logits = self.forward(image_embeddings, &tokens)?;
            let (next_token, prob) = self.argmax(&logits, &tokens)?;

            if next_token == self.eos_token_id {
                debug!("Generation stopped at EOS after {} steps", step);
                break;
            }

            tokens.push(next_token);
            token_probs.push(prob);
        }

        let output_text = self
            .tokenizer
            .decode(&tokens, true)
            .map_err(|e| anyhow::anyhow!("Decoding failed: {}", e))?;

        let text = output_text.trim().to_string();

        let confidence = if token_probs.is_empty() {
            0.0
        } else {
            token_probs.iter().sum::<f32>() / token_probs.len() as f32
        };

        debug!("Generated {} tokens: '{}'", tokens.len(), text);

        Ok(DecodedText { text, confidence })
    }

    /// Run a single forward pass through the decoder.
    fn forward(&self, encoder_hidden_states: &Array2<f32>, input_ids: &[u32]) -> Result<Vec<f32>> {
        // Prepare encoder hidden states [1, seq_len, embed_dim]
        let (seq_len, embed_dim) = (encoder_hidden_states.nrows(), encoder_hidden_states.ncols());
        let mut encoder_input = Array3::<f32>::zeros((1, seq_len, embed_dim));
        for s in 0..seq_len {
            for e in 0..embed_dim {
                encoder_input[[0, s, e]] = encoder_hidden_states[[s, e]];
            }
        }

        // Token IDs so far [1, token_len]
        let token_len = input_ids.len();
        let mut input_ids_array = Array2::<i64>::zeros((1, token_len));
        for (i, &token) in input_ids.iter().enumerate() {
            input_ids_array[[0, i]] = token as i64;
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Decoder session lock poisoned"))?;

        let encoder_value = Value::from_array(encoder_input)
            .context("Failed to create encoder hidden states tensor")?;
        let input_ids_value =
            Value::from_array(input_ids_array).context("Failed to create input IDs tensor")?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids_value,
                "encoder_hidden_states" => encoder_value
            ])
            .context("Decoder inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        last_logits(output_tensor.view())
    }

    /// Greedy selection with recent-token masking, returning the chosen
    /// token and its softmax probability.
    fn argmax(&self, logits: &[f32], existing_tokens: &[u32]) -> Result<(u32, f32)> {
        let mask_tokens: std::collections::HashSet<u32> = existing_tokens
            .iter()
            .rev()
            .take(REPETITION_WINDOW)
            .copied()
            .chain(std::iter::once(self.bos_token_id))
            .collect();

        let (max_idx, max_logit) = logits
            .iter()
            .enumerate()
            .filter(|(idx, _)| !mask_tokens.contains(&(*idx as u32)))
            .map(|(idx, &v)| (idx, v))
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .ok_or_else(|| anyhow::anyhow!("Empty logits vector after filtering"))?;

        // Softmax probability of the selected token, max-shifted for stability
        let global_max = logits
            .iter()
            .copied()
            .fold(f32::NEG_INFINITY, f32::max);
        let denom: f32 = logits.iter().map(|&v| (v - global_max).exp()).sum();
        let prob = if denom > 0.0 {
            (max_logit - global_max).exp() / denom
        } else {
            0.0
        };

        Ok((max_idx as u32, prob))
    }
}

/// Logits for the last sequence position.
///
/// Accepts [batch, seq, vocab] or [seq, vocab] decoder outputs.
fn last_logits(output: ArrayViewD<f32>) -> Result<Vec<f32>> {
    let shape = output.shape().to_vec();

    let (last_pos, vocab_size) = match shape.len() {
        3 => (shape[1] - 1, shape[2]),
        2 => (shape[0] - 1, shape[1]),
        _ => anyhow::bail!("Unexpected decoder output shape: {:?}", shape),
    };

    let mut logits = vec![0.0f32; vocab_size];
    for (v, logit) in logits.iter_mut().enumerate() {
        *logit = match shape.len() {
            3 => output[IxDyn(&[0, last_pos, v])],
            _ => output[IxDyn(&[last_pos, v])],
        };
    }

    Ok(logits)
}
