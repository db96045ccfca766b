//! CRAFT text detection model
//!
//! Finds text regions in images by thresholding the character region score
//! map and grouping connected pixels, using the affinity score to link
//! characters within a word.

use anyhow::{Context, Result};
use ndarray::{Array4, ArrayViewD, IxDyn};
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::vision::session::build_session;

/// Checkpoint file name inside the model directory
pub const DETECTION_MODEL_FILE: &str = "craft_mlt_25k.onnx";

/// Score maps come out at half the input resolution
const SCORE_MAP_STRIDE: f32 = 2.0;

/// A detected text box in model input space
#[derive(Debug, Clone)]
pub struct TextBox {
    /// X coordinate of top-left corner
    pub x: f32,
    /// Y coordinate of top-left corner
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
    /// Detection confidence score (0.0-1.0)
    pub confidence: f32,
}

impl TextBox {
    /// Check if this text box is valid (reasonable dimensions)
    pub fn is_valid(&self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.confidence > 0.0
    }

    /// Calculate area of the bounding box
    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// CRAFT text detector over an ONNX Runtime session.
#[derive(Clone)]
pub struct TextDetector {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Region score threshold for seeding a text region
    text_threshold: f32,
    /// Affinity score threshold for linking characters
    link_threshold: f32,
}

impl std::fmt::Debug for TextDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextDetector")
            .field("input_name", &self.input_name)
            .field("text_threshold", &self.text_threshold)
            .field("link_threshold", &self.link_threshold)
            .finish_non_exhaustive()
    }
}

impl TextDetector {
    /// Load the detection model from a file.
    pub fn new<P: AsRef<Path>>(model_path: P, use_gpu: bool) -> Result<Self> {
        let session = build_session(model_path.as_ref(), use_gpu)?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input".to_string());

        debug!("Detection model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            text_threshold: 0.4,
            link_threshold: 0.4,
        })
    }

    /// Run text detection on a preprocessed image tensor.
    ///
    /// The input tensor must come from `preprocess_for_detection()` with
    /// shape [1, 3, H, W]; returned boxes live in that input space.
    pub fn detect(&self, input: &Array4<f32>) -> Result<Vec<TextBox>> {
        let shape = input.shape();
        if shape.len() != 4 || shape[0] != 1 || shape[1] != 3 {
            anyhow::bail!("Invalid input shape: {:?}, expected [1, 3, H, W]", shape);
        }

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Detection session lock poisoned"))?;

        let input_value =
            Value::from_array(input.to_owned()).context("Failed to create input tensor")?;

        let outputs = session
            .run(ort::inputs![&self.input_name => input_value])
            .context("Detection inference failed")?;

        let output_tensor = outputs[0]
            .try_extract_array::<f32>()
            .context("Failed to extract output tensor")?;

        let text_boxes = self.parse_score_maps(output_tensor.view())?;

        debug!("Detected {} text regions", text_boxes.len());

        Ok(text_boxes)
    }

    /// Group score-map pixels into text boxes.
    ///
    /// The model outputs [1, H, W, 2]: channel 0 is the character region
    /// score, channel 1 the affinity (link) score. Both maps are at half the
    /// input resolution.
    fn parse_score_maps(&self, output: ArrayViewD<f32>) -> Result<Vec<TextBox>> {
        let output_shape = output.shape();
        if output_shape.len() != 4 || output_shape[3] != 2 {
            anyhow::bail!("Unexpected output shape: {:?}", output_shape);
        }

        let (map_height, map_width) = (output_shape[1], output_shape[2]);

        let mut text_boxes = Vec::new();
        let mut visited = vec![vec![false; map_width]; map_height];

        for y in 0..map_height {
            for x in 0..map_width {
                let region = output[IxDyn(&[0, y, x, 0])];

                if region >= self.text_threshold && !visited[y][x] {
                    let (min_x, max_x, min_y, max_y, count, sum_conf) =
                        self.flood_fill(&output, &mut visited, x, y, map_width, map_height);

                    // Minimum region size filters out speckle
                    if count > 10 {
                        let avg_conf = (sum_conf / count as f32).min(1.0);

                        text_boxes.push(TextBox {
                            x: min_x as f32 * SCORE_MAP_STRIDE,
                            y: min_y as f32 * SCORE_MAP_STRIDE,
                            width: (max_x - min_x + 1) as f32 * SCORE_MAP_STRIDE,
                            height: (max_y - min_y + 1) as f32 * SCORE_MAP_STRIDE,
                            confidence: avg_conf,
                        });
                    }
                }
            }
        }

        // Sort by y-position (top to bottom), then x-position (left to right)
        text_boxes.sort_by(|a, b| {
            let y_cmp = a.y.partial_cmp(&b.y).unwrap_or(std::cmp::Ordering::Equal);
            if y_cmp == std::cmp::Ordering::Equal {
                a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal)
            } else {
                y_cmp
            }
        });

        Ok(text_boxes)
    }

    /// Flood fill over pixels that pass either the region or the affinity
    /// threshold, so characters linked by affinity merge into one box.
    fn flood_fill(
        &self,
        output: &ArrayViewD<f32>,
        visited: &mut [Vec<bool>],
        start_x: usize,
        start_y: usize,
        width: usize,
        height: usize,
    ) -> (usize, usize, usize, usize, usize, f32) {
        let mut stack = vec![(start_x, start_y)];
        let mut min_x = start_x;
        let mut max_x = start_x;
        let mut min_y = start_y;
        let mut max_y = start_y;
        let mut count = 0;
        let mut sum_conf = 0.0;

        while let Some((x, y)) = stack.pop() {
            if x >= width || y >= height || visited[y][x] {
                continue;
            }

            let region = output[IxDyn(&[0, y, x, 0])];
            let link = output[IxDyn(&[0, y, x, 1])];

            if region < self.text_threshold && link < self.link_threshold {
                continue;
            }

            visited[y][x] = true;
            count += 1;
            sum_conf += region;

            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);

            // 4-connected neighbors
            if x > 0 {
                stack.push((x - 1, y));
            }
            if x + 1 < width {
                stack.push((x + 1, y));
            }
            if y > 0 {
                stack.push((x, y - 1));
            }
            if y + 1 < height {
                stack.push((x, y + 1));
            }
        }

        (min_x, max_x, min_y, max_y, count, sum_conf)
    }
}
