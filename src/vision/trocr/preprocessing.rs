//! Image preprocessing for the transformer OCR model

use image::DynamicImage;
use ndarray::Array4;

/// Encoder input size (square)
pub const TROCR_INPUT_SIZE: u32 = 384;

/// Normalization mean (applied per channel)
pub const MEAN: f32 = 0.5;

/// Normalization std (applied per channel)
pub const STD: f32 = 0.5;

/// Preprocess an image for the vision encoder.
///
/// The processor stretches to 384x384 without preserving aspect ratio and
/// normalizes each channel to [-1, 1]: (pixel/255 - 0.5) / 0.5.
pub fn preprocess_image(image: &DynamicImage) -> Array4<f32> {
    let resized = image.resize_exact(
        TROCR_INPUT_SIZE,
        TROCR_INPUT_SIZE,
        image::imageops::FilterType::Lanczos3,
    );
    let rgb = resized.to_rgb8();

    let size = TROCR_INPUT_SIZE as usize;
    let mut tensor = Array4::zeros((1, 3, size, size));

    for y in 0..size {
        for x in 0..size {
            let pixel = rgb.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                tensor[[0, c, y, x]] = (pixel[c] as f32 / 255.0 - MEAN) / STD;
            }
        }
    }

    tensor
}
