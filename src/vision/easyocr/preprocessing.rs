//! Image preprocessing for the detection and recognition models

use image::{DynamicImage, GenericImageView, GrayImage, Rgb, RgbImage};
use ndarray::Array4;

/// Longest side fed to the detection model
pub const DET_MAX_SIZE: u32 = 960;

/// Detection model inputs must be multiples of 32 on both axes
pub const DET_SIZE_MULTIPLE: u32 = 32;

/// Recognition model input height
pub const REC_INPUT_HEIGHT: u32 = 64;

/// Maximum width for recognition model input
pub const REC_MAX_WIDTH: u32 = 1000;

/// Mean values for detector normalization (ImageNet)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];

/// Std values for detector normalization (ImageNet)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Scaling applied when preparing the detector input.
///
/// Detection results live in model input space; `to_original` maps them back
/// onto the uploaded image.
#[derive(Debug, Clone, Copy)]
pub struct DetectorScale {
    /// Scale factor from original image to model input
    pub ratio: f32,
    /// Original image width
    pub original_width: u32,
    /// Original image height
    pub original_height: u32,
}

impl DetectorScale {
    /// Map a coordinate from model input space back to the original image.
    pub fn to_original(&self, x: f32, y: f32) -> (f32, f32) {
        (x / self.ratio, y / self.ratio)
    }
}

/// Preprocess an image for text detection.
///
/// Steps:
/// 1. Scale so the longest side is at most `DET_MAX_SIZE`
/// 2. Pad right/bottom so both dimensions are multiples of 32
/// 3. Normalize with ImageNet mean/std: (pixel/255 - mean) / std
/// 4. Convert to NCHW tensor format [1, 3, H, W]
pub fn preprocess_for_detection(image: &DynamicImage) -> (Array4<f32>, DetectorScale) {
    let (orig_w, orig_h) = image.dimensions();
    let long_side = orig_w.max(orig_h).max(1);

    let ratio = if long_side > DET_MAX_SIZE {
        DET_MAX_SIZE as f32 / long_side as f32
    } else {
        1.0
    };

    let new_w = ((orig_w as f32 * ratio).round() as u32).max(1);
    let new_h = ((orig_h as f32 * ratio).round() as u32).max(1);

    let resized = if ratio < 1.0 {
        image.resize_exact(new_w, new_h, image::imageops::FilterType::Lanczos3)
    } else {
        image.clone()
    };
    let rgb = resized.to_rgb8();

    // Pad right/bottom to the next multiple of 32 with black
    let canvas_w = new_w.div_ceil(DET_SIZE_MULTIPLE) * DET_SIZE_MULTIPLE;
    let canvas_h = new_h.div_ceil(DET_SIZE_MULTIPLE) * DET_SIZE_MULTIPLE;
    let mut canvas = RgbImage::from_pixel(canvas_w, canvas_h, Rgb([0, 0, 0]));
    for y in 0..new_h {
        for x in 0..new_w {
            canvas.put_pixel(x, y, *rgb.get_pixel(x, y));
        }
    }

    let mut tensor = Array4::zeros((1, 3, canvas_h as usize, canvas_w as usize));
    for y in 0..canvas_h as usize {
        for x in 0..canvas_w as usize {
            let pixel = canvas.get_pixel(x as u32, y as u32);
            for c in 0..3 {
                let normalized = (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c];
                tensor[[0, c, y, x]] = normalized;
            }
        }
    }

    let scale = DetectorScale {
        ratio,
        original_width: orig_w,
        original_height: orig_h,
    };

    (tensor, scale)
}

/// Preprocess a cropped text region for recognition.
///
/// The recognizer takes a single grayscale channel at fixed height 64 with
/// dynamic width, normalized to [-1, 1]: (pixel/255 - 0.5) / 0.5.
pub fn preprocess_for_recognition(image: &DynamicImage) -> Array4<f32> {
    let (orig_w, orig_h) = image.dimensions();

    let scale = REC_INPUT_HEIGHT as f32 / orig_h.max(1) as f32;
    let new_width = ((orig_w as f32 * scale).round() as u32)
        .clamp(4, REC_MAX_WIDTH);

    let resized = image.resize_exact(
        new_width,
        REC_INPUT_HEIGHT,
        image::imageops::FilterType::Lanczos3,
    );
    let gray: GrayImage = resized.to_luma8();

    let output_width = new_width as usize;
    let mut tensor = Array4::zeros((1, 1, REC_INPUT_HEIGHT as usize, output_width));

    for y in 0..REC_INPUT_HEIGHT as usize {
        for x in 0..output_width {
            let pixel = gray.get_pixel(x as u32, y as u32);
            tensor[[0, 0, y, x]] = (pixel[0] as f32 / 255.0 - 0.5) / 0.5;
        }
    }

    tensor
}
