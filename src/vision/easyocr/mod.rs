//! Multi-language OCR engine
//!
//! Components:
//! - `detection` - text region detection (CRAFT)
//! - `recognition` - text recognition from detected regions (CRNN + CTC)
//! - `preprocessing` - image preprocessing for both models
//! - `languages` - language codes and script group tables
//! - `model` - combined pipeline

pub mod detection;
pub mod languages;
pub mod model;
pub mod preprocessing;
pub mod recognition;

pub use detection::{TextBox, TextDetector};
pub use languages::{filter_supported, is_supported, ScriptGroup, SUPPORTED_LANGUAGES};
pub use model::EasyOcrEngine;
pub use recognition::{RecognizedText, TextRecognizer};
