//! Transformer OCR engine for handwritten text
//!
//! Components:
//! - `encoder` - vision transformer patch encoder
//! - `decoder` - autoregressive text decoder + tokenizer
//! - `preprocessing` - 384x384 tensor preparation
//! - `model` - combined pipeline and checkpoint resolution

pub mod decoder;
pub mod encoder;
pub mod model;
pub mod preprocessing;

pub use decoder::{DecodedText, TextDecoder};
pub use encoder::VisionEncoder;
pub use model::TrOcrEngine;
