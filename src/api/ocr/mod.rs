//! POST /ocr endpoint: request parsing, handling, response shaping

pub mod handler;
pub mod request;
pub mod response;

pub use handler::ocr_handler;
pub use request::OcrUpload;
pub use response::{OcrMetadata, OcrResponse};
