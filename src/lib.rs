pub mod api;
pub mod cache;
pub mod config;
pub mod monitoring;
pub mod version;
pub mod vision;

pub use api::errors::{ApiError, ErrorResponse};
pub use api::server::{create_router, start_server, AppState};
pub use cache::ResultCache;
pub use config::ServiceConfig;
pub use vision::{BoundingBox, OcrEngine, OcrResult, TextRegion};
