//! Multi-language OCR service binary

use std::sync::Arc;
use tracing::{info, warn};

use ocr_node::api::server::{start_server, AppState};
use ocr_node::config::ServiceConfig;
use ocr_node::version::VERSION;
use ocr_node::vision::easyocr::EasyOcrEngine;
use ocr_node::vision::OcrEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = ServiceConfig::from_env();
    info!(
        "Starting ocr-node v{} on {} (gpu: {})",
        VERSION,
        config.listen_addr(),
        config.use_gpu
    );

    let state = AppState::new(config.clone());

    // Engine loading is non-fatal: the server comes up unhealthy and
    // /health reports the missing model instead of the process dying.
    match EasyOcrEngine::new(&config.model_dir, &config.languages, config.use_gpu) {
        Ok(engine) => {
            info!(
                "OCR engine loaded for languages {:?}",
                engine.supported_languages()
            );
            state.set_engine(Arc::new(engine)).await;
        }
        Err(e) => {
            warn!("OCR engine failed to load, serving unhealthy: {:#}", e);
        }
    }

    start_server(state, true).await
}
