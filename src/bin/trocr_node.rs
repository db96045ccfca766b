//! Handwriting OCR service binary

use std::sync::Arc;
use tracing::{info, warn};

use ocr_node::api::server::{start_server, AppState};
use ocr_node::config::ServiceConfig;
use ocr_node::version::VERSION;
use ocr_node::vision::trocr::TrOcrEngine;

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
        "Starting trocr-node v{} on {} (gpu: {})",
        VERSION,
        config.listen_addr(),
        config.use_gpu
    );

    let state = AppState::new(config.clone());

    match TrOcrEngine::new(&config.model_dir, config.use_gpu, config.download_enabled).await {
        Ok(engine) => {
            info!("Handwriting OCR engine loaded");
            state.set_engine(Arc::new(engine)).await;
        }
        Err(e) => {
            warn!(
                "Handwriting OCR engine failed to load, serving unhealthy: {:#}",
                e
            );
        }
    }

    // The handwriting variant is English-only, no /languages route
    start_server(state, false).await
}
