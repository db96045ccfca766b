//! Shared ONNX Runtime session construction

use anyhow::{Context, Result};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use std::path::Path;
use tracing::info;

/// Build an ONNX Runtime session for a checkpoint file.
///
/// With the `cuda` feature enabled and `use_gpu` set, the CUDA execution
/// provider is registered ahead of the CPU fallback. Without the feature,
/// `use_gpu` logs a warning and runs on CPU.
pub(crate) fn build_session(model_path: &Path, use_gpu: bool) -> Result<Session> {
    if !model_path.exists() {
        anyhow::bail!("Model file not found: {}", model_path.display());
    }

    info!("Loading ONNX model from {}", model_path.display());

    let builder = Session::builder().context("Failed to create session builder")?;

    #[cfg(feature = "cuda")]
    let builder = if use_gpu {
        builder
            .with_execution_providers([
                ort::execution_providers::CUDAExecutionProvider::default().build(),
                CPUExecutionProvider::default().build(),
            ])
            .context("Failed to set CUDA execution provider")?
    } else {
        builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
    };

    #[cfg(not(feature = "cuda"))]
    let builder = {
        if use_gpu {
            tracing::warn!("USE_GPU set but built without the cuda feature, running on CPU");
        }
        builder
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
    };

    builder
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .context("Failed to set optimization level")?
        .with_intra_threads(4)
        .context("Failed to set intra threads")?
        .commit_from_file(model_path)
        .context(format!(
            "Failed to load ONNX model from {}",
            model_path.display()
        ))
}
