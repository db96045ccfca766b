//! HTTP server assembly
//!
//! Builds the router shared by both service binaries and runs it with
//! graceful shutdown. The engine slot starts empty so the server can come
//! up (unhealthy) while models are still loading or missing.

use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::auth::require_auth;
use super::handlers::{health_handler, languages_handler, metrics_handler};
use super::ocr::handler::ocr_handler;
use super::ocr::response::OcrResponse;
use super::rate_limiter::ApiRateLimiter;
use crate::cache::ResultCache;
use crate::config::ServiceConfig;
use crate::vision::OcrEngine;

/// Headroom over the configured upload limit for multipart framing. Uploads
/// within the headroom are read in full and rejected with their exact size;
/// anything larger trips the stream limit and is rejected without one.
const BODY_LIMIT_OVERHEAD: usize = 64 * 1024;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Loaded OCR engine, `None` until startup loading succeeds
    pub engine: Arc<RwLock<Option<Arc<dyn OcrEngine>>>>,
    pub config: Arc<ServiceConfig>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    pub cache: Arc<ResultCache<OcrResponse>>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServiceConfig) -> Self {
        let rate_limiter = Arc::new(ApiRateLimiter::new(config.rate_limit_per_minute));
        let cache = Arc::new(ResultCache::new(config.cache_entries, config.cache_ttl));

        Self {
            engine: Arc::new(RwLock::new(None)),
            config: Arc::new(config),
            rate_limiter,
            cache,
            started_at: Instant::now(),
        }
    }

    /// Install the engine once loading finishes.
    pub async fn set_engine(&self, engine: Arc<dyn OcrEngine>) {
        let mut slot = self.engine.write().await;
        *slot = Some(engine);
    }
}

/// Build the service router.
///
/// `expose_languages` adds `GET /languages`, which only the multi-language
/// variant serves.
pub fn create_router(state: AppState, expose_languages: bool) -> Router {
    let body_limit = state.config.max_upload_bytes + BODY_LIMIT_OVERHEAD;

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(
            "/ocr",
            post(ocr_handler).layer(middleware::from_fn_with_state(state.clone(), require_auth)),
        );

    if expose_languages {
        router = router.route("/languages", get(languages_handler));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::REFERRER_POLICY,
            HeaderValue::from_static("strict-origin-when-cross-origin"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'none'"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until ctrl-c.
pub async fn start_server(state: AppState, expose_languages: bool) -> Result<()> {
    let addr = state.config.listen_addr();
    let router = create_router(state, expose_languages);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install ctrl-c handler: {}", e);
        return;
    }
    info!("Shutdown signal received");
}
