//! GET /health behavior with and without a loaded engine

use axum::http::StatusCode;
use std::sync::Arc;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{app, body_json, get_request, FakeEngine};

#[tokio::test]
async fn test_health_unhealthy_without_engine() {
    let router = app(ServiceConfig::default(), None, true).await;

    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["status"], "unhealthy");
    assert_eq!(json["modelLoaded"], false);
    assert!(json.get("model").is_none());
}

#[tokio::test]
async fn test_health_healthy_with_engine() {
    let engine = Arc::new(FakeEngine::reading("hello", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["modelLoaded"], true);
    assert_eq!(json["model"], "fake-ocr");
    assert_eq!(json["languages"][0], "en");
    assert!(json["version"].as_str().unwrap().contains('.'));
}

#[tokio::test]
async fn test_health_not_gated_by_auth() {
    let config = ServiceConfig {
        auth_token: Some("secret".to_string()),
        ..Default::default()
    };
    let router = app(config, None, true).await;

    // No token supplied, health still answers
    let response = router.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
