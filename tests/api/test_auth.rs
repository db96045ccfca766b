//! Bearer token authentication on POST /ocr

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{app, body_json, multipart_body, ocr_request, png_bytes, FakeEngine};

fn secured_config() -> ServiceConfig {
    ServiceConfig {
        auth_token: Some("secret-token".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(secured_config(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "unauthorized");
}

#[tokio::test]
async fn test_wrong_token_is_401() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(secured_config(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router
        .oneshot(ocr_request(&ct, body, Some("wrong-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_valid_bearer_token_passes() {
    let engine = Arc::new(FakeEngine::reading("authorized", 0.9));
    let router = app(secured_config(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router
        .oneshot(ocr_request(&ct, body, Some("secret-token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["text"], "authorized");
}

#[tokio::test]
async fn test_x_api_key_header_accepted() {
    let engine = Arc::new(FakeEngine::reading("keyed", 0.9));
    let router = app(secured_config(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let request = Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(header::CONTENT_TYPE, ct)
        .header("x-api-key", "secret-token")
        .body(Body::from(body))
        .unwrap();

    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_no_auth_configured_allows_anonymous() {
    let engine = Arc::new(FakeEngine::reading("open", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
