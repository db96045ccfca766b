//! Security headers are applied to every response

use std::sync::Arc;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{app, get_request, multipart_body, ocr_request, png_bytes, FakeEngine};

#[tokio::test]
async fn test_headers_on_health_response() {
    let router = app(ServiceConfig::default(), None, true).await;

    let response = router.oneshot(get_request("/health")).await.unwrap();
    let headers = response.headers();

    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    assert_eq!(headers["content-security-policy"], "default-src 'none'");
}

#[tokio::test]
async fn test_headers_on_ocr_response() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}

#[tokio::test]
async fn test_headers_on_error_response() {
    let router = app(ServiceConfig::default(), None, true).await;

    // Missing image -> 400, headers still present
    let (ct, body) = multipart_body(None, None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();

    assert_eq!(response.headers()["x-frame-options"], "DENY");
}
