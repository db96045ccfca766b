//! Per-client rate limiting on POST /ocr

use axum::http::StatusCode;
use std::sync::Arc;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{app, body_json, multipart_body, ocr_request, png_bytes, FakeEngine};

#[tokio::test]
async fn test_requests_over_quota_get_429() {
    let config = ServiceConfig {
        rate_limit_per_minute: 2,
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("ok", 0.9));
    let router = app(config, Some(engine), true).await;

    for _ in 0..2 {
        let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
        let response = router
            .clone()
            .oneshot(ocr_request(&ct, body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_after = response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    assert_eq!(retry_after.as_deref(), Some("60"));

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "rate_limit_exceeded");
    assert_eq!(json["details"]["retryAfter"], 60);
}

#[tokio::test]
async fn test_rate_limit_keyed_by_api_token() {
    let config = ServiceConfig {
        rate_limit_per_minute: 1,
        auth_token: Some("secret-token".to_string()),
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("ok", 0.9));
    let router = app(config, Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let first = router
        .clone()
        .oneshot(ocr_request(&ct, body, Some("secret-token")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let second = router
        .oneshot(ocr_request(&ct, body, Some("secret-token")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rotating_tokens_do_not_bypass_limit_when_auth_off() {
    // With auth disabled, header tokens are unverified noise and the quota
    // stays keyed on the client, not on whatever token was sent
    let config = ServiceConfig {
        rate_limit_per_minute: 1,
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("ok", 0.9));
    let router = app(config, Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let first = router
        .clone()
        .oneshot(ocr_request(&ct, body, Some("made-up-token-1")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let second = router
        .oneshot(ocr_request(&ct, body, Some("made-up-token-2")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_zero_limit_disables_rate_limiting() {
    let config = ServiceConfig {
        rate_limit_per_minute: 0,
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("ok", 0.9));
    let router = app(config, Some(engine), true).await;

    for _ in 0..20 {
        let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
        let response = router
            .clone()
            .oneshot(ocr_request(&ct, body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
