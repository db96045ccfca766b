//! POST /ocr contract: happy path, validation, caching, failure modes

use axum::http::StatusCode;
use std::sync::Arc;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{
    app, body_json, multipart_body, ocr_request, png_bytes, FailingEngine, FakeEngine,
};

#[tokio::test]
async fn test_ocr_happy_path() {
    let engine = Arc::new(FakeEngine::reading("Hello World", 0.92));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(200, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["text"], "Hello World");
    assert!(json["confidence"].as_f64().unwrap() > 0.9);
    assert_eq!(json["regions"], 1);
    assert_eq!(json["language"][0], "en");
    assert_eq!(json["cached"], false);
    assert_eq!(json["metadata"]["imageWidth"], 200);
    assert_eq!(json["metadata"]["imageHeight"], 100);
    assert_eq!(json["metadata"]["imageFormat"], "png");
    assert_eq!(json["metadata"]["model"], "fake-ocr");
    assert!(json.get("message").is_none());
}

#[tokio::test]
async fn test_ocr_missing_image_field() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(None, Some(r#"["en"]"#));
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "validation_error");
    assert_eq!(json["details"]["field"], "image");
    assert!(json["requestId"].is_string());
}

#[tokio::test]
async fn test_ocr_rejects_non_image_bytes() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(b"this is not an image"), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "invalid_request");
}

#[tokio::test]
async fn test_ocr_rejects_undersized_image() {
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    // 20x20 is below the 50x50 floor
    let (ct, body) = multipart_body(Some(&png_bytes(20, 20)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ocr_oversized_upload_is_413() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(config, Some(engine), true).await;

    // A 100x100 noise PNG (~30KB) is over the 1KB cap but inside the
    // stream-level headroom, so the whole upload is read and measured
    let image = png_bytes(100, 100);
    assert!(image.len() > 1024);

    let (ct, body) = multipart_body(Some(&image), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "payload_too_large");
    assert_eq!(json["details"]["maxSize"], 1024);
    assert_eq!(json["details"]["size"], image.len() as u64);
}

#[tokio::test]
async fn test_ocr_upload_beyond_stream_limit_is_413() {
    let config = ServiceConfig {
        max_upload_bytes: 1024,
        ..Default::default()
    };
    let engine = Arc::new(FakeEngine::reading("x", 0.9));
    let router = app(config, Some(engine), true).await;

    // A 400x400 noise PNG (~480KB) blows past the cap plus the 64KiB
    // headroom; the multipart read aborts mid-stream and must still
    // surface as a 413, not a malformed-body 400
    let image = png_bytes(400, 400);
    assert!(image.len() > 1024 + 64 * 1024);

    let (ct, body) = multipart_body(Some(&image), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "payload_too_large");
    assert_eq!(json["details"]["maxSize"], 1024);
    // Size is unknown when the stream limit cuts the read short
    assert!(json["details"].get("size").is_none());
}

#[tokio::test]
async fn test_ocr_unsupported_languages_filtered_not_rejected() {
    let engine = Arc::new(FakeEngine::reading("bonjour", 0.8));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), Some(r#"["klingon","fr"]"#));
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["language"].as_array().unwrap().len(), 1);
    assert_eq!(json["language"][0], "fr");
}

#[tokio::test]
async fn test_ocr_all_unknown_languages_fall_back_to_english() {
    let engine = Arc::new(FakeEngine::reading("hello", 0.8));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), Some(r#"["xx","yy"]"#));
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["language"][0], "en");
}

#[tokio::test]
async fn test_ocr_no_text_detected_is_still_200() {
    let engine = Arc::new(FakeEngine::reading("", 0.0));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["text"], "");
    assert_eq!(json["confidence"], 0.0);
    assert_eq!(json["regions"], 0);
    assert_eq!(json["message"], "No text detected in image");
}

#[tokio::test]
async fn test_ocr_low_confidence_regions_filtered() {
    // Below the 0.1 cutoff, the region exists but is dropped
    let engine = Arc::new(FakeEngine::reading("noise", 0.05));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["text"], "");
    assert_eq!(json["regions"], 0);
    assert_eq!(json["metadata"]["detectedRegions"], 1);
    assert_eq!(json["metadata"]["filteredRegions"], 1);
}

#[tokio::test]
async fn test_ocr_second_identical_request_is_cached() {
    let engine = Arc::new(FakeEngine::reading("cached text", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let image = png_bytes(100, 100);

    let (ct, body) = multipart_body(Some(&image), None);
    let first = router
        .clone()
        .oneshot(ocr_request(&ct, body, None))
        .await
        .unwrap();
    assert_eq!(body_json(first).await["cached"], false);

    let (ct, body) = multipart_body(Some(&image), None);
    let second = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    let json = body_json(second).await;
    assert_eq!(json["cached"], true);
    assert_eq!(json["text"], "cached text");
}

#[tokio::test]
async fn test_ocr_different_languages_bypass_cache() {
    let engine = Arc::new(FakeEngine::reading("text", 0.9));
    let router = app(ServiceConfig::default(), Some(engine), true).await;

    let image = png_bytes(100, 100);

    let (ct, body) = multipart_body(Some(&image), Some(r#"["en"]"#));
    let first = router
        .clone()
        .oneshot(ocr_request(&ct, body, None))
        .await
        .unwrap();
    assert_eq!(body_json(first).await["cached"], false);

    let (ct, body) = multipart_body(Some(&image), Some(r#"["fr"]"#));
    let second = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(body_json(second).await["cached"], false);
}

#[tokio::test]
async fn test_ocr_valid_image_without_engine_is_503() {
    let router = app(ServiceConfig::default(), None, true).await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "service_unavailable");
}

#[tokio::test]
async fn test_ocr_bad_input_beats_missing_engine() {
    // Request validation runs before the engine check
    let router = app(ServiceConfig::default(), None, true).await;

    let (ct, body) = multipart_body(None, None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_ocr_model_failure_is_500() {
    let router = app(
        ServiceConfig::default(),
        Some(Arc::new(FailingEngine::new())),
        true,
    )
    .await;

    let (ct, body) = multipart_body(Some(&png_bytes(100, 100)), None);
    let response = router.oneshot(ocr_request(&ct, body, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["errorType"], "internal_error");
    // Internal detail is not leaked to the client
    assert!(!json["message"].as_str().unwrap().contains("exploded"));
}
