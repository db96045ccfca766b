//! GET /languages is only mounted on the multi-language variant

use axum::http::StatusCode;
use tower::ServiceExt;

use ocr_node::config::ServiceConfig;

use super::helpers::{app, body_json, get_request};

#[tokio::test]
async fn test_languages_lists_supported_codes() {
    let router = app(ServiceConfig::default(), None, true).await;

    let response = router.oneshot(get_request("/languages")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let languages = json["languages"].as_array().unwrap();
    assert_eq!(languages.len(), 10);
    assert!(languages.contains(&serde_json::json!("en")));
    assert!(languages.contains(&serde_json::json!("zh")));
    assert_eq!(json["default"], "en");
}

#[tokio::test]
async fn test_languages_absent_on_handwriting_variant() {
    let router = app(ServiceConfig::default(), None, false).await;

    let response = router.oneshot(get_request("/languages")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
