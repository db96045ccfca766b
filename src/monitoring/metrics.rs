use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, Encoder, Histogram, IntCounter, TextEncoder,
};

// Prometheus metrics (default registry)
pub static OCR_REQUESTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("ocr_requests_total", "Total OCR requests received")
        .expect("register ocr_requests_total")
});

pub static OCR_SUCCESS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("ocr_success_total", "Total OCR requests completed")
        .expect("register ocr_success_total")
});

pub static OCR_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("ocr_errors_total", "Total OCR requests failed")
        .expect("register ocr_errors_total")
});

pub static OCR_CACHE_HITS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("ocr_cache_hits_total", "Total responses served from cache")
        .expect("register ocr_cache_hits_total")
});

pub static RATE_LIMITED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ocr_rate_limited_total",
        "Total requests rejected by rate limiter"
    )
    .expect("register ocr_rate_limited_total")
});

pub static AUTH_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "ocr_auth_failures_total",
        "Total requests rejected by authentication"
    )
    .expect("register ocr_auth_failures_total")
});

pub static OCR_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "ocr_request_duration_seconds",
        "OCR request duration in seconds",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register ocr_request_duration")
});

/// Encode all registered metrics in the Prometheus text format.
pub fn encode_metrics() -> (axum::http::StatusCode, String) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        return (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        );
    }
    (
        axum::http::StatusCode::OK,
        String::from_utf8(buffer).unwrap_or_default(),
    )
}
