//! Service observability
//!
//! Prometheus counters and histograms on the default registry, exposed via
//! `GET /metrics`.

pub mod metrics;

pub use metrics::encode_metrics;
