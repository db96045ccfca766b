//! Per-client request rate limiting
//!
//! Keyed on the API key when auth is enabled, otherwise the client IP.
//! A limit of zero disables rate limiting entirely.

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter as GovRateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use super::errors::ApiError;

/// Rate limiter for OCR requests, one quota bucket per client key.
pub struct ApiRateLimiter {
    limiter: Option<Arc<GovRateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>>>,
    requests_per_minute: u32,
}

impl ApiRateLimiter {
    /// Create a keyed rate limiter allowing `requests_per_minute` per
    /// client. Zero disables limiting.
    pub fn new(requests_per_minute: u32) -> Self {
        let limiter = NonZeroU32::new(requests_per_minute)
            .map(|rpm| Arc::new(GovRateLimiter::keyed(Quota::per_minute(rpm))));

        Self {
            limiter,
            requests_per_minute,
        }
    }

    /// Check whether a request from `key` is allowed right now.
    pub fn check(&self, key: &str) -> Result<(), ApiError> {
        let Some(limiter) = &self.limiter else {
            return Ok(());
        };

        match limiter.check_key(&key.to_string()) {
            Ok(_) => Ok(()),
            Err(_) => Err(ApiError::RateLimitExceeded { retry_after: 60 }),
        }
    }

    /// Get the configured requests per minute
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }
}
