//! Environment-driven service configuration
//!
//! Both service binaries are configured entirely through environment
//! variables; the field docs on [`ServiceConfig`] name them. Invalid numeric
//! values fall back to defaults with a warning instead of aborting startup.

use std::env;
use std::time::Duration;
use tracing::warn;

/// Default maximum upload size (5MB)
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default per-client rate limit (requests per minute)
pub const DEFAULT_RATE_LIMIT_PER_MINUTE: u32 = 10;

/// Default cache capacity (entries) and TTL (24 hours)
pub const DEFAULT_CACHE_ENTRIES: usize = 256;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Bind host, `OCR_HOST`
    pub host: String,
    /// Bind port, `OCR_PORT`
    pub port: u16,
    /// CUDA execution provider toggle, `USE_GPU`
    pub use_gpu: bool,
    /// Directory holding model checkpoints, `OCR_MODEL_DIR`
    pub model_dir: String,
    /// Languages to preload at startup, `OCR_LANGUAGES` (comma separated)
    pub languages: Vec<String>,
    /// Optional bearer token, `OCR_AUTH_TOKEN`; when set, /ocr requires auth
    pub auth_token: Option<String>,
    /// Requests per minute per client key, `OCR_RATE_LIMIT` (0 disables)
    pub rate_limit_per_minute: u32,
    /// Maximum accepted upload size in bytes, `OCR_MAX_UPLOAD_BYTES`
    pub max_upload_bytes: usize,
    /// Result cache capacity in entries, `OCR_CACHE_ENTRIES` (0 disables)
    pub cache_entries: usize,
    /// Result cache TTL, `OCR_CACHE_TTL_SECS`
    pub cache_ttl: Duration,
    /// Allow fetching missing checkpoint files from the HF hub,
    /// `OCR_DOWNLOAD_ENABLED`
    pub download_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            use_gpu: false,
            model_dir: "./models".to_string(),
            languages: vec!["en".to_string()],
            auth_token: None,
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            cache_entries: DEFAULT_CACHE_ENTRIES,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            download_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Build a configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = env::var("OCR_HOST").unwrap_or(defaults.host);
        let port = parse_env("OCR_PORT", defaults.port);
        let use_gpu = env_flag("USE_GPU", defaults.use_gpu);
        let model_dir = env::var("OCR_MODEL_DIR").unwrap_or(defaults.model_dir);

        let languages = env::var("OCR_LANGUAGES")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_lowercase())
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
            .ok()
            .filter(|langs| !langs.is_empty())
            .unwrap_or(defaults.languages);

        let auth_token = env::var("OCR_AUTH_TOKEN").ok().filter(|t| !t.is_empty());

        Self {
            host,
            port,
            use_gpu,
            model_dir,
            languages,
            auth_token,
            rate_limit_per_minute: parse_env("OCR_RATE_LIMIT", defaults.rate_limit_per_minute),
            max_upload_bytes: parse_env("OCR_MAX_UPLOAD_BYTES", defaults.max_upload_bytes),
            cache_entries: parse_env("OCR_CACHE_ENTRIES", defaults.cache_entries),
            cache_ttl: Duration::from_secs(parse_env(
                "OCR_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            download_enabled: env_flag("OCR_DOWNLOAD_ENABLED", defaults.download_enabled),
        }
    }

    /// The socket address string to bind to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether bearer authentication is enabled.
    pub fn auth_enabled(&self) -> bool {
        self.auth_token.is_some()
    }
}

fn parse_env<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            warn!("Invalid value for {}: '{}', using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name) {
        Ok(raw) => {
            let v = raw.to_lowercase();
            v == "true" || v == "1" || v == "yes"
        }
        Err(_) => default,
    }
}
