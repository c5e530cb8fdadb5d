//! Configuration for salsadig
//!
//! Configuration is loaded from YAML. Every section has serde defaults so a
//! file only needs the credentials:
//!
//! ```yaml
//! host: salsa4.salsalabs.com
//! email: someone@example.org
//! password: hunter2
//! pipeline:
//!   fetchers: 5
//! ```
//!
//! `SALSA_HOST`, `SALSA_EMAIL` and `SALSA_PASSWORD` override the file.

use crate::error::{Error, Result};
use crate::http::{HttpClientConfig, RateLimiterConfig};
use crate::pagination::MAX_PAGE_SIZE;
use crate::types::BackoffType;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Login credentials and API host
    #[serde(flatten)]
    pub credentials: Credentials,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpSettings,

    /// Paged read and worker pool settings
    #[serde(default)]
    pub pipeline: PipelineSettings,

    /// Third-party lookup services
    #[serde(default)]
    pub lookups: LookupSettings,
}

impl Config {
    /// Load config from a YAML file and apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        let mut config = Self::from_yaml(&content)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse config from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Build config from the environment alone
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Override credentials from `SALSA_*` environment variables
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("SALSA_HOST") {
            self.credentials.host = host;
        }
        if let Ok(email) = std::env::var("SALSA_EMAIL") {
            self.credentials.email = email;
        }
        if let Ok(password) = std::env::var("SALSA_PASSWORD") {
            self.credentials.password = password;
        }
    }

    /// Check that the config is usable
    pub fn validate(&self) -> Result<()> {
        if self.credentials.host.trim().is_empty() {
            return Err(Error::missing_field("host"));
        }
        let p = &self.pipeline;
        if p.page_size == 0 || p.page_size > MAX_PAGE_SIZE {
            return Err(Error::invalid_value(
                "pipeline.page_size",
                format!("must be between 1 and {MAX_PAGE_SIZE}, got {}", p.page_size),
            ));
        }
        if p.fetchers == 0 {
            return Err(Error::invalid_value("pipeline.fetchers", "must be at least 1"));
        }
        if p.workers == 0 {
            return Err(Error::invalid_value("pipeline.workers", "must be at least 1"));
        }
        if p.buffer == 0 {
            return Err(Error::invalid_value("pipeline.buffer", "must be at least 1"));
        }
        Ok(())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Campaign manager login and API host
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    /// API host, e.g. `salsa4.salsalabs.com`. A scheme may be included.
    #[serde(default)]
    pub host: String,
    /// Campaign manager email
    #[serde(default)]
    pub email: String,
    /// Campaign manager password
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// Create credentials
    pub fn new(
        host: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// Base URL for the host. Bare hosts are reached over HTTPS.
    pub fn base_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

// ============================================================================
// HTTP
// ============================================================================

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries per request. The CRM client does not retry by default.
    #[serde(default)]
    pub max_retries: u32,

    /// Backoff between retries
    #[serde(default)]
    pub backoff: BackoffType,

    /// Initial backoff in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Requests per second across all tasks (0 disables throttling)
    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Burst size for the throttle
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_requests_per_second() -> u32 {
    20
}

fn default_burst() -> u32 {
    20
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: 0,
            backoff: BackoffType::default(),
            initial_backoff_ms: default_initial_backoff_ms(),
            requests_per_second: default_requests_per_second(),
            burst: default_burst(),
        }
    }
}

impl HttpSettings {
    /// Build an HTTP client config for `base_url`
    pub fn client_config(&self, base_url: &str) -> HttpClientConfig {
        let builder = HttpClientConfig::builder()
            .base_url(base_url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .max_retries(self.max_retries)
            .backoff(
                self.backoff,
                Duration::from_millis(self.initial_backoff_ms),
                Duration::from_secs(60),
            );
        if self.requests_per_second == 0 {
            builder.no_rate_limit().build()
        } else {
            builder
                .rate_limit(RateLimiterConfig::new(self.requests_per_second, self.burst))
                .build()
        }
    }
}

// ============================================================================
// Pipeline
// ============================================================================

/// Paged read and worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSettings {
    /// Records per page (at most 500)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Concurrent page fetchers
    #[serde(default = "default_fetchers")]
    pub fetchers: usize,

    /// Concurrent workers per processing stage
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Capacity of the channels between stages
    #[serde(default = "default_buffer")]
    pub buffer: usize,
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_fetchers() -> usize {
    5
}

fn default_workers() -> usize {
    5
}

fn default_buffer() -> usize {
    1000
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            fetchers: default_fetchers(),
            workers: default_workers(),
            buffer: default_buffer(),
        }
    }
}

// ============================================================================
// Lookups
// ============================================================================

/// Third-party services used by the address fixer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupSettings {
    /// Zippopotamus base URL
    #[serde(default = "default_zippopotamus_url")]
    pub zippopotamus_url: String,

    /// RestCountries base URL
    #[serde(default = "default_restcountries_url")]
    pub restcountries_url: String,

    /// Country applied to supporters that still have none after fixing
    #[serde(default = "default_country")]
    pub default_country: String,
}

fn default_zippopotamus_url() -> String {
    "http://api.zippopotam.us".to_string()
}

fn default_restcountries_url() -> String {
    "https://restcountries.com/v2".to_string()
}

fn default_country() -> String {
    "US".to_string()
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            zippopotamus_url: default_zippopotamus_url(),
            restcountries_url: default_restcountries_url(),
            default_country: default_country(),
        }
    }
}
