//! Player configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Environment variable holding the backend API base address
pub const API_URL_ENV: &str = "REELCAST_API_URL";

/// Environment variable holding the HTTP request timeout
pub const REQUEST_TIMEOUT_ENV: &str = "REELCAST_REQUEST_TIMEOUT_MS";

/// Default backend base address
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";

/// Player configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Base address of the catalog and streaming API
    pub api_base_url: Url,
    /// Timeout for catalog and manifest requests (milliseconds)
    pub request_timeout_ms: u64,
    /// Options handed to every streaming engine instance
    pub engine: EngineConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            request_timeout_ms: 30_000,
            engine: EngineConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Build a config from `REELCAST_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.api_base_url = Url::parse(raw.trim())?;
        }

        if let Some(raw) = lookup(REQUEST_TIMEOUT_ENV) {
            config.request_timeout_ms = raw.trim().parse().map_err(|_| {
                Error::InvalidConfig(format!("{REQUEST_TIMEOUT_ENV} must be milliseconds, got {raw:?}"))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Replace the API base address
    pub fn with_api_url(mut self, url: &str) -> Result<Self> {
        self.api_base_url = Url::parse(url)?;
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_base_url.cannot_be_a_base() {
            return Err(Error::InvalidConfig(format!(
                "API base address cannot carry a path: {}",
                self.api_base_url
            )));
        }
        if self.request_timeout_ms == 0 {
            return Err(Error::InvalidConfig("request timeout must be non-zero".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Options for a streaming engine instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Offload demuxing to a worker when the engine supports it
    pub enable_worker: bool,
    /// Prefer latency over stability for live edges
    pub low_latency_mode: bool,
    /// Seconds of already-played media to keep buffered
    pub back_buffer_length: f64,
    /// Delay before the first reload after a failed load (milliseconds)
    pub retry_delay_ms: u64,
    /// Upper bound for the doubling reload delay (milliseconds)
    pub max_retry_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_worker: true,
            low_latency_mode: false,
            back_buffer_length: 90.0,
            retry_delay_ms: 1_000,
            max_retry_delay_ms: 64_000,
        }
    }
}

impl EngineConfig {
    /// Config tuned for low-latency live streaming
    pub fn low_latency() -> Self {
        Self {
            low_latency_mode: true,
            back_buffer_length: 30.0,
            ..Self::default()
        }
    }

    /// Delay before reload `attempt` (0 for the initial load).
    ///
    /// Doubles from `retry_delay_ms` and saturates at `max_retry_delay_ms`.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = 1u64.checked_shl(attempt - 1).unwrap_or(u64::MAX);
        let delay = self.retry_delay_ms.saturating_mul(factor).min(self.max_retry_delay_ms);
        Duration::from_millis(delay)
    }
}
