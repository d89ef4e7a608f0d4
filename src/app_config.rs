/*!
 * Application configuration.
 *
 * Loads and validates the gateway settings. Values come from an optional
 * JSON file, then the environment and command line (applied by the binary).
 */

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::transcript::TranslationTarget;

/// Represents the gateway configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Listen address
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-address admission settings
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Maximum video ids in one aggregate request
    #[serde(default = "default_max_video_ids")]
    pub max_video_ids: usize,

    /// Transcript provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Translation fallback policy, applied in order
    #[serde(default = "default_translations")]
    pub translations: Vec<TranslationTarget>,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Listen address configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    // @field: Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    // @field: TCP port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Rate limit configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RateLimitConfig {
    /// Request budget per minute and address
    ///
    /// The admission threshold is computed as `(rate * 60) / rate` seconds,
    /// which is 60 for every non-zero value.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Seconds between sweeps of stale entries (0 disables sweeping)
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_minute: default_requests_per_minute(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Transcript provider configuration
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Timeout for each provider call in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Accept-Language header sent to the provider
    #[serde(default = "default_accept_language")]
    pub accept_language: String,

    /// Videos of one request fetched at once
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            accept_language: default_accept_language(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(anyhow!("Invalid log level: {}", s)),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_requests_per_minute() -> u32 {
    60
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_max_video_ids() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_accept_language() -> String {
    "en-US".to_string()
}

fn default_concurrent_requests() -> usize {
    crate::aggregator::DEFAULT_MAX_CONCURRENT_VIDEOS
}

fn default_translations() -> Vec<TranslationTarget> {
    vec![TranslationTarget::new("en", "en", false)]
}

impl Config {
    /// Load configuration from a JSON file; missing fields take defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if self.rate_limit.requests_per_minute == 0 {
            return Err(anyhow!("Rate limit must be at least one request per minute"));
        }
        if self.max_video_ids == 0 {
            return Err(anyhow!("Maximum video ids must be at least 1"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(anyhow!("Provider timeout must be at least one second"));
        }
        if self.provider.concurrent_requests == 0 {
            return Err(anyhow!("Concurrent provider requests must be at least 1"));
        }

        for target in &self.translations {
            crate::language_utils::validate_language_code(&target.target_code)
                .with_context(|| format!("Invalid translation target '{}'", target.display_name))?;
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            rate_limit: RateLimitConfig::default(),
            max_video_ids: default_max_video_ids(),
            provider: ProviderConfig::default(),
            translations: default_translations(),
            log_level: LogLevel::default(),
        }
    }
}
