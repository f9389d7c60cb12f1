//! # Configuration
//!
//! Layered service configuration.
//!
//! Sources, later ones overriding earlier ones:
//!
//! 1. `config/default.toml` (optional)
//! 2. the file named by `SIMILAR_PRODUCTS_CONFIG` (required when set)
//! 3. environment variables prefixed with `SIMILAR_PRODUCTS_`, using `__`
//!    between nested keys
//!
//! Every field has a default, so an empty environment yields a usable
//! configuration.
//!
//! # Examples
//!
//! ```text
//! SIMILAR_PRODUCTS_UPSTREAM__BASE_URL=http://products:3001
//! SIMILAR_PRODUCTS_RESILIENCE__PRODUCT_DETAILS__RETRY__MAX_ATTEMPTS=2
//! SIMILAR_PRODUCTS_LOGGING__FORMAT=json
//! ```

use crate::application::services::{AggregationConfig, CircuitBreakerConfig, RetryPolicy};
use config::{Config, Environment, File, FileFormat};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment variable overrides.
pub const ENV_PREFIX: &str = "SIMILAR_PRODUCTS";

/// Environment variable naming an extra configuration file.
pub const CONFIG_FILE_ENV: &str = "SIMILAR_PRODUCTS_CONFIG";

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_FILE: &str = "config/default";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value is out of range.
    #[error("invalid configuration value for '{field}': {message}")]
    Invalid {
        /// Dotted path of the offending key.
        field: String,
        /// What is wrong with it.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Inbound HTTP server.
    pub server: ServerConfig,
    /// Upstream product service transport.
    pub upstream: UpstreamConfig,
    /// Circuit breaker and retry settings per operation kind.
    pub resilience: ResilienceConfig,
    /// Detail fan-out.
    pub aggregation: AggregationConfig,
    /// Log output.
    pub logging: LoggingConfig,
}

/// Inbound HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Upstream product service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the product service.
    pub base_url: String,
    /// Connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Response read timeout in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3001".to_string(),
            connect_timeout_ms: 1_000,
            read_timeout_ms: 3_000,
        }
    }
}

impl UpstreamConfig {
    /// Deadline for one attempt: connect plus read.
    #[must_use]
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms.saturating_add(self.read_timeout_ms))
    }
}

/// Resilience settings for both upstream operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResilienceConfig {
    /// Policy for the similar id listing.
    pub similar_ids: OperationResilienceConfig,
    /// Policy for detail lookups.
    pub product_details: OperationResilienceConfig,
}

/// Resilience settings for one upstream operation kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationResilienceConfig {
    /// Circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,
    /// Retry settings.
    pub retry: RetryPolicy,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG`.
    pub level: String,
    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads configuration from files and the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if a source cannot be read, or
    /// `ConfigError::Invalid` if a value fails validation.
    pub fn load() -> ConfigResult<Self> {
        let mut builder =
            Config::builder().add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(File::with_name(&path));
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` if the document is malformed, or
    /// `ConfigError::Invalid` if a value fails validation.
    pub fn from_toml(document: &str) -> ConfigResult<Self> {
        let config: Self = Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validates value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.server.bind_address.trim().is_empty() {
            return Err(ConfigError::invalid("server.bind_address", "must not be empty"));
        }

        let url = Url::parse(&self.upstream.base_url)
            .map_err(|e| ConfigError::invalid("upstream.base_url", e.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::invalid("upstream.base_url", "URL cannot be a base"));
        }
        if self.upstream.connect_timeout_ms == 0 {
            return Err(ConfigError::invalid("upstream.connect_timeout_ms", "must be positive"));
        }
        if self.upstream.read_timeout_ms == 0 {
            return Err(ConfigError::invalid("upstream.read_timeout_ms", "must be positive"));
        }

        validate_operation("resilience.similar_ids", &self.resilience.similar_ids)?;
        validate_operation("resilience.product_details", &self.resilience.product_details)?;

        if self.aggregation.max_concurrency == 0 {
            return Err(ConfigError::invalid("aggregation.max_concurrency", "must be positive"));
        }

        Ok(())
    }
}

fn validate_operation(prefix: &str, config: &OperationResilienceConfig) -> ConfigResult<()> {
    let breaker = &config.circuit_breaker;
    let threshold = breaker.failure_rate_threshold;
    if threshold.is_nan() || threshold <= 0.0 || threshold > 100.0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.circuit_breaker.failure_rate_threshold"),
            "must be in (0, 100]",
        ));
    }
    if breaker.sliding_window_size == 0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.circuit_breaker.sliding_window_size"),
            "must be positive",
        ));
    }
    if breaker.minimum_number_of_calls == 0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.circuit_breaker.minimum_number_of_calls"),
            "must be positive",
        ));
    }
    if breaker.open_duration_ms == 0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.circuit_breaker.open_duration_ms"),
            "must be positive",
        ));
    }

    let retry = &config.retry;
    if retry.max_attempts == 0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.retry.max_attempts"),
            "must be at least 1",
        ));
    }
    if retry.multiplier.is_nan() || retry.multiplier < 1.0 {
        return Err(ConfigError::invalid(
            format!("{prefix}.retry.multiplier"),
            "must be at least 1.0",
        ));
    }
    if retry.max_backoff_ms < retry.initial_backoff_ms {
        return Err(ConfigError::invalid(
            format!("{prefix}.retry.max_backoff_ms"),
            "must not be below initial_backoff_ms",
        ));
    }

    Ok(())
}
