//! # Telemetry
//!
//! Process-wide `tracing` subscriber setup.

use crate::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level. An unparsable
/// level falls back to `info`.
///
/// # Errors
///
/// Returns `TryInitError` if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match config.format {
        LogFormat::Json => builder.json().with_current_span(false).finish().try_init(),
        LogFormat::Pretty => builder.finish().try_init(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LoggingConfig {
            level: "not a valid directive [".to_string(),
            format: LogFormat::Json,
        };
        assert!(init(&config).is_ok());
        assert!(init(&LoggingConfig::default()).is_err());
    }
}
