//! Log subscriber setup
//!
//! `RUST_LOG` wins when set; otherwise the level passed on the command line
//! applies. JSON output is meant for piping sweep logs into other tools.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Error returned when a global subscriber is already installed
#[derive(Debug, thiserror::Error)]
#[error("Failed to set global subscriber (may already be initialized): {0}")]
pub struct LoggingError(String);

/// Build the filter for `level`, deferring to `RUST_LOG` when present
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(level.to_lowercase()).unwrap_or_else(|_| EnvFilter::new("info"))
    })
}

/// Install the global subscriber. Logs go to stderr so tables on stdout stay clean.
pub fn init_subscriber(level: &str, json: bool) -> Result<(), LoggingError> {
    let filter = env_filter(level);

    let result = if json {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(fmt_layer),
        )
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr);
        tracing::subscriber::set_global_default(
            tracing_subscriber::registry().with(filter).with(fmt_layer),
        )
    };

    result.map_err(|e| LoggingError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_filter_uses_requested_level() {
        std::env::remove_var("RUST_LOG");
        assert_eq!(env_filter("DEBUG").to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_rust_log_takes_precedence() {
        std::env::set_var("RUST_LOG", "warn");
        let filter = env_filter("trace");
        std::env::remove_var("RUST_LOG");
        assert_eq!(filter.to_string(), "warn");
    }
}
