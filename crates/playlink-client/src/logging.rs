//! Structured logging bootstrap.
//!
//! Installs a `tracing_subscriber::fmt` subscriber.  The level comes from the
//! `[logging]` config section unless `RUST_LOG` is set, in which case
//! `RUST_LOG` wins.

use std::str::FromStr;

use thiserror::Error;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not one of `off`, `error`, `warn`, `info`,
    /// `debug`, `trace`.
    #[error("invalid log level {0:?}")]
    InvalidLevel(String),

    /// A global subscriber is already installed.
    #[error("tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Installs the global subscriber with `default_level` as the fallback filter.
///
/// # Errors
///
/// Returns [`LoggingError::InvalidLevel`] for an unknown level and
/// [`LoggingError::AlreadyInitialized`] if called more than once per process.
pub fn init_tracing(default_level: &str) -> Result<(), LoggingError> {
    let filter = build_filter(default_level)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))
}

fn build_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    let level = LevelFilter::from_str(default_level.trim())
        .map_err(|_| LoggingError::InvalidLevel(default_level.to_string()))?;
    Ok(EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into())))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_level_is_rejected_before_install() {
        assert!(matches!(
            init_tracing("loud"),
            Err(LoggingError::InvalidLevel(level)) if level == "loud"
        ));
    }

    #[test]
    fn test_known_levels_build_a_filter() {
        for level in ["off", "error", "warn", "info", "debug", "trace", " INFO "] {
            assert!(build_filter(level).is_ok(), "level {level:?}");
        }
    }

    #[test]
    fn test_second_install_reports_already_initialized() {
        let _ = init_tracing("debug");
        assert!(matches!(
            init_tracing("debug"),
            Err(LoggingError::AlreadyInitialized(_))
        ));
    }
}
