//! Structured logging setup.
//!
//! Installs a global `tracing-subscriber` fmt subscriber. `RUST_LOG` takes
//! precedence over the configured level so a single run can be made more
//! verbose without editing the config file.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Errors raised while installing the global subscriber.
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log level {level:?}: {source}")]
    Filter {
        /// The rejected level string.
        level: String,
        /// The underlying parse error.
        source: tracing_subscriber::filter::ParseError,
    },

    /// A global subscriber has already been installed.
    #[error("logging already initialised: {message}")]
    AlreadyInitialised {
        /// Message reported by the subscriber registry.
        message: String,
    },
}

/// Build the filter for the given config, honouring `RUST_LOG`.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] if `RUST_LOG` is unset and the configured
/// level cannot be parsed.
pub fn filter_for(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level).map_err(|source| LoggingError::Filter {
        level: config.level.clone(),
        source,
    })
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns [`LoggingError::Filter`] for a bad level and
/// [`LoggingError::AlreadyInitialised`] when called twice.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = filter_for(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| LoggingError::AlreadyInitialised {
        message: e.to_string(),
    })
}
