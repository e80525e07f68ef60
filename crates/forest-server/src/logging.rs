//! Tracing subscriber setup.
//!
//! `RUST_LOG` takes precedence over `logging.level` from the configuration.
//! `logging.format: json` switches to one JSON object per line; anything
//! else gives the human-readable format.

use forest_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::error::StartupError;

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns [`StartupError::Logging`] if the configured level is not a valid
/// filter directive or a subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), StartupError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| StartupError::Logging {
            message: format!("invalid log level {:?}: {e}", config.level),
        })?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = if config.is_json() {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| StartupError::Logging {
        message: format!("failed to install subscriber: {e}"),
    })
}
