//! Error types for the Block Forest server binary.
//!
//! [`StartupError`] wraps every failure that can stop the server from
//! coming up or keep it from serving. `main` attaches context with
//! `anyhow` on top.

/// Top-level error for the server binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that startup code can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: forest_core::config::ConfigError,
    },

    /// The progression rules in the configuration are unusable.
    #[error("progression error: {source}")]
    Progression {
        /// The underlying progression error.
        #[from]
        source: forest_core::error::ProgressError,
    },

    /// The logging subscriber could not be installed.
    #[error("logging error: {message}")]
    Logging {
        /// Description of the logging failure.
        message: String,
    },

    /// The observer API server failed to bind or serve.
    #[error("observer error: {source}")]
    Observer {
        /// The underlying server error.
        #[from]
        source: forest_observer::ServerError,
    },
}
