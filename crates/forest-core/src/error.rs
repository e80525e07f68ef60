//! Error types for the progression engine and its generation collaborator.
//!
//! Rejected spends are not errors; they are reported through
//! [`SpendOutcome::Rejected`](forest_types::SpendOutcome::Rejected).

/// Errors from progression commands.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    /// Malformed command input. State is unchanged.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A state invariant does not hold.
    #[error("invariant violated: {0}")]
    InvariantViolated(String),
}

/// Errors from the remote generation collaborator.
///
/// Never fatal: the session keeps the previous illustration or substitutes
/// the fallback message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// The backend returned an error or was unreachable.
    #[error("generation backend error: {0}")]
    Backend(String),

    /// The backend answered but the response held no usable content.
    #[error("generation response empty: {0}")]
    EmptyResponse(String),

    /// A prompt template failed to load or render.
    #[error("prompt template error: {0}")]
    Template(String),

    /// Backend configuration is invalid or incomplete.
    #[error("generation config error: {0}")]
    Config(String),

    /// The request exceeded its deadline.
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout {
        /// The deadline in milliseconds.
        timeout_ms: u64,
    },

    /// No backend is configured.
    #[error("generation is disabled")]
    Disabled,
}
