//! The remote generation collaborator seam.
//!
//! A stage advance asks some remote service for a new tree illustration and
//! a short encouragement message. [`GenerationSource`] abstracts how that
//! happens -- an HTTP model API, an offline placeholder, or a test stub.
//! Implementations report failures as [`GenerationError`]; deciding what to
//! show instead is the [`Session`](crate::session::Session)'s job.

use std::future::Future;

use forest_types::Stage;

use crate::error::GenerationError;

/// A producer of stage illustrations and encouragement messages.
pub trait GenerationSource: Send + Sync {
    /// Produce an image reference (data URI or URL) depicting `stage`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if no image could be produced.
    fn generate_illustration(
        &self,
        stage: Stage,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;

    /// Produce a short encouragement for a player with the given totals.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] if no message could be produced.
    fn generate_message(
        &self,
        total_effort: u64,
        total_spent: u64,
    ) -> impl Future<Output = Result<String, GenerationError>> + Send;
}
