//! Shared application state for the observer server.
//!
//! The observer holds one [`ForestSession`] behind an [`Arc`]. Handlers call
//! straight into the session; its own lock serializes commands, so the
//! observer keeps no state of its own.

use std::sync::Arc;

use forest_core::session::Session;
use forest_generation::GenerationClient;
use forest_types::ProgressUpdate;
use tokio::sync::broadcast;

/// The session type served over HTTP.
pub type ForestSession = Session<GenerationClient>;

/// Shared state for all Axum handlers.
pub struct AppState {
    session: Arc<ForestSession>,
}

impl AppState {
    /// Wrap a session for serving.
    pub const fn new(session: Arc<ForestSession>) -> Self {
        Self { session }
    }

    /// The served session.
    pub const fn session(&self) -> &Arc<ForestSession> {
        &self.session
    }

    /// Subscribe to the session's progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.session.subscribe()
    }
}
