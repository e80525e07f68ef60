//! The [`GenerationSource`] implementation backed by a remote model API.
//!
//! [`GenerationClient`] renders a prompt from the templates and hands it to
//! the configured [`GenerationBackend`]. It never substitutes placeholder
//! content on failure; the session decides what to display instead.

use std::time::Instant;

use forest_core::config::GenerationConfig;
use forest_core::error::GenerationError;
use forest_core::generation::GenerationSource;
use forest_types::Stage;
use tracing::{debug, info};

use crate::backend::{GenerationBackend, create_backend};
use crate::config::{BackendConfig, BackendType};
use crate::prompt::PromptEngine;

/// Prompt rendering plus one backend.
pub struct GenerationClient {
    backend: GenerationBackend,
    prompts: PromptEngine,
}

impl GenerationClient {
    /// Pair a backend with its prompt templates.
    pub const fn new(backend: GenerationBackend, prompts: PromptEngine) -> Self {
        Self { backend, prompts }
    }

    /// A client that makes no remote calls. Every request fails with
    /// [`GenerationError::Disabled`].
    pub fn offline() -> Self {
        Self::new(GenerationBackend::Offline, PromptEngine::empty())
    }

    /// Build a client from the generation section of the configuration.
    ///
    /// Templates are only loaded for remote backends.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] if the backend settings are
    /// invalid, or [`GenerationError::Template`] if the templates cannot be
    /// loaded.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let backend_config = BackendConfig::from_generation_config(config)?;
        if backend_config.backend_type == BackendType::Offline {
            return Ok(Self::offline());
        }

        let prompts = PromptEngine::new(&backend_config.templates_dir)?;
        let backend = create_backend(&backend_config);
        info!(
            backend = backend.name(),
            image_model = %backend_config.image_model,
            text_model = %backend_config.text_model,
            "generation client ready"
        );
        Ok(Self::new(backend, prompts))
    }

    /// Name of the active backend.
    pub const fn backend_name(&self) -> &str {
        self.backend.name()
    }

    const fn is_offline(&self) -> bool {
        matches!(self.backend, GenerationBackend::Offline)
    }
}

impl GenerationSource for GenerationClient {
    async fn generate_illustration(&self, stage: Stage) -> Result<String, GenerationError> {
        if self.is_offline() {
            return Err(GenerationError::Disabled);
        }
        let prompt = self.prompts.render_illustration(stage)?;
        let started = Instant::now();
        let reference = self.backend.illustrate(&prompt).await?;
        debug!(
            backend = self.backend.name(),
            ?stage,
            elapsed_ms = started.elapsed().as_millis(),
            bytes = reference.len(),
            "illustration generated"
        );
        Ok(reference)
    }

    async fn generate_message(
        &self,
        total_effort: u64,
        total_spent: u64,
    ) -> Result<String, GenerationError> {
        if self.is_offline() {
            return Err(GenerationError::Disabled);
        }
        let prompt = self.prompts.render_encouragement(total_effort, total_spent)?;
        let started = Instant::now();
        let message = self.backend.compose(&prompt).await?;
        debug!(
            backend = self.backend.name(),
            elapsed_ms = started.elapsed().as_millis(),
            "encouragement generated"
        );
        Ok(message)
    }
}
