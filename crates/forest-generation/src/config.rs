//! Backend selection for the generation client.
//!
//! The generation section of `block-forest.yaml` (with its environment
//! overrides already applied by [`forest_core::config`]) names a backend and
//! carries its URL, key, and model names. [`BackendConfig`] is the validated
//! form of that section.

use std::path::PathBuf;

use forest_core::config::GenerationConfig;
use forest_core::error::GenerationError;

/// Configuration for a single generation backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Which API dialect to speak.
    pub backend_type: BackendType,
    /// Base API URL (e.g. `https://generativelanguage.googleapis.com/v1beta`).
    pub api_url: String,
    /// API key for authentication. Empty for the offline backend.
    pub api_key: String,
    /// Model used for illustrations.
    pub image_model: String,
    /// Model used for encouragement messages.
    pub text_model: String,
    /// Directory holding `illustration.j2` and `encouragement.j2`.
    pub templates_dir: PathBuf,
}

/// Supported generation backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Google Gemini `generateContent` API.
    Gemini,
    /// `OpenAI`-compatible images and chat completions APIs.
    OpenAi,
    /// No remote calls; every request fails with
    /// [`GenerationError::Disabled`].
    Offline,
}

impl BackendType {
    /// Parse a backend name as written in configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] for an unknown name.
    pub fn parse(name: &str) -> Result<Self, GenerationError> {
        match name.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openai" | "openai-compatible" => Ok(Self::OpenAi),
            "offline" | "none" | "disabled" => Ok(Self::Offline),
            other => Err(GenerationError::Config(format!(
                "unknown backend type: {other}"
            ))),
        }
    }
}

impl BackendConfig {
    /// Validate the generation section of the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Config`] if the backend name is unknown, or
    /// if a remote backend has no API key or URL.
    pub fn from_generation_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let backend_type = BackendType::parse(&config.backend)?;

        if backend_type != BackendType::Offline {
            if config.api_key.trim().is_empty() {
                return Err(GenerationError::Config(format!(
                    "backend {} requires an API key (set GEMINI_API_KEY or generation.api_key)",
                    config.backend
                )));
            }
            if config.api_url.trim().is_empty() {
                return Err(GenerationError::Config(format!(
                    "backend {} requires an API URL",
                    config.backend
                )));
            }
        }

        Ok(Self {
            backend_type,
            api_url: config.api_url.trim_end_matches('/').to_owned(),
            api_key: config.api_key.clone(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
            templates_dir: PathBuf::from(&config.templates_dir),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generation(backend: &str, key: &str) -> GenerationConfig {
        GenerationConfig {
            backend: backend.to_owned(),
            api_key: key.to_owned(),
            ..GenerationConfig::default()
        }
    }

    #[test]
    fn backend_type_parsing() {
        assert_eq!(BackendType::parse("Gemini"), Ok(BackendType::Gemini));
        assert_eq!(BackendType::parse("openai"), Ok(BackendType::OpenAi));
        assert_eq!(BackendType::parse(" offline "), Ok(BackendType::Offline));
        assert!(matches!(
            BackendType::parse("anthropic"),
            Err(GenerationError::Config(_))
        ));
    }

    #[test]
    fn remote_backend_requires_key() {
        let result = BackendConfig::from_generation_config(&generation("gemini", ""));
        assert!(matches!(result, Err(GenerationError::Config(_))));
    }

    #[test]
    fn offline_backend_needs_no_key() {
        let config = BackendConfig::from_generation_config(&generation("offline", ""));
        assert_eq!(
            config.map(|c| c.backend_type),
            Ok(BackendType::Offline)
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let mut raw = generation("openai", "sk-test");
        raw.api_url = "https://api.example.com/v1/".to_owned();
        let config = BackendConfig::from_generation_config(&raw);
        assert_eq!(
            config.map(|c| c.api_url),
            Ok("https://api.example.com/v1".to_owned())
        );
    }
}
