//! Configuration loading and typed config structures for Block Forest.
//!
//! The canonical configuration lives in `block-forest.yaml` at the project
//! root. Every section and field has a default matching the original widget
//! (100 steps per block, 20 blocks per stage, 50 steps per walk), so an empty
//! or missing file yields a working configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is outside its allowed range.
    #[error("invalid config value: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `block-forest.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ForestConfig {
    /// Effort, currency and stage rules.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Remote generation backend and prompts.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// HTTP listener for the observer API.
    #[serde(default)]
    pub server: ServerConfig,

    /// Log level and output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ForestConfig {
    /// Load configuration from a YAML file and apply environment overrides.
    ///
    /// Environment variables override YAML values:
    /// - `GEMINI_API_KEY` (or `API_KEY`) overrides `generation.api_key`
    /// - `GENERATION_BACKEND` overrides `generation.backend`
    /// - `GENERATION_API_URL` overrides `generation.api_url`
    /// - `FOREST_HOST` / `FOREST_PORT` override `server.host` / `server.port`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if it is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load from `path` if it exists, otherwise start from defaults.
    ///
    /// Environment overrides are applied in both cases.
    ///
    /// # Errors
    ///
    /// Same as [`from_file`](Self::from_file) when the file exists;
    /// otherwise only [`ConfigError::Invalid`] from a malformed override.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// Does not consult the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] or [`ConfigError::Invalid`].
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes to `null`, which serde_yml rejects
        // for a struct; treat it as "all defaults".
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first zero value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.progression;
        if p.effort_per_unit == 0 {
            return Err(ConfigError::Invalid(
                "progression.effort_per_unit must be positive".to_owned(),
            ));
        }
        if p.quota == 0 {
            return Err(ConfigError::Invalid(
                "progression.quota must be positive".to_owned(),
            ));
        }
        if p.walk_effort == 0 {
            return Err(ConfigError::Invalid(
                "progression.walk_effort must be positive".to_owned(),
            ));
        }
        if self.generation.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "generation.timeout_ms must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.generation.apply_env_overrides();
        self.server.apply_env_overrides()
    }
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Rules converting effort into blocks and blocks into stages.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProgressionConfig {
    /// Effort (steps) required to earn one block.
    #[serde(default = "default_effort_per_unit")]
    pub effort_per_unit: u64,

    /// Blocks that must be spent to advance one stage.
    #[serde(default = "default_quota")]
    pub quota: u64,

    /// Effort recorded by one walk command.
    #[serde(default = "default_walk_effort")]
    pub walk_effort: u64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            effort_per_unit: default_effort_per_unit(),
            quota: default_quota(),
            walk_effort: default_walk_effort(),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Remote generation settings.
///
/// `backend` is one of `gemini`, `openai` (any `OpenAI`-compatible API) or
/// `offline` (no remote calls; every request fails and falls back).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GenerationConfig {
    /// Backend type name.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Base API URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// API key. Usually supplied through the environment instead.
    #[serde(default)]
    pub api_key: String,

    /// Model used for illustrations.
    #[serde(default = "default_image_model")]
    pub image_model: String,

    /// Model used for encouragement messages.
    #[serde(default = "default_text_model")]
    pub text_model: String,

    /// Directory holding `illustration.j2` and `encouragement.j2`.
    #[serde(default = "default_templates_dir")]
    pub templates_dir: String,

    /// Upper bound on one generation request, in milliseconds.
    #[serde(default = "default_generation_timeout_ms")]
    pub timeout_ms: u64,

    /// Message shown at session start.
    #[serde(default = "default_initial_message")]
    pub initial_message: String,

    /// Message substituted when message generation fails.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Whether to request the sapling illustration when the session starts.
    #[serde(default = "default_true")]
    pub seed_on_start: bool,
}

impl GenerationConfig {
    /// The request timeout as a [`Duration`].
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = env_non_empty("GEMINI_API_KEY").or_else(|| env_non_empty("API_KEY")) {
            self.api_key = key;
        }
        if let Some(backend) = env_non_empty("GENERATION_BACKEND") {
            self.backend = backend;
        }
        if let Some(url) = env_non_empty("GENERATION_API_URL") {
            self.api_url = url;
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            api_url: default_api_url(),
            api_key: String::new(),
            image_model: default_image_model(),
            text_model: default_text_model(),
            templates_dir: default_templates_dir(),
            timeout_ms: default_generation_timeout_ms(),
            initial_message: default_initial_message(),
            fallback_message: default_fallback_message(),
            seed_on_start: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// Observer API listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(host) = env_non_empty("FOREST_HOST") {
            self.host = host;
        }
        if let Some(port) = env_non_empty("FOREST_PORT") {
            self.port = port
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("invalid FOREST_PORT: {e}")))?;
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Log output settings. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (e.g. `info`, `forest_core=debug`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl LoggingConfig {
    /// Whether structured JSON output was requested.
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_effort_per_unit() -> u64 {
    100
}

const fn default_quota() -> u64 {
    20
}

const fn default_walk_effort() -> u64 {
    50
}

fn default_backend() -> String {
    "gemini".to_owned()
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_owned()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_owned()
}

fn default_text_model() -> String {
    "gemini-2.5-flash".to_owned()
}

fn default_templates_dir() -> String {
    "templates".to_owned()
}

const fn default_generation_timeout_ms() -> u64 {
    30_000
}

fn default_initial_message() -> String {
    "걸음을 걸어 블록을 모아보세요!".to_owned()
}

fn default_fallback_message() -> String {
    "꽃을 피우기 위해 블록을 더 모아보세요! 🌸".to_owned()
}

const fn default_true() -> bool {
    true
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

const fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_owned()
}

fn default_log_format() -> String {
    "pretty".to_owned()
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
