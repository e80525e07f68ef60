//! Block Forest server binary.
//!
//! Wires the progression session to a generation backend and serves it
//! over HTTP and `WebSocket`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `block-forest.yaml` (or `BLOCK_FOREST_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the generation client, falling back to offline if the backend
//!    is misconfigured
//! 4. Create the session
//! 5. Request the sapling illustration in the background
//! 6. Serve the observer API until `Ctrl-C`

mod error;
mod logging;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use forest_core::config::{ForestConfig, GenerationConfig};
use forest_core::session::Session;
use forest_generation::GenerationClient;
use forest_observer::AppState;
use tracing::{info, warn};

use crate::error::StartupError;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "block-forest.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or the HTTP listener cannot
/// be set up.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration.
    let config_path = config_path();
    let config = ForestConfig::load_or_default(&config_path)
        .map_err(StartupError::from)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // 2. Initialize structured logging.
    logging::init(&config.logging)?;
    info!(
        config = %config_path.display(),
        effort_per_unit = config.progression.effort_per_unit,
        quota = config.progression.quota,
        walk_effort = config.progression.walk_effort,
        "block-forest starting"
    );

    // 3. Create the generation client.
    let client = build_client(&config.generation);

    // 4. Create the session.
    let session = Arc::new(Session::from_config(&config, client).map_err(StartupError::from)?);

    // 5. Seed the sapling illustration.
    if config.generation.seed_on_start {
        let seed_session = Arc::clone(&session);
        tokio::spawn(async move {
            if let Some(outcome) = seed_session.seed_illustration().await {
                info!(
                    illustration_updated = outcome.illustration_updated,
                    "initial illustration request finished"
                );
            }
        });
    }

    // 6. Serve until Ctrl-C.
    let state = Arc::new(AppState::new(session));
    forest_observer::start_server(&config.server, state)
        .await
        .map_err(StartupError::from)
        .context("observer server failed")?;

    info!("block-forest stopped");
    Ok(())
}

/// Configuration path from `BLOCK_FOREST_CONFIG`, or the default.
fn config_path() -> PathBuf {
    resolve_config_path(std::env::var_os("BLOCK_FOREST_CONFIG"))
}

/// An unset or empty override selects the default path.
fn resolve_config_path(from_env: Option<OsString>) -> PathBuf {
    from_env
        .filter(|p| !p.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Build the configured client. A misconfigured backend degrades to offline
/// mode: progression keeps working and the fallback texts are shown.
fn build_client(config: &GenerationConfig) -> GenerationClient {
    match GenerationClient::from_config(config) {
        Ok(client) => client,
        Err(e) => {
            warn!(
                backend = %config.backend,
                error = %e,
                "generation backend unavailable, running offline"
            );
            GenerationClient::offline()
        }
    }
}
