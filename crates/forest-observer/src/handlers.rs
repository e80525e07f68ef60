//! Read-only endpoint handlers for the observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Current session snapshot |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::response::Html;
use forest_types::SessionSnapshot;
use minijinja::{Environment, context};

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Status page template. The `.html` name turns on auto-escaping.
const INDEX_TEMPLATE: &str = include_str!("../templates/index.html");

/// Serve a minimal HTML page showing the tree, the counters, and buttons for
/// the walk and build commands.
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, ObserverError> {
    let snapshot = state.session().snapshot().await;
    render_index(&snapshot)
        .map(Html)
        .map_err(|e| ObserverError::Internal(format!("failed to render status page: {e}")))
}

fn render_index(snapshot: &SessionSnapshot) -> Result<String, minijinja::Error> {
    let mut env = Environment::new();
    env.add_template("index.html", INDEX_TEMPLATE)?;
    env.get_template("index.html")?.render(context! {
        p => &snapshot.progression,
        label => snapshot.progression.stage.label(),
        illustration => &snapshot.illustration,
        message => &snapshot.message,
    })
}

// ---------------------------------------------------------------------------
// GET /api/state -- current session snapshot
// ---------------------------------------------------------------------------

/// Return the current session snapshot: counters, stage, illustration,
/// message, and whether generation is in flight.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<SessionSnapshot> {
    Json(state.session().snapshot().await)
}
