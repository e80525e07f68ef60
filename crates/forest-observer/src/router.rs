//! Axum router construction for the observer API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin front-end access.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{commands, handlers, ws};

/// Build the complete Axum router for the observer server.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/progress` -- `WebSocket` progress stream
/// - `GET /api/state` -- current session snapshot
/// - `POST /api/walk` -- record one walk
/// - `POST /api/effort` -- record an arbitrary effort
/// - `POST /api/build` -- spend one block
///
/// CORS allows any origin so a separately hosted front end can connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/progress", get(ws::ws_progress))
        // REST API
        .route("/api/state", get(handlers::get_state))
        .route("/api/walk", post(commands::walk))
        .route("/api/effort", post(commands::record_effort))
        .route("/api/build", post(commands::build))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
