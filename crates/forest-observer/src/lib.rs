//! HTTP and `WebSocket` API for a Block Forest session.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Command endpoints** (`POST /api/walk`, `/api/effort`, `/api/build`)
//!   that drive the session's progression commands
//! - **`GET /api/state`** returning the full session snapshot
//! - **`WebSocket` endpoint** (`/ws/progress`) streaming every
//!   [`ProgressUpdate`](forest_types::ProgressUpdate) via
//!   [`tokio::sync::broadcast`]
//! - **Minimal HTML page** (`GET /`) showing the tree, counters, and the
//!   current message
//!
//! # Architecture
//!
//! Handlers share one [`ForestSession`] through [`AppState`]. The session's
//! lock orders commands; the observer adds no locking of its own. A build
//! that advances the stage spawns the generation follow-up so the HTTP
//! response is not held for the model call.

pub mod commands;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use router::build_router;
pub use server::{ServerError, start_server};
pub use state::{AppState, ForestSession};
