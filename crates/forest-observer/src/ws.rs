//! `WebSocket` handler for real-time progress streaming.
//!
//! Clients connect to `GET /ws/progress` and first receive the whole
//! session (counters, illustration, and message) as a `session` message,
//! then one JSON-encoded
//! [`ProgressUpdate`] for every change the session publishes.
//!
//! If a client falls behind, lagged messages are skipped and the client
//! resumes from the most recent update.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use forest_types::ProgressUpdate;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and begin
/// streaming progress updates.
///
/// # Route
///
/// `GET /ws/progress`
pub async fn ws_progress(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Send one update as a text frame. Returns `false` once the client is gone.
async fn send_update(socket: &mut WebSocket, update: &ProgressUpdate) -> bool {
    let json = match serde_json::to_string(update) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize progress update: {e}");
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// The first frame a new subscriber receives.
async fn initial_update(state: &AppState) -> ProgressUpdate {
    ProgressUpdate::Session(state.session().snapshot().await)
}

/// Handle the `WebSocket` lifecycle: send the whole session, then
/// forward each broadcast update as a text frame.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    // Subscribe before reading the snapshot so no update falls in between.
    let mut rx = state.subscribe();
    let initial = initial_update(&state).await;
    if !send_update(&mut socket, &initial).await {
        debug!("WebSocket client disconnected (initial send failed)");
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(update) => {
                        if !send_update(&mut socket, &update).await {
                            debug!("WebSocket client disconnected (send failed)");
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Progress channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    // The stream is one-way; client text and binary frames are ignored.
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use forest_core::config::ForestConfig;
    use forest_core::session::Session;
    use forest_generation::GenerationClient;

    use super::*;

    #[tokio::test]
    async fn first_frame_is_the_whole_session() {
        let session = Session::from_config(&ForestConfig::default(), GenerationClient::offline());
        assert!(session.is_ok(), "default config should build a session");
        let Ok(session) = session else { return };
        let state = AppState::new(Arc::new(session));
        state.session().record_effort(250).await.ok();

        let update = initial_update(&state).await;
        assert!(matches!(update, ProgressUpdate::Session(_)), "got: {update:?}");
        let ProgressUpdate::Session(snapshot) = &update else { return };
        assert_eq!(snapshot.session_id, state.session().id());
        assert_eq!(snapshot.progression.total_effort, 250);
        assert_eq!(snapshot.message, state.session().settings().initial_message);

        let json = serde_json::to_value(&update).unwrap_or_default();
        assert_eq!(json["kind"], "session");
        assert!(json["data"]["message"].is_string());
    }
}
