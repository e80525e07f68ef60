//! Command endpoint handlers that change the session.
//!
//! Each handler maps onto exactly one session command. A spend that
//! advances the stage returns immediately; the illustration and message
//! follow on a background task and reach clients over `/ws/progress`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/walk` | Record the configured per-walk effort |
//! | `POST` | `/api/effort` | Record an arbitrary effort amount |
//! | `POST` | `/api/build` | Spend one block |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use forest_types::{ProgressionSnapshot, SpendOutcome};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /api/effort`.
#[derive(Debug, serde::Deserialize)]
pub struct EffortRequest {
    /// Steps to record. Must be positive.
    pub amount: u64,
}

/// Response body for the effort endpoints.
#[derive(Debug, serde::Serialize)]
pub struct EffortResponse {
    /// Blocks earned by this effort.
    pub earned: u64,
    /// Counters after recording.
    pub progression: ProgressionSnapshot,
}

// ---------------------------------------------------------------------------
// POST /api/walk
// ---------------------------------------------------------------------------

/// Record one walk's worth of effort.
pub async fn walk(
    State(state): State<Arc<AppState>>,
) -> Result<Json<EffortResponse>, ObserverError> {
    let earned = state.session().walk().await?;
    Ok(effort_response(&state, earned).await)
}

// ---------------------------------------------------------------------------
// POST /api/effort
// ---------------------------------------------------------------------------

/// Record `amount` steps of effort.
///
/// A zero, negative, or malformed amount is rejected with 400 and leaves
/// the session unchanged.
pub async fn record_effort(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EffortRequest>, JsonRejection>,
) -> Result<Json<EffortResponse>, ObserverError> {
    let Json(body) = body?;
    let earned = state.session().record_effort(body.amount).await?;
    Ok(effort_response(&state, earned).await)
}

async fn effort_response(state: &AppState, earned: u64) -> Json<EffortResponse> {
    let progression = state.session().snapshot().await.progression;
    Json(EffortResponse {
        earned,
        progression,
    })
}

// ---------------------------------------------------------------------------
// POST /api/build
// ---------------------------------------------------------------------------

/// Spend one block.
///
/// Returns the [`SpendOutcome`] on success, or 409 with the rejection
/// reason. On a stage advance, generation is started in the background.
pub async fn build(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SpendOutcome>, ObserverError> {
    let session = state.session();
    let outcome = session.spend_currency().await;

    match &outcome {
        SpendOutcome::Rejected { reason } => return Err(ObserverError::Rejected(*reason)),
        SpendOutcome::Spent {
            advanced: Some(advance),
            ..
        } => {
            info!(stage = ?advance.new_stage, "stage advanced, requesting illustration");
            let session = Arc::clone(session);
            let advance = advance.clone();
            tokio::spawn(async move {
                session.complete_stage_advance(&advance).await;
            });
        }
        SpendOutcome::Spent { advanced: None, .. } => {}
    }

    Ok(Json(outcome))
}
