//! Snapshot and event structs shared by the engine, the session, and the
//! observer API.
//!
//! Front ends never see the engine's mutable state directly. They receive a
//! [`ProgressionSnapshot`] (numbers only) or a [`SessionSnapshot`] (numbers
//! plus the displayed illustration and message), and a stream of
//! [`ProgressUpdate`] events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{GenerationKind, RejectionReason, Stage};
use crate::ids::SessionId;

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Immutable view of the progression counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ProgressionSnapshot {
    /// Lifetime effort (steps) recorded.
    pub total_effort: u64,
    /// Blocks earned but not yet spent.
    pub available_currency: u64,
    /// Current growth stage.
    pub stage: Stage,
    /// One-based level of `stage`.
    pub level: u8,
    /// Blocks spent toward the current stage's quota.
    ///
    /// At the terminal stage this keeps counting past the quota.
    pub progress_in_stage: u64,
    /// Lifetime blocks spent.
    pub total_spent: u64,
    /// Effort accumulated toward the next block (`total_effort mod effort_per_unit`).
    pub effort_toward_next_unit: u64,
    /// Effort required per block.
    pub effort_per_unit: u64,
    /// Blocks required per stage.
    pub quota: u64,
    /// Blocks still needed for the next level; `None` at the terminal stage.
    pub blocks_to_next_stage: Option<u64>,
    /// Whether a generation request is outstanding (build is disabled).
    pub generation_in_flight: bool,
}

/// Immutable view of a whole session, as rendered by a front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SessionSnapshot {
    /// The session this snapshot belongs to.
    pub session_id: SessionId,
    /// The progression counters.
    pub progression: ProgressionSnapshot,
    /// The currently displayed illustration (data URI or URL), if any.
    pub illustration: Option<String>,
    /// The currently displayed encouragement message.
    pub message: String,
    /// When the session state last changed.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted when spending a block completes a stage's quota.
///
/// Receiving this is the trigger to request a new illustration and message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StageAdvanced {
    /// The stage just entered.
    pub new_stage: Stage,
    /// Lifetime effort at the moment of the advance.
    pub total_effort: u64,
    /// Lifetime blocks spent, including the block that caused the advance.
    pub total_spent: u64,
    /// Wall-clock time of the advance.
    pub advanced_at: DateTime<Utc>,
}

/// Result of a `spend_currency` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SpendOutcome {
    /// A block was spent.
    Spent {
        /// Counters after the spend.
        progression: ProgressionSnapshot,
        /// Present when this spend advanced the stage.
        advanced: Option<StageAdvanced>,
    },
    /// The command was refused; state is unchanged.
    Rejected {
        /// Why the spend was refused.
        reason: RejectionReason,
    },
}

impl SpendOutcome {
    /// The stage advance produced by this spend, if any.
    pub const fn stage_advanced(&self) -> Option<&StageAdvanced> {
        match self {
            Self::Spent { advanced, .. } => advanced.as_ref(),
            Self::Rejected { .. } => None,
        }
    }

    /// Whether the spend was refused.
    pub const fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// What a finished generation request changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GenerationOutcome {
    /// What triggered the request.
    pub kind: GenerationKind,
    /// The stage the illustration was requested for.
    pub stage: Stage,
    /// Whether a new illustration replaced the previous one.
    pub illustration_updated: bool,
    /// The illustration now displayed, whether or not it changed.
    pub illustration: Option<String>,
    /// The message now displayed. `None` when the request did not ask for one.
    pub message: Option<String>,
    /// Whether `message` is the fixed fallback text.
    pub message_is_fallback: bool,
    /// When the result was applied.
    pub completed_at: DateTime<Utc>,
}

/// An update pushed to session subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ProgressUpdate {
    /// The whole session, sent to a subscriber when it connects.
    Session(SessionSnapshot),
    /// Counters changed.
    Progress(ProgressionSnapshot),
    /// Recording effort earned at least one block (cue trigger).
    CurrencyEarned {
        /// Blocks earned by this command.
        earned: u64,
        /// Blocks available after the command.
        available_currency: u64,
    },
    /// A stage advance happened.
    StageAdvanced(StageAdvanced),
    /// A generation request finished and its result was applied.
    GenerationCompleted(GenerationOutcome),
}
