//! Shared type definitions for the Block Forest progression engine.
//!
//! This crate is the single source of truth for the values that cross crate
//! boundaries: the growth [`Stage`], the immutable snapshots front ends
//! render, and the events the session publishes. Types flow downstream to
//! `TypeScript` via `ts-rs` for the web widget.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for session identifiers
//! - [`enums`] -- Growth stages, rejection reasons, generation kinds
//! - [`structs`] -- Snapshots, stage-advance events, command outcomes

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{GenerationKind, RejectionReason, Stage};
pub use ids::SessionId;
pub use structs::{
    GenerationOutcome, ProgressUpdate, ProgressionSnapshot, SessionSnapshot, SpendOutcome,
    StageAdvanced,
};
