//! Progression engine, configuration, and session actor for Block Forest.
//!
//! Steps earn blocks, blocks grow the tree, and each new growth stage asks a
//! remote generation service for a fresh illustration and message.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `block-forest.yaml` into
//!   strongly-typed structs.
//! - [`engine`] -- The pure step -> block -> stage state machine.
//! - [`error`] -- [`ProgressError`] and [`GenerationError`].
//! - [`generation`] -- The [`GenerationSource`] collaborator trait.
//! - [`session`] -- The lock-guarded [`Session`] actor that drives the engine
//!   and applies generation results.
//!
//! [`ProgressError`]: error::ProgressError
//! [`GenerationError`]: error::GenerationError
//! [`GenerationSource`]: generation::GenerationSource
//! [`Session`]: session::Session

pub mod config;
pub mod engine;
pub mod error;
pub mod generation;
pub mod session;
