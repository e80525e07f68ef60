//! Remote illustration and message generation for Block Forest.
//!
//! Implements [`forest_core::generation::GenerationSource`] over HTTP model
//! APIs. Each request renders a `minijinja` prompt template and sends it to
//! one backend:
//!
//! - **Gemini** -- `generateContent` for both the image model (inline image
//!   data) and the text model.
//! - **`OpenAI`-compatible** -- `images/generations` and `chat/completions`.
//! - **Offline** -- no network; every request fails with
//!   [`GenerationError::Disabled`](forest_core::error::GenerationError::Disabled),
//!   so the session keeps its placeholder content.
//!
//! # Modules
//!
//! - [`backend`] -- Enum-dispatched HTTP backends and response extraction.
//! - [`client`] -- [`GenerationClient`](client::GenerationClient), the
//!   collaborator handed to the session.
//! - [`config`] -- Backend selection and validation.
//! - [`prompt`] -- Template loading and rendering.

pub mod backend;
pub mod client;
pub mod config;
pub mod prompt;

pub use client::GenerationClient;
