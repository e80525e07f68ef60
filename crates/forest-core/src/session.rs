//! The session actor: one engine, one lock, one subscriber stream.
//!
//! [`Session`] is the single logical actor that owns a
//! [`ProgressionEngine`] together with the displayed illustration and
//! message. Every command runs inside one acquisition of a
//! [`tokio::sync::Mutex`], so commands apply atomically and in arrival order.
//!
//! Remote generation is the only suspending work. It runs with the lock
//! released, bounded by a timeout, and its result is applied by a follow-up
//! atomic update that does not re-check the stage (last write wins). The
//! engine's in-flight guard keeps at most one request outstanding.
//!
//! # Events
//!
//! Each state change is published to a [`broadcast`] channel as a
//! [`ProgressUpdate`]. Subscribers that fall behind skip to the newest
//! message.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use forest_types::{
    GenerationKind, GenerationOutcome, ProgressUpdate, SessionId, SessionSnapshot, SpendOutcome,
    Stage, StageAdvanced,
};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::config::ForestConfig;
use crate::engine::{ProgressionEngine, ProgressionRules};
use crate::error::{GenerationError, ProgressError};
use crate::generation::GenerationSource;

/// Capacity of the progress update channel.
const BROADCAST_CAPACITY: usize = 256;

/// Per-session behaviour that is not part of the progression rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Effort recorded by one [`Session::walk`].
    pub walk_effort: u64,
    /// Upper bound on each generation request.
    pub generation_timeout: Duration,
    /// Message displayed before any generation succeeds.
    pub initial_message: String,
    /// Message substituted when message generation fails.
    pub fallback_message: String,
}

impl SessionSettings {
    /// Extract session settings from the loaded configuration.
    pub fn from_config(config: &ForestConfig) -> Self {
        Self {
            walk_effort: config.progression.walk_effort,
            generation_timeout: config.generation.timeout(),
            initial_message: config.generation.initial_message.clone(),
            fallback_message: config.generation.fallback_message.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&ForestConfig::default())
    }
}

/// State guarded by the session lock.
#[derive(Debug)]
struct SessionInner {
    engine: ProgressionEngine,
    illustration: Option<String>,
    message: String,
    updated_at: DateTime<Utc>,
}

impl SessionInner {
    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A single player's progression session.
pub struct Session<G> {
    id: SessionId,
    settings: SessionSettings,
    source: G,
    inner: Mutex<SessionInner>,
    tx: broadcast::Sender<ProgressUpdate>,
}

impl<G: GenerationSource> Session<G> {
    /// Create a session around a fresh engine.
    pub fn new(engine: ProgressionEngine, source: G, settings: SessionSettings) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        let inner = SessionInner {
            engine,
            illustration: None,
            message: settings.initial_message.clone(),
            updated_at: Utc::now(),
        };
        let id = SessionId::new();
        info!(session_id = %id, "session created");
        Self {
            id,
            settings,
            source,
            inner: Mutex::new(inner),
            tx,
        }
    }

    /// Create a session from the loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidArgument`] if the progression rates
    /// are zero.
    pub fn from_config(config: &ForestConfig, source: G) -> Result<Self, ProgressError> {
        let rules = ProgressionRules::from_config(&config.progression)?;
        Ok(Self::new(
            ProgressionEngine::new(rules),
            source,
            SessionSettings::from_config(config),
        ))
    }

    /// This session's identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// This session's settings.
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// The generation collaborator.
    pub const fn source(&self) -> &G {
        &self.source
    }

    /// Subscribe to progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressUpdate> {
        self.tx.subscribe()
    }

    /// Immutable view of the whole session.
    pub async fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.lock().await;
        SessionSnapshot {
            session_id: self.id,
            progression: inner.engine.snapshot(),
            illustration: inner.illustration.clone(),
            message: inner.message.clone(),
            updated_at: inner.updated_at,
        }
    }

    /// Record one walk's worth of effort.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidArgument`] if the total would
    /// overflow.
    pub async fn walk(&self) -> Result<u64, ProgressError> {
        self.record_effort(self.settings.walk_effort).await
    }

    /// Record `amount` effort and return the blocks it earned.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidArgument`] for a zero or overflowing
    /// amount; the session is unchanged.
    pub async fn record_effort(&self, amount: u64) -> Result<u64, ProgressError> {
        let mut inner = self.inner.lock().await;
        let earned = inner.engine.record_effort(amount)?;
        inner.touch();

        let progression = inner.engine.snapshot();
        if earned > 0 {
            self.publish(ProgressUpdate::CurrencyEarned {
                earned,
                available_currency: progression.available_currency,
            });
        }
        self.publish(ProgressUpdate::Progress(progression));
        Ok(earned)
    }

    /// Spend one block.
    ///
    /// When the outcome carries a [`StageAdvanced`], the caller must follow
    /// up with [`complete_stage_advance`](Self::complete_stage_advance);
    /// until then further spends are rejected as busy.
    pub async fn spend_currency(&self) -> SpendOutcome {
        let mut inner = self.inner.lock().await;
        let outcome = inner.engine.spend_currency();

        match &outcome {
            SpendOutcome::Rejected { reason } => {
                debug!(session_id = %self.id, %reason, "spend rejected");
            }
            SpendOutcome::Spent {
                progression,
                advanced,
            } => {
                inner.touch();
                self.publish(ProgressUpdate::Progress(progression.clone()));
                if let Some(advance) = advanced {
                    self.publish(ProgressUpdate::StageAdvanced(advance.clone()));
                }
            }
        }
        outcome
    }

    /// Fetch a new illustration and message for a stage advance and apply
    /// them.
    ///
    /// Both requests run concurrently outside the lock. A failed
    /// illustration leaves the previous one displayed; a failed message is
    /// replaced by the fallback text. The stage advance itself is never
    /// rolled back. Clears the in-flight guard.
    pub async fn complete_stage_advance(&self, advance: &StageAdvanced) -> GenerationOutcome {
        let (image, text) = tokio::join!(
            self.bounded(self.source.generate_illustration(advance.new_stage)),
            self.bounded(
                self.source
                    .generate_message(advance.total_effort, advance.total_spent)
            ),
        );

        let (message, message_is_fallback) = match text {
            Ok(message) if !message.trim().is_empty() => (message.trim().to_owned(), false),
            Ok(_) => {
                warn!(session_id = %self.id, "message generation returned empty text, using fallback");
                (self.settings.fallback_message.clone(), true)
            }
            Err(e) => {
                warn!(session_id = %self.id, error = %e, "message generation failed, using fallback");
                (self.settings.fallback_message.clone(), true)
            }
        };

        let mut inner = self.inner.lock().await;
        let illustration_updated = self.apply_illustration(&mut inner, advance.new_stage, image);
        inner.message.clone_from(&message);
        inner.engine.finish_generation();
        inner.touch();

        let outcome = GenerationOutcome {
            kind: GenerationKind::StageAdvance,
            stage: advance.new_stage,
            illustration_updated,
            illustration: inner.illustration.clone(),
            message: Some(message),
            message_is_fallback,
            completed_at: inner.updated_at,
        };
        info!(
            session_id = %self.id,
            stage = ?advance.new_stage,
            illustration_updated,
            message_is_fallback,
            "stage advance generation applied"
        );
        self.publish(ProgressUpdate::GenerationCompleted(outcome.clone()));
        self.publish(ProgressUpdate::Progress(inner.engine.snapshot()));
        outcome
    }

    /// Request the illustration for the current stage, typically the sapling
    /// at session start.
    ///
    /// Returns `None` without doing anything if a generation request is
    /// already in flight. Spends are rejected as busy while this runs.
    pub async fn seed_illustration(&self) -> Option<GenerationOutcome> {
        let stage = {
            let mut inner = self.inner.lock().await;
            if !inner.engine.begin_generation() {
                debug!(session_id = %self.id, "seed illustration skipped, generation busy");
                return None;
            }
            self.publish(ProgressUpdate::Progress(inner.engine.snapshot()));
            inner.engine.state().stage()
        };

        let image = self
            .bounded(self.source.generate_illustration(stage))
            .await;

        let mut inner = self.inner.lock().await;
        let illustration_updated = self.apply_illustration(&mut inner, stage, image);
        inner.engine.finish_generation();
        inner.touch();

        let outcome = GenerationOutcome {
            kind: GenerationKind::Seed,
            stage,
            illustration_updated,
            illustration: inner.illustration.clone(),
            message: None,
            message_is_fallback: false,
            completed_at: inner.updated_at,
        };
        self.publish(ProgressUpdate::GenerationCompleted(outcome.clone()));
        self.publish(ProgressUpdate::Progress(inner.engine.snapshot()));
        Some(outcome)
    }

    /// Replace the illustration on success; keep the previous one on failure.
    fn apply_illustration(
        &self,
        inner: &mut SessionInner,
        stage: Stage,
        image: Result<String, GenerationError>,
    ) -> bool {
        match image {
            Ok(reference) if !reference.is_empty() => {
                inner.illustration = Some(reference);
                true
            }
            Ok(_) => {
                warn!(session_id = %self.id, ?stage, "illustration generation returned nothing, keeping previous");
                false
            }
            Err(e) => {
                warn!(session_id = %self.id, ?stage, error = %e, "illustration generation failed, keeping previous");
                false
            }
        }
    }

    /// Run a generation future under the configured deadline.
    async fn bounded<F>(&self, request: F) -> Result<String, GenerationError>
    where
        F: Future<Output = Result<String, GenerationError>>,
    {
        let deadline = self.settings.generation_timeout;
        tokio::time::timeout(deadline, request)
            .await
            .unwrap_or_else(|_| {
                Err(GenerationError::Timeout {
                    timeout_ms: u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                })
            })
    }

    /// Publish an update. Having no subscribers is not an error.
    fn publish(&self, update: ProgressUpdate) -> usize {
        self.tx.send(update).unwrap_or(0)
    }
}
