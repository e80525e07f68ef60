//! The progression engine: effort to blocks, blocks to stages.
//!
//! [`ProgressionEngine`] owns the only mutable game state and the pure rules
//! that change it. It has no I/O and no clock-driven behaviour; the
//! [`Session`](crate::session::Session) wraps it in a lock and drives the
//! remote generation that stage advances trigger.
//!
//! # Rules
//!
//! ```text
//! record_effort(n):  total_effort += n
//!                    available    += floor(total/EPU) - floor((total-n)/EPU)
//! spend_currency():  available -= 1, total_spent += 1, progress += 1
//!                    progress >= QUOTA && stage < MAX  =>  stage += 1, progress = 0
//! ```
//!
//! At the terminal stage `progress_in_stage` keeps counting past the quota
//! and no further [`StageAdvanced`] is emitted.

use std::num::NonZeroU64;

use chrono::Utc;
use forest_types::{ProgressionSnapshot, RejectionReason, SpendOutcome, Stage, StageAdvanced};
use tracing::{debug, info};

use crate::config::ProgressionConfig;
use crate::error::ProgressError;

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

/// The fixed conversion rates of one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressionRules {
    effort_per_unit: NonZeroU64,
    quota: NonZeroU64,
}

impl ProgressionRules {
    /// Build rules from raw rates.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidArgument`] if either rate is zero.
    pub fn new(effort_per_unit: u64, quota: u64) -> Result<Self, ProgressError> {
        let effort_per_unit = NonZeroU64::new(effort_per_unit).ok_or_else(|| {
            ProgressError::InvalidArgument("effort_per_unit must be positive".to_owned())
        })?;
        let quota = NonZeroU64::new(quota)
            .ok_or_else(|| ProgressError::InvalidArgument("quota must be positive".to_owned()))?;
        Ok(Self {
            effort_per_unit,
            quota,
        })
    }

    /// Build rules from the `progression` config section.
    pub fn from_config(config: &ProgressionConfig) -> Result<Self, ProgressError> {
        Self::new(config.effort_per_unit, config.quota)
    }

    /// Effort required per block.
    pub const fn effort_per_unit(&self) -> u64 {
        self.effort_per_unit.get()
    }

    /// Blocks required per stage.
    pub const fn quota(&self) -> u64 {
        self.quota.get()
    }

    /// Blocks ever earned for a given lifetime effort.
    const fn units_for(&self, effort: u64) -> u64 {
        match effort.checked_div(self.effort_per_unit.get()) {
            Some(units) => units,
            None => 0,
        }
    }
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            effort_per_unit: DEFAULT_EFFORT_PER_UNIT,
            quota: DEFAULT_QUOTA,
        }
    }
}

const DEFAULT_EFFORT_PER_UNIT: NonZeroU64 = match NonZeroU64::new(100) {
    Some(n) => n,
    None => NonZeroU64::MIN,
};

const DEFAULT_QUOTA: NonZeroU64 = match NonZeroU64::new(20) {
    Some(n) => n,
    None => NonZeroU64::MIN,
};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// The mutable progression record. All fields start at zero.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionState {
    total_effort: u64,
    available_currency: u64,
    stage: Stage,
    progress_in_stage: u64,
    total_spent: u64,
}

impl ProgressionState {
    /// Lifetime effort recorded.
    pub const fn total_effort(&self) -> u64 {
        self.total_effort
    }

    /// Blocks earned but not yet spent.
    pub const fn available_currency(&self) -> u64 {
        self.available_currency
    }

    /// Current growth stage.
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Blocks spent toward the current stage's quota.
    pub const fn progress_in_stage(&self) -> u64 {
        self.progress_in_stage
    }

    /// Lifetime blocks spent.
    pub const fn total_spent(&self) -> u64 {
        self.total_spent
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Owns [`ProgressionState`] and applies the two progression commands.
///
/// Also holds the in-flight generation guard, so that stage-advance side
/// effects stay serialized even when the engine runs headless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressionEngine {
    rules: ProgressionRules,
    state: ProgressionState,
    generation_in_flight: bool,
}

impl ProgressionEngine {
    /// Create an engine with all counters at zero.
    pub fn new(rules: ProgressionRules) -> Self {
        Self {
            rules,
            state: ProgressionState::default(),
            generation_in_flight: false,
        }
    }

    /// The conversion rates.
    pub const fn rules(&self) -> &ProgressionRules {
        &self.rules
    }

    /// The current counters.
    pub const fn state(&self) -> &ProgressionState {
        &self.state
    }

    /// Whether a generation request is outstanding.
    pub const fn is_generating(&self) -> bool {
        self.generation_in_flight
    }

    /// Record `amount` effort and return the number of blocks it earned.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvalidArgument`] if `amount` is zero or the
    /// effort counter would overflow. State is unchanged on error.
    pub fn record_effort(&mut self, amount: u64) -> Result<u64, ProgressError> {
        if amount == 0 {
            return Err(ProgressError::InvalidArgument(
                "effort amount must be positive".to_owned(),
            ));
        }
        let before = self.state.total_effort;
        let after = before.checked_add(amount).ok_or_else(|| {
            ProgressError::InvalidArgument(format!(
                "effort amount {amount} overflows total effort {before}"
            ))
        })?;

        // floor(after/EPU) >= floor(before/EPU) because after > before.
        let earned = self
            .rules
            .units_for(after)
            .saturating_sub(self.rules.units_for(before));

        self.state.total_effort = after;
        self.state.available_currency = self.state.available_currency.saturating_add(earned);

        if earned > 0 {
            debug!(
                amount,
                earned,
                total_effort = after,
                available_currency = self.state.available_currency,
                "effort earned currency"
            );
        }
        Ok(earned)
    }

    /// Spend one block toward the current stage.
    ///
    /// Returns [`SpendOutcome::Rejected`] with state untouched when no block
    /// is available or a generation request is outstanding. A spend that
    /// completes the quota below the terminal stage advances the stage,
    /// reports a [`StageAdvanced`], and marks a generation as in flight; the
    /// caller must eventually call [`finish_generation`](Self::finish_generation).
    pub fn spend_currency(&mut self) -> SpendOutcome {
        if self.generation_in_flight {
            return SpendOutcome::Rejected {
                reason: RejectionReason::GenerationBusy,
            };
        }
        if self.state.available_currency == 0 {
            return SpendOutcome::Rejected {
                reason: RejectionReason::InsufficientCurrency,
            };
        }

        // available > 0 implies total_spent < floor(total_effort/EPU), so
        // neither increment can saturate.
        self.state.available_currency = self.state.available_currency.saturating_sub(1);
        self.state.total_spent = self.state.total_spent.saturating_add(1);
        self.state.progress_in_stage = self.state.progress_in_stage.saturating_add(1);

        let mut advanced = None;
        if self.state.progress_in_stage >= self.rules.quota() {
            if let Some(next) = self.state.stage.next() {
                self.state.stage = next;
                self.state.progress_in_stage = 0;
                self.generation_in_flight = true;
                info!(
                    new_stage = ?next,
                    level = next.level(),
                    total_effort = self.state.total_effort,
                    total_spent = self.state.total_spent,
                    "stage advanced"
                );
                advanced = Some(StageAdvanced {
                    new_stage: next,
                    total_effort: self.state.total_effort,
                    total_spent: self.state.total_spent,
                    advanced_at: Utc::now(),
                });
            }
        }

        SpendOutcome::Spent {
            progression: self.snapshot(),
            advanced,
        }
    }

    /// Mark a generation request as in flight.
    ///
    /// Returns `false` (and changes nothing) if one already is.
    pub const fn begin_generation(&mut self) -> bool {
        if self.generation_in_flight {
            return false;
        }
        self.generation_in_flight = true;
        true
    }

    /// Clear the in-flight generation guard.
    pub const fn finish_generation(&mut self) {
        self.generation_in_flight = false;
    }

    /// Effort toward the next block and the effort required per block.
    pub const fn progress_fraction(&self) -> (u64, u64) {
        let per_unit = self.rules.effort_per_unit();
        let remainder = match self.state.total_effort.checked_rem(per_unit) {
            Some(r) => r,
            None => 0,
        };
        (remainder, per_unit)
    }

    /// Blocks still needed for the next level, or `None` at the terminal stage.
    pub const fn blocks_to_next_stage(&self) -> Option<u64> {
        if self.state.stage.is_terminal() {
            return None;
        }
        Some(self.rules.quota().saturating_sub(self.state.progress_in_stage))
    }

    /// Immutable view of the counters.
    pub fn snapshot(&self) -> ProgressionSnapshot {
        let (effort_toward_next_unit, effort_per_unit) = self.progress_fraction();
        ProgressionSnapshot {
            total_effort: self.state.total_effort,
            available_currency: self.state.available_currency,
            stage: self.state.stage,
            level: self.state.stage.level(),
            progress_in_stage: self.state.progress_in_stage,
            total_spent: self.state.total_spent,
            effort_toward_next_unit,
            effort_per_unit,
            quota: self.rules.quota(),
            blocks_to_next_stage: self.blocks_to_next_stage(),
            generation_in_flight: self.generation_in_flight,
        }
    }

    /// Re-check every state invariant.
    ///
    /// Holds by construction for any sequence of commands; exists to catch
    /// corruption in tests and debug tooling.
    ///
    /// # Errors
    ///
    /// Returns [`ProgressError::InvariantViolated`] naming the first failed check.
    pub fn verify(&self) -> Result<(), ProgressError> {
        let earned = self.rules.units_for(self.state.total_effort);
        let expected = earned.checked_sub(self.state.total_spent).ok_or_else(|| {
            ProgressError::InvariantViolated(format!(
                "total_spent {} exceeds blocks earned {earned}",
                self.state.total_spent
            ))
        })?;
        if expected != self.state.available_currency {
            return Err(ProgressError::InvariantViolated(format!(
                "available_currency {} != earned {earned} - spent {}",
                self.state.available_currency, self.state.total_spent
            )));
        }
        if !self.state.stage.is_terminal() && self.state.progress_in_stage >= self.rules.quota() {
            return Err(ProgressError::InvariantViolated(format!(
                "progress_in_stage {} reached quota {} below the terminal stage",
                self.state.progress_in_stage,
                self.rules.quota()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(epu: u64, quota: u64) -> ProgressionEngine {
        ProgressionRules::new(epu, quota)
            .map(ProgressionEngine::new)
            .unwrap_or_default()
    }

    #[test]
    fn zero_rates_are_invalid() {
        assert!(ProgressionRules::new(0, 20).is_err());
        assert!(ProgressionRules::new(100, 0).is_err());
    }

    #[test]
    fn default_rules_match_the_widget() {
        let rules = ProgressionRules::default();
        assert_eq!(rules.effort_per_unit(), 100);
        assert_eq!(rules.quota(), 20);
    }

    #[test]
    fn effort_below_threshold_earns_nothing() {
        let mut e = engine(100, 20);
        assert_eq!(e.record_effort(50), Ok(0));
        assert_eq!(e.state().available_currency(), 0);
        assert_eq!(e.progress_fraction(), (50, 100));
    }

    #[test]
    fn crossing_several_thresholds_earns_the_floor_delta() {
        let mut e = engine(100, 20);
        assert_eq!(e.record_effort(90), Ok(0));
        assert_eq!(e.record_effort(250), Ok(3));
        assert_eq!(e.state().total_effort(), 340);
        assert_eq!(e.state().available_currency(), 3);
        assert_eq!(e.progress_fraction(), (40, 100));
        assert!(e.verify().is_ok());
    }

    #[test]
    fn zero_effort_is_rejected_without_change() {
        let mut e = engine(100, 20);
        let _ = e.record_effort(120);
        let before = e.clone();
        assert!(matches!(
            e.record_effort(0),
            Err(ProgressError::InvalidArgument(_))
        ));
        assert_eq!(e, before);
    }

    #[test]
    fn overflowing_effort_is_rejected_without_change() {
        let mut e = engine(100, 20);
        let _ = e.record_effort(u64::MAX);
        let before = e.clone();
        assert!(e.record_effort(1).is_err());
        assert_eq!(e, before);
    }

    #[test]
    fn spend_without_currency_is_rejected() {
        let mut e = engine(100, 20);
        let before = e.clone();
        let outcome = e.spend_currency();
        assert_eq!(
            outcome,
            SpendOutcome::Rejected {
                reason: RejectionReason::InsufficientCurrency
            }
        );
        assert_eq!(e, before);
    }

    #[test]
    fn spend_moves_one_block_into_progress() {
        let mut e = engine(100, 20);
        let _ = e.record_effort(200);
        let outcome = e.spend_currency();
        assert!(outcome.stage_advanced().is_none());
        assert_eq!(e.state().available_currency(), 1);
        assert_eq!(e.state().total_spent(), 1);
        assert_eq!(e.state().progress_in_stage(), 1);
        assert_eq!(e.blocks_to_next_stage(), Some(19));
    }

    #[test]
    fn filling_the_quota_advances_and_locks_spending() {
        let mut e = engine(10, 3);
        let _ = e.record_effort(100);
        let _ = e.spend_currency();
        let _ = e.spend_currency();
        let outcome = e.spend_currency();

        let advanced = outcome.stage_advanced().cloned();
        assert_eq!(advanced.as_ref().map(|a| a.new_stage), Some(Stage::SmallTree));
        assert_eq!(advanced.as_ref().map(|a| a.total_spent), Some(3));
        assert_eq!(advanced.map(|a| a.total_effort), Some(100));
        assert_eq!(e.state().progress_in_stage(), 0);
        assert!(e.is_generating());

        let before = e.clone();
        assert_eq!(
            e.spend_currency(),
            SpendOutcome::Rejected {
                reason: RejectionReason::GenerationBusy
            }
        );
        assert_eq!(e, before);

        e.finish_generation();
        assert!(!e.spend_currency().is_rejected());
    }

    #[test]
    fn begin_generation_is_exclusive() {
        let mut e = engine(100, 20);
        assert!(e.begin_generation());
        assert!(!e.begin_generation());
        e.finish_generation();
        assert!(e.begin_generation());
    }

    #[test]
    fn terminal_stage_keeps_counting_without_advancing() {
        let mut e = engine(1, 1);
        let _ = e.record_effort(10);
        for _ in 0..6 {
            assert!(e.spend_currency().stage_advanced().is_some());
            e.finish_generation();
        }
        assert_eq!(e.state().stage(), Stage::MAX);
        assert_eq!(e.blocks_to_next_stage(), None);

        for expected_progress in 1..=4 {
            let outcome = e.spend_currency();
            assert!(outcome.stage_advanced().is_none());
            assert!(!e.is_generating());
            assert_eq!(e.state().stage(), Stage::MAX);
            assert_eq!(e.state().progress_in_stage(), expected_progress);
        }
        assert_eq!(e.state().total_spent(), 10);
        assert!(e.verify().is_ok());
    }

    #[test]
    fn snapshot_reflects_state() {
        let mut e = engine(100, 20);
        let _ = e.record_effort(250);
        let _ = e.spend_currency();
        let snap = e.snapshot();
        assert_eq!(snap.total_effort, 250);
        assert_eq!(snap.available_currency, 1);
        assert_eq!(snap.effort_toward_next_unit, 50);
        assert_eq!(snap.effort_per_unit, 100);
        assert_eq!(snap.quota, 20);
        assert_eq!(snap.level, 1);
        assert_eq!(snap.blocks_to_next_stage, Some(19));
        assert!(!snap.generation_in_flight);
    }
}
