//! Property and scenario tests for the progression engine.
//!
//! Command sequences come from a seeded [`SmallRng`] so that failures
//! reproduce exactly.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]

use forest_core::engine::{ProgressionEngine, ProgressionRules};
use forest_types::{RejectionReason, SpendOutcome, Stage};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

fn engine(epu: u64, quota: u64) -> ProgressionEngine {
    ProgressionEngine::new(ProgressionRules::new(epu, quota).unwrap())
}

#[test]
fn currency_matches_floor_formula_after_every_effort() {
    let mut rng = SmallRng::seed_from_u64(7);
    let mut e = engine(100, 20);
    for _ in 0..500 {
        let amount = rng.random_range(1..=400);
        e.record_effort(amount).unwrap();
        let s = e.state();
        assert_eq!(
            s.available_currency(),
            s.total_effort() / 100 - s.total_spent()
        );
    }
}

#[test]
fn mixed_command_sequences_keep_invariants() {
    for seed in 1..=20 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut e = engine(rng.random_range(1..=150), rng.random_range(1..=10));
        let mut last_stage = Stage::INITIAL;
        let mut last_effort = 0;
        let mut last_spent = 0;
        let mut advances = 0;

        for _ in 0..2_000 {
            match rng.random_range(0..3_u8) {
                0 => {
                    e.record_effort(rng.random_range(1..=300)).unwrap();
                }
                1 => {
                    if e.spend_currency().stage_advanced().is_some() {
                        advances += 1;
                    }
                }
                _ => e.finish_generation(),
            }

            let s = e.state();
            assert!(e.verify().is_ok(), "seed {seed}: {:?}", e.verify());
            assert!(s.stage() >= last_stage, "stage decreased");
            assert!(s.stage() <= Stage::MAX);
            assert!(s.total_effort() >= last_effort, "effort decreased");
            assert!(s.total_spent() >= last_spent, "spent decreased");
            last_stage = s.stage();
            last_effort = s.total_effort();
            last_spent = s.total_spent();
        }
        assert_eq!(usize::from(e.state().stage().index()), advances);
    }
}

#[test]
fn rejected_spend_leaves_state_identical() {
    let mut e = engine(100, 20);
    e.record_effort(99).unwrap();
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
fn exactly_quota_spends_advance_one_stage() {
    let quota = 7;
    let mut e = engine(10, quota);
    e.record_effort(10 * quota).unwrap();

    let mut events = Vec::new();
    for _ in 0..quota {
        if let Some(advance) = e.spend_currency().stage_advanced() {
            events.push(advance.clone());
        }
    }

    assert_eq!(events.len(), 1);
    assert_eq!(e.state().stage(), Stage::SmallTree);
    assert_eq!(e.state().progress_in_stage(), 0);
    assert_eq!(e.state().available_currency(), 0);
}

#[test]
fn walkthrough_with_default_rates() {
    let mut e = engine(100, 20);

    e.record_effort(50).unwrap();
    e.record_effort(50).unwrap();
    assert_eq!(e.state().total_effort(), 100);
    assert_eq!(e.state().available_currency(), 1);

    let first = e.spend_currency();
    assert!(first.stage_advanced().is_none());
    assert_eq!(e.state().available_currency(), 0);
    assert_eq!(e.state().progress_in_stage(), 1);
    assert_eq!(e.state().total_spent(), 1);

    for _ in 0..38 {
        e.record_effort(50).unwrap();
    }
    assert_eq!(e.state().available_currency(), 19);

    let mut advances = Vec::new();
    for _ in 0..19 {
        if let Some(advance) = e.spend_currency().stage_advanced() {
            advances.push(advance.clone());
        }
    }

    assert_eq!(advances.len(), 1);
    let advance = &advances[0];
    assert_eq!(advance.new_stage, Stage::SmallTree);
    assert_eq!(advance.new_stage.index(), 1);
    assert_eq!(advance.total_spent, 20);
    assert_eq!(advance.total_effort, 2_000);
    assert_eq!(e.state().stage(), Stage::SmallTree);
    assert_eq!(e.state().progress_in_stage(), 0);
    assert_eq!(e.state().available_currency(), 0);
}

#[test]
fn terminal_stage_is_sticky() {
    let mut e = engine(1, 2);
    e.record_effort(100).unwrap();
    while e.state().stage() != Stage::MAX {
        e.spend_currency();
        e.finish_generation();
    }
    let spent_at_max = e.state().total_spent();
    assert_eq!(spent_at_max, 12);

    for i in 1..=30 {
        let outcome = e.spend_currency();
        assert!(outcome.stage_advanced().is_none());
        assert!(!e.is_generating());
        assert_eq!(e.state().stage(), Stage::MAX);
        assert_eq!(e.state().progress_in_stage(), i);
        assert_eq!(e.state().total_spent(), spent_at_max + i);
    }
    assert_eq!(e.blocks_to_next_stage(), None);
    assert!(e.verify().is_ok());
}
