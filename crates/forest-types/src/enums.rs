//! Enumeration types for the Block Forest progression engine.
//!
//! The tree's growth level is a closed set of seven stages, so it is modelled
//! as an enum rather than a bare integer. Stage indices run `0..=6`; the
//! player-facing level number is one-based (`Lv.1`..`Lv.7`).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Growth stages
// ---------------------------------------------------------------------------

/// A discrete growth level of the tree.
///
/// Ordered from the starting sapling to the terminal full-bloom tree. The
/// derived [`Ord`] follows declaration order, so `stage_a < stage_b` means
/// `stage_a` is the earlier stage.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[ts(export, export_to = "bindings/")]
pub enum Stage {
    /// A thin trunk with a few leaves (starting stage).
    #[default]
    Sapling,
    /// A sturdy small tree with a compact canopy.
    SmallTree,
    /// A medium tree with a thicker trunk and lush foliage.
    MediumTree,
    /// A large tree with visible roots and a wide canopy.
    LargeTree,
    /// A massive, ancient tree.
    GiantTree,
    /// A large tree covered in flower buds.
    BuddingTree,
    /// A tree in full bloom (terminal stage).
    FullBloom,
}

impl Stage {
    /// Every stage in growth order.
    pub const ALL: [Self; 7] = [
        Self::Sapling,
        Self::SmallTree,
        Self::MediumTree,
        Self::LargeTree,
        Self::GiantTree,
        Self::BuddingTree,
        Self::FullBloom,
    ];

    /// The first stage of every session.
    pub const INITIAL: Self = Self::Sapling;

    /// The terminal stage. No transition leaves it.
    pub const MAX: Self = Self::FullBloom;

    /// Zero-based stage index (`0..=6`).
    pub const fn index(self) -> u8 {
        match self {
            Self::Sapling => 0,
            Self::SmallTree => 1,
            Self::MediumTree => 2,
            Self::LargeTree => 3,
            Self::GiantTree => 4,
            Self::BuddingTree => 5,
            Self::FullBloom => 6,
        }
    }

    /// Look up a stage by its zero-based index.
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Sapling),
            1 => Some(Self::SmallTree),
            2 => Some(Self::MediumTree),
            3 => Some(Self::LargeTree),
            4 => Some(Self::GiantTree),
            5 => Some(Self::BuddingTree),
            6 => Some(Self::FullBloom),
            _ => None,
        }
    }

    /// The stage that follows this one, or `None` at the terminal stage.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Sapling => Some(Self::SmallTree),
            Self::SmallTree => Some(Self::MediumTree),
            Self::MediumTree => Some(Self::LargeTree),
            Self::LargeTree => Some(Self::GiantTree),
            Self::GiantTree => Some(Self::BuddingTree),
            Self::BuddingTree => Some(Self::FullBloom),
            Self::FullBloom => None,
        }
    }

    /// Whether this is the terminal stage.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::FullBloom)
    }

    /// One-based level number shown to the player (`Lv.1`..`Lv.7`).
    pub const fn level(self) -> u8 {
        match self {
            Self::Sapling => 1,
            Self::SmallTree => 2,
            Self::MediumTree => 3,
            Self::LargeTree => 4,
            Self::GiantTree => 5,
            Self::BuddingTree => 6,
            Self::FullBloom => 7,
        }
    }

    /// Korean display name used by the widget's stage badge.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sapling => "묘목",
            Self::SmallTree => "작은 나무",
            Self::MediumTree => "중간 나무",
            Self::LargeTree => "큰 나무",
            Self::GiantTree => "거대한 나무",
            Self::BuddingTree => "꽃망울 맺힌 나무",
            Self::FullBloom => "활짝 핀 나무",
        }
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Lv.{} {}", self.level(), self.label())
    }
}

// ---------------------------------------------------------------------------
// Command outcomes
// ---------------------------------------------------------------------------

/// Why a `spend_currency` command was refused.
///
/// A rejection is a normal negative result, not an error: the caller is
/// expected to disable the build action until the condition clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// No blocks are available to spend.
    InsufficientCurrency,
    /// A stage-advance generation request is still outstanding.
    GenerationBusy,
}

impl core::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InsufficientCurrency => f.write_str("no blocks available"),
            Self::GenerationBusy => f.write_str("tree illustration is still being generated"),
        }
    }
}

/// What triggered a remote generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "snake_case")]
pub enum GenerationKind {
    /// The initial sapling illustration requested at session start.
    Seed,
    /// A new illustration and message after a stage advance.
    StageAdvance,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_every_stage() {
        for stage in Stage::ALL {
            assert_eq!(Stage::from_index(stage.index()), Some(stage));
        }
        assert_eq!(Stage::from_index(7), None);
    }

    #[test]
    fn next_walks_the_full_chain_and_stops() {
        let mut stage = Stage::INITIAL;
        let mut steps = 0;
        while let Some(next) = stage.next() {
            assert!(next > stage);
            stage = next;
            steps += 1;
        }
        assert_eq!(steps, 6);
        assert_eq!(stage, Stage::MAX);
        assert!(stage.is_terminal());
    }

    #[test]
    fn level_is_one_based() {
        assert_eq!(Stage::Sapling.level(), 1);
        assert_eq!(Stage::FullBloom.level(), 7);
        assert_eq!(Stage::GiantTree.to_string(), "Lv.5 거대한 나무");
    }

    #[test]
    fn rejection_reason_uses_snake_case() {
        let json = serde_json::to_string(&RejectionReason::GenerationBusy).unwrap_or_default();
        assert_eq!(json, "\"generation_busy\"");
    }
}
