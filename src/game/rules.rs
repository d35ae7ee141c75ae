//! Per-match rules: objective parameters plus the modifier policy.
//!
//! Built once when a match starts and passed by reference to the engine, the
//! power-up code and the modifiers. Nothing downstream re-derives a modifier
//! flag on its own.

use crate::game::board::Position;
use crate::game::level::{LevelConfig, Objective};
use serde::{Deserialize, Serialize};

/// Which optional modifiers are active for a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::struct_excessive_bools)]
pub struct ModifierPolicy {
    /// Mystery boxes spawn during play.
    pub mystery_boxes: bool,
    /// The arena shrinks one perimeter ring every few turns.
    pub arena_shrink: bool,
    /// Side A accrues a disruption charge it can release.
    pub disruption_charge: bool,
    /// Blocked-square markers fade from view. Presentation only.
    pub fading_blocks: bool,
}

impl Default for ModifierPolicy {
    fn default() -> Self {
        Self {
            mystery_boxes: true,
            arena_shrink: false,
            disruption_charge: false,
            fading_blocks: false,
        }
    }
}

impl ModifierPolicy {
    /// No modifiers and no mystery boxes.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            mystery_boxes: false,
            arena_shrink: false,
            disruption_charge: false,
            fading_blocks: false,
        }
    }
}

/// Everything the engine needs to know about a match besides its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rules {
    /// Win condition for side A.
    pub objective: Objective,
    /// Goal square for reach-goal levels.
    pub goal: Option<Position>,
    /// Side A's move budget, or turns to survive.
    pub move_limit: Option<u32>,
    /// Active modifiers.
    pub modifiers: ModifierPolicy,
}

impl Rules {
    /// Rules for a level under the given modifier policy.
    #[must_use]
    pub fn new(level: &LevelConfig, modifiers: ModifierPolicy) -> Self {
        Self {
            objective: level.objective,
            goal: level.goal,
            move_limit: level.move_limit,
            modifiers,
        }
    }

    /// Free-play rules: capture objective, default modifiers.
    #[must_use]
    pub fn free_play() -> Self {
        Self::new(&LevelConfig::free_play(), ModifierPolicy::default())
    }

    /// Whether coinciding tokens end the match.
    #[must_use]
    pub fn capture_ends_match(&self) -> bool {
        self.objective != Objective::ReachGoal
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::free_play()
    }
}
