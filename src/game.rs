//! Game layer for knight chase.
//!
//! Implements the rules of the match:
//! - Board geometry and knight-move legality
//! - Match state, levels and objectives
//! - The move and win-condition engine
//! - Mystery boxes, power-ups and the optional modifiers
//! - The computer opponent

mod ai;
mod board;
mod engine;
mod invariants;
mod level;
mod modifiers;
mod powerup;
mod rules;
mod state;

pub use ai::{AI_THINK_DELAY, IDEAL_TELEPORT_SEPARATION, SCORE_JITTER, choose_move, compute_ai_move};
pub use board::{
    BOARD_SIZE, BlockedSet, KNIGHT_OFFSETS, OffBoard, Position, SQUARE_COUNT, is_legal_move,
    legal_moves, mobility,
};
pub use engine::{GameEvent, Transition, apply_move, concede_if_trapped};
pub use invariants::{InvariantViolation, check_invariants};
pub use level::{Difficulty, LevelConfig, Objective};
pub use modifiers::{
    CHARGE_FULL, CHARGE_PER_MOVE, MAX_SHRINK_RINGS, SHRINK_INTERVAL, release_disruption,
    ring_squares, shrink_ring_for_turn,
};
pub use powerup::{
    ActivePowerUp, BOX_SPAWN_ATTEMPTS, BOX_SPAWN_CHANCE, PowerUpKind, clear_area, try_spawn_box,
};
pub use rules::{ModifierPolicy, Rules};
pub use state::{MatchState, Outcome, Side, WinCause, reset_match};
