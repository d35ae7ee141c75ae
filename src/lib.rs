// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
//! Knight chase: a two-token knight-move pursuit game.
//!
//! Two tokens move with chess-knight geometry on an 8x8 board. Every vacated
//! square is blocked for good, so the board closes in until one side lands
//! on the other or is left without a move.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┬──────────────────────┐
//! │  Session / Replay    │   Online peer        │
//! │  Tournament          │   Relay server       │
//! ├──────────────────────┴──────────────────────┤
//! │   Game: engine, power-ups, modifiers, AI    │
//! ├─────────────────────────────────────────────┤
//! │           Board model                       │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! Every state change goes through [`game::apply_move`] (or one of the
//! modifier entry points) and produces a fresh [`MatchState`]; nothing patches
//! a state in place. That is what lets the online layer ship whole states
//! through a relay that knows nothing about the rules.

pub mod error;
pub mod game;
pub mod online;
pub mod replay;
pub mod session;
pub mod tournament;

pub use error::{DisruptionError, LevelError, MoveError};

// Re-export key game types at crate root for convenience
pub use game::{
    BlockedSet, Difficulty, GameEvent, LevelConfig, MatchState, ModifierPolicy, Objective,
    Outcome, Position, PowerUpKind, Rules, Side, WinCause,
};
pub use session::{MatchSummary, Mode, Session};
