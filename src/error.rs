//! Error types for the game engine.

use crate::game::{Objective, Position, Side};

/// Why a submitted move was declined.
///
/// Callers in local play treat every variant as "do nothing": the state is
/// left untouched and no error is surfaced to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    /// The match has already ended.
    #[error("match is over")]
    MatchOver,
    /// The submitting side is not the side to move.
    #[error("it is {expected}'s turn, not {got}'s")]
    NotYourTurn {
        /// Side to move.
        expected: Side,
        /// Side that tried to move.
        got: Side,
    },
    /// The target fails the board legality check.
    #[error("illegal move from {from} to {to}")]
    Illegal {
        /// The mover's square.
        from: Position,
        /// The rejected target.
        to: Position,
    },
}

/// Why a disruption release was declined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DisruptionError {
    /// The disruption modifier is off for this match.
    #[error("disruption charge is disabled")]
    Disabled,
    /// The match has already ended.
    #[error("match is over")]
    MatchOver,
    /// The meter is not full yet.
    #[error("charge {charge}/{full} is not full")]
    NotCharged {
        /// Current meter level.
        charge: u8,
        /// Level required to release.
        full: u8,
    },
    /// Every square is blocked or occupied.
    #[error("no open square to block")]
    NoTarget,
}

/// Problems loading or validating a level.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    /// The level file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The level JSON is malformed.
    #[error("invalid level JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Both tokens start on the same square.
    #[error("both sides start on {0}")]
    SharedStart(Position),
    /// A token starts on a blocked square.
    #[error("start square {0} is blocked")]
    BlockedStart(Position),
    /// A reach-goal level has no goal.
    #[error("REACH-GOAL level has no goal square")]
    MissingGoal,
    /// The goal square is blocked from the start.
    #[error("goal square {0} is blocked")]
    BlockedGoal(Position),
    /// The objective needs a move limit.
    #[error("{0:?} level has no move limit")]
    MissingMoveLimit(Objective),
    /// A move limit of zero can never be played.
    #[error("move limit must be at least 1")]
    ZeroMoveLimit,
    /// No built-in level with this id.
    #[error("no built-in level {0}")]
    UnknownLevel(u32),
    /// Unrecognised difficulty name.
    #[error("unknown difficulty '{0}' (expected easy, medium or hard)")]
    UnknownDifficulty(String),
}
