//! Match state: the single unit of truth for one match.
//!
//! A [`MatchState`] is replaced, never patched. The engine clones the prior
//! state, derives the next one and hands it back; the online layer ships the
//! whole value across the wire and receivers swap it in wholesale.

use crate::game::board::{BlockedSet, Position, legal_moves};
use crate::game::level::LevelConfig;
use crate::game::powerup::{ActivePowerUp, PowerUpKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two competing tokens. `A` always moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    /// The first mover (the human side in AI and adventure play).
    A,
    /// The second mover.
    B,
}

impl Side {
    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// Both sides, `A` first.
    pub const BOTH: [Side; 2] = [Side::A, Side::B];
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => write!(f, "A"),
            Side::B => write!(f, "B"),
        }
    }
}

/// Why a match ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WinCause {
    /// The winner landed on the loser's square.
    Captured,
    /// The loser had no legal move on its turn.
    Trapped,
    /// Side A reached the level's goal square.
    GoalReached,
    /// Side A ran out of its move budget.
    MoveLimitExceeded,
    /// Side A lasted the required number of turns.
    Survived,
}

impl fmt::Display for WinCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            WinCause::Captured => "captured",
            WinCause::Trapped => "trapped",
            WinCause::GoalReached => "goal reached",
            WinCause::MoveLimitExceeded => "move limit exceeded",
            WinCause::Survived => "survived",
        };
        f.write_str(text)
    }
}

/// Terminal status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    /// The match is still being played.
    #[default]
    InProgress,
    /// The match is over. Terminal: only a reset starts play again.
    Ended {
        /// The side that won.
        winner: Side,
        /// How it was won.
        cause: WinCause,
    },
}

impl Outcome {
    /// Whether the match is over.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Outcome::Ended { .. })
    }

    /// The winner, if the match is over.
    #[must_use]
    pub const fn winner(self) -> Option<Side> {
        match self {
            Outcome::InProgress => None,
            Outcome::Ended { winner, .. } => Some(winner),
        }
    }
}

/// Complete state of one match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatchState {
    /// Side A's square.
    pub a: Position,
    /// Side B's square.
    pub b: Position,
    /// Impassable squares.
    pub blocked: BlockedSet,
    /// Side whose move it is.
    pub to_move: Side,
    /// Moves committed so far (turn-skip moves included).
    pub turn: u32,
    /// Moves made by side A; drives move-limit and survival objectives.
    pub a_moves: u32,
    /// The single live power-up, if any.
    pub power_up: Option<ActivePowerUp>,
    /// Side A's disruption meter, `0..=CHARGE_FULL`.
    pub charge: u8,
    /// The single mystery box on the board, if any.
    pub mystery_box: Option<Position>,
    /// Terminal status.
    pub outcome: Outcome,
}

impl MatchState {
    /// Initial state for a level. Deterministic: equal levels give equal states.
    #[must_use]
    pub fn new(level: &LevelConfig) -> Self {
        Self {
            a: level.a_start,
            b: level.b_start,
            blocked: level.initial_blocked,
            to_move: Side::A,
            turn: 0,
            a_moves: 0,
            power_up: None,
            charge: 0,
            mystery_box: None,
            outcome: Outcome::InProgress,
        }
    }

    /// Initial state of a free-play match: A at (0, 0), B at (7, 7), empty board.
    #[must_use]
    pub fn free_play() -> Self {
        Self::new(&LevelConfig::free_play())
    }

    /// Position of `side`'s token.
    #[must_use]
    pub const fn position(&self, side: Side) -> Position {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Mutable access to `side`'s token.
    pub fn position_mut(&mut self, side: Side) -> &mut Position {
        match side {
            Side::A => &mut self.a,
            Side::B => &mut self.b,
        }
    }

    /// Whether `side` holds an armed teleport.
    #[must_use]
    pub fn has_teleport(&self, side: Side) -> bool {
        self.power_up
            .is_some_and(|p| p.holder == side && p.kind == PowerUpKind::Teleport)
    }

    /// Legal destinations for `side` under its current power-up state.
    #[must_use]
    pub fn legal_moves_for(&self, side: Side) -> Vec<Position> {
        legal_moves(self.position(side), self.blocked, self.has_teleport(side))
    }

    /// Whether the match is over.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.outcome.is_terminal()
    }

    /// Whether both tokens share a square.
    #[must_use]
    pub fn tokens_coincide(&self) -> bool {
        self.a == self.b
    }

    /// Canonical JSON encoding.
    ///
    /// # Errors
    ///
    /// Returns an error only if serialization itself fails.
    pub fn to_canonical_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// CRC-32 of the canonical encoding, used to detect stale submissions.
    #[must_use]
    pub fn digest(&self) -> u32 {
        // Serializing plain data into a Vec cannot fail.
        let bytes = self.to_canonical_json().unwrap_or_default();
        crc32fast::hash(&bytes)
    }
}

/// Fresh initial state for `level`.
///
/// Idempotent and deterministic: two calls with the same level are equal
/// field for field and serialize to identical bytes.
#[must_use]
pub fn reset_match(level: &LevelConfig) -> MatchState {
    MatchState::new(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_play_defaults() {
        let state = MatchState::free_play();
        assert_eq!(state.a, Position::new(0, 0));
        assert_eq!(state.b, Position::new(7, 7));
        assert_eq!(state.to_move, Side::A);
        assert_eq!(state.turn, 0);
        assert!(state.blocked.is_empty());
        assert_eq!(state.outcome, Outcome::InProgress);
    }

    #[test]
    fn test_reset_is_deterministic() {
        let level = LevelConfig::builtin(2).unwrap();
        let first = reset_match(&level);
        let second = reset_match(&level);
        assert_eq!(first, second);
        assert_eq!(
            first.to_canonical_json().unwrap(),
            second.to_canonical_json().unwrap()
        );
        assert_eq!(first.digest(), second.digest());
    }

    #[test]
    fn test_digest_changes_with_state() {
        let state = MatchState::free_play();
        let mut moved = state.clone();
        moved.turn = 1;
        assert_ne!(state.digest(), moved.digest());
    }

    #[test]
    fn test_outcome_wire_format() {
        let ended = Outcome::Ended {
            winner: Side::A,
            cause: WinCause::GoalReached,
        };
        let json = serde_json::to_string(&ended).unwrap();
        assert_eq!(json, r#"{"status":"ENDED","winner":"A","cause":"GOAL_REACHED"}"#);
        let back: Outcome = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ended);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::A.opponent(), Side::B);
        assert_eq!(Side::B.opponent(), Side::A);
    }
}
