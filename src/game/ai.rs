//! Computer opponent.
//!
//! A one-ply mobility search. Every difficulty takes a capture when one is on
//! offer; beyond that, easy plays randomly and medium/hard score each
//! candidate by how much room it leaves the mover versus the opponent.

use crate::game::board::{BlockedSet, Position, legal_moves, mobility};
use crate::game::level::Difficulty;
use crate::game::state::MatchState;
use rand::Rng;
use std::time::Duration;

/// Pause before a computer move is committed in interactive play.
pub const AI_THINK_DELAY: Duration = Duration::from_millis(800);

/// Preferred distance to the opponent after a teleport.
pub const IDEAL_TELEPORT_SEPARATION: f64 = 3.0;

/// Upper bound (exclusive) of the random jitter added to each mobility
/// score. Teleport landings are scored without it.
pub const SCORE_JITTER: f64 = 5.0;

const OWN_MOBILITY_WEIGHT: f64 = 10.0;
const MEDIUM_OPPONENT_WEIGHT: f64 = 5.0;
const HARD_OPPONENT_WEIGHT: f64 = 15.0;
const HARD_CENTER_WEIGHT: f64 = 2.0;

/// Pick a move for a token at `own` facing `opponent`.
///
/// Returns `None` when there is no legal move, which means the mover is
/// trapped and loses.
pub fn choose_move<R: Rng + ?Sized>(
    own: Position,
    opponent: Position,
    blocked: BlockedSet,
    difficulty: Difficulty,
    teleport: bool,
    rng: &mut R,
) -> Option<Position> {
    let candidates = legal_moves(own, blocked, teleport);
    if candidates.is_empty() {
        return None;
    }
    if candidates.contains(&opponent) {
        return Some(opponent);
    }
    if difficulty == Difficulty::Easy {
        return Some(candidates[rng.random_range(0..candidates.len())]);
    }

    // The square being vacated is blocked once the move lands.
    let after = blocked.with(own);
    let mut best: Option<(Position, f64)> = None;
    for target in candidates {
        let score = if teleport {
            teleport_score(target, opponent)
        } else {
            mobility_score(target, opponent, after, difficulty)
                + rng.random_range(0.0..SCORE_JITTER)
        };

        if best.is_none_or(|(_, top)| score > top) {
            best = Some((target, score));
        }
    }
    best.map(|(target, _)| target)
}

/// Heuristic for a teleport landing: central, at a comfortable distance.
fn teleport_score(target: Position, opponent: Position) -> f64 {
    let separation = f64::from(target.manhattan(opponent));
    2.0 * (3.5 - target.distance_from_center()) - (separation - IDEAL_TELEPORT_SEPARATION).abs()
}

fn mobility_score(
    target: Position,
    opponent: Position,
    after: BlockedSet,
    difficulty: Difficulty,
) -> f64 {
    let own = count(mobility(target, after, false));
    let theirs = count(mobility(opponent, after, false));
    match difficulty {
        Difficulty::Hard => {
            OWN_MOBILITY_WEIGHT * own
                - HARD_OPPONENT_WEIGHT * theirs
                - HARD_CENTER_WEIGHT * target.distance_from_center()
        }
        _ => OWN_MOBILITY_WEIGHT * own - MEDIUM_OPPONENT_WEIGHT * theirs,
    }
}

#[allow(clippy::cast_precision_loss)]
fn count(n: usize) -> f64 {
    n as f64
}

/// Move for the side to move in `state`, or `None` if it is trapped or the
/// match is over.
pub fn compute_ai_move<R: Rng + ?Sized>(
    state: &MatchState,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<Position> {
    if state.is_over() {
        return None;
    }
    let side = state.to_move;
    choose_move(
        state.position(side),
        state.position(side.opponent()),
        state.blocked,
        difficulty,
        state.has_teleport(side),
        rng,
    )
}
