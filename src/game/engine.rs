//! Move and win-condition engine.
//!
//! [`apply_move`] is the only way a move changes a match. It validates the
//! move, derives the next [`MatchState`] from the prior one and reports what
//! happened as a list of [`GameEvent`]s. Presentation layers react to the
//! events (sounds, animations, banners); the engine never calls them.

use crate::error::MoveError;
use crate::game::board::{Position, is_legal_move};
use crate::game::level::Objective;
use crate::game::modifiers;
use crate::game::powerup::{self, PowerUpKind};
use crate::game::rules::Rules;
use crate::game::state::{MatchState, Outcome, Side, WinCause};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Something observable that happened while deriving a new state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum GameEvent {
    /// A token moved.
    Moved {
        /// Mover.
        side: Side,
        /// Vacated square, now blocked.
        from: Position,
        /// Landing square.
        to: Position,
        /// Whether the move used a teleport.
        teleport: bool,
    },
    /// A mystery box was opened.
    PowerUpCollected {
        /// Collector.
        side: Side,
        /// What it held.
        kind: PowerUpKind,
        /// Where the box was.
        at: Position,
    },
    /// An armed teleport was spent.
    TeleportUsed {
        /// Former holder.
        side: Side,
    },
    /// Blocked squares were cleared around a square.
    AreaCleared {
        /// Collector.
        side: Side,
        /// Centre of the 3x3 area.
        center: Position,
        /// Squares unblocked.
        cleared: u8,
    },
    /// The mover keeps the turn.
    OpponentSkipped {
        /// Side moving again.
        side: Side,
    },
    /// A mystery box appeared.
    BoxSpawned {
        /// Its square.
        at: Position,
    },
    /// A perimeter ring was blocked.
    ArenaShrunk {
        /// Ring index, 0 is the outermost.
        ring: u8,
        /// Squares newly blocked.
        blocked: u8,
    },
    /// Side A's disruption meter changed.
    ChargeChanged {
        /// New meter level.
        charge: u8,
    },
    /// Side A released its disruption charge.
    DisruptionReleased {
        /// Square that was blocked.
        at: Position,
    },
    /// The match reached a terminal state.
    MatchEnded {
        /// Winner.
        winner: Side,
        /// How.
        cause: WinCause,
    },
}

/// A derived state and the events that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The replacement state.
    pub state: MatchState,
    /// What happened, in order.
    pub events: Vec<GameEvent>,
}

impl Transition {
    /// The terminal outcome, if this transition ended the match.
    #[must_use]
    pub fn ended(&self) -> Option<(Side, WinCause)> {
        self.events.iter().find_map(|e| match e {
            GameEvent::MatchEnded { winner, cause } => Some((*winner, *cause)),
            _ => None,
        })
    }
}

/// Commit `side`'s move to `target`.
///
/// Rejects the move without touching anything if the match is over, `side`
/// is not the side to move, or the target is illegal under the mover's
/// current power-up state. Otherwise the vacated square is blocked, the token
/// moves, any box under it is resolved, a spent teleport is cleared and the
/// outcome is evaluated in this order: goal, capture, trap, move limit.
/// If the match goes on the turn counter advances and the turn passes to
/// the other side unless a skip-turn power-up was collected.
///
/// `rng` is only consulted when a box is opened.
///
/// # Errors
///
/// Returns a [`MoveError`] describing why the move was declined.
pub fn apply_move<R: Rng + ?Sized>(
    prior: &MatchState,
    rules: &Rules,
    side: Side,
    target: Position,
    rng: &mut R,
) -> Result<Transition, MoveError> {
    if prior.is_over() {
        return Err(MoveError::MatchOver);
    }
    if side != prior.to_move {
        return Err(MoveError::NotYourTurn {
            expected: prior.to_move,
            got: side,
        });
    }
    let from = prior.position(side);
    let teleport = prior.has_teleport(side);
    if !is_legal_move(from, target, prior.blocked, teleport) {
        return Err(MoveError::Illegal { from, to: target });
    }

    let mut next = prior.clone();
    let mut events = Vec::with_capacity(4);

    next.blocked.insert(from);
    *next.position_mut(side) = target;
    events.push(GameEvent::Moved {
        side,
        from,
        to: target,
        teleport,
    });

    if side == Side::A {
        next.a_moves += 1;
        if rules.modifiers.disruption_charge {
            modifiers::accrue_charge(&mut next, &mut events);
        }
    }

    // Spend the teleport before opening a box so a freshly armed one survives.
    if teleport {
        next.power_up = None;
        events.push(GameEvent::TeleportUsed { side });
    }

    let keeps_turn = if next.mystery_box == Some(target) {
        powerup::resolve_box(&mut next, side, target, rng, &mut events)
    } else {
        false
    };

    if let Some((winner, cause)) = evaluate(&next, rules, side, target) {
        end_match(&mut next, &mut events, winner, cause);
        debug!(%side, %from, %target, %winner, %cause, "move ended match");
        return Ok(Transition {
            state: next,
            events,
        });
    }

    next.turn += 1;
    if !keeps_turn {
        next.to_move = side.opponent();
    }

    if rules.modifiers.arena_shrink {
        modifiers::shrink_if_due(&mut next, &mut events);
    }
    settle_trap(&mut next, &mut events);

    debug!(%side, %from, %target, turn = next.turn, "move applied");
    Ok(Transition {
        state: next,
        events,
    })
}

/// Terminal check after `mover` landed on `target`.
fn evaluate(
    state: &MatchState,
    rules: &Rules,
    mover: Side,
    target: Position,
) -> Option<(Side, WinCause)> {
    if rules.objective == Objective::ReachGoal && mover == Side::A && rules.goal == Some(target) {
        return Some((Side::A, WinCause::GoalReached));
    }

    if state.tokens_coincide() && rules.capture_ends_match() {
        return Some((mover, WinCause::Captured));
    }

    if state.legal_moves_for(mover.opponent()).is_empty() {
        return Some((mover, WinCause::Trapped));
    }

    let limit = rules.move_limit?;
    if state.a_moves < limit {
        return None;
    }
    match rules.objective {
        // A survives once B has answered A's final move.
        Objective::SurviveNTurns if mover == Side::B => Some((Side::A, WinCause::Survived)),
        Objective::SurviveNTurns => None,
        _ => Some((Side::B, WinCause::MoveLimitExceeded)),
    }
}

/// End the match if the side to move has nowhere to go.
///
/// Needed after anything that blocks squares outside the normal move flow
/// (arena shrink, disruption release) and after a skip-turn move, where the
/// mover itself must move again.
pub(crate) fn settle_trap(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    if state.is_over() {
        return;
    }
    let stuck = state.to_move;
    if state.legal_moves_for(stuck).is_empty() {
        end_match(state, events, stuck.opponent(), WinCause::Trapped);
    }
}

/// Mark `state` terminal and record it.
pub(crate) fn end_match(
    state: &mut MatchState,
    events: &mut Vec<GameEvent>,
    winner: Side,
    cause: WinCause,
) {
    state.outcome = Outcome::Ended { winner, cause };
    events.push(GameEvent::MatchEnded { winner, cause });
}

/// Build the terminal state a trapped side concedes with.
///
/// Used when a side discovers on its own turn that it has no legal move; the
/// other side is named the winner. Returns `None` if the match is already over
/// or `side` can still move.
#[must_use]
pub fn concede_if_trapped(state: &MatchState, side: Side) -> Option<MatchState> {
    if state.is_over() || state.to_move != side || !state.legal_moves_for(side).is_empty() {
        return None;
    }
    let mut next = state.clone();
    next.outcome = Outcome::Ended {
        winner: side.opponent(),
        cause: WinCause::Trapped,
    };
    Some(next)
}
