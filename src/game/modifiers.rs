//! Optional match modifiers: arena shrink and the disruption charge.
//!
//! The fading-blocks modifier has no engine effect and is handled entirely by
//! whoever renders the board.

use crate::error::DisruptionError;
use crate::game::board::{BOARD_SIZE, Position};
use crate::game::engine::{GameEvent, Transition, settle_trap};
use crate::game::rules::Rules;
use crate::game::state::MatchState;
use rand::Rng;

/// Charge side A gains per move.
pub const CHARGE_PER_MOVE: u8 = 20;

/// Charge needed to release a disruption.
pub const CHARGE_FULL: u8 = 100;

/// Completed turns between two shrink steps.
pub const SHRINK_INTERVAL: u32 = 4;

/// Rings that can be blocked. Ring 3 would be the central 2x2, which must stay open.
pub const MAX_SHRINK_RINGS: u8 = 3;

/// Squares on perimeter ring `ring` (0 is the board edge).
pub fn ring_squares(ring: u8) -> impl Iterator<Item = Position> {
    let last = BOARD_SIZE - 1 - ring;
    Position::all().filter(move |p| {
        let inside = (ring..=last).contains(&p.x) && (ring..=last).contains(&p.y);
        inside && (p.x == ring || p.x == last || p.y == ring || p.y == last)
    })
}

/// Ring due for blocking at `turn`, if any.
#[must_use]
pub fn shrink_ring_for_turn(turn: u32) -> Option<u8> {
    if turn == 0 || turn % SHRINK_INTERVAL != 0 {
        return None;
    }
    let ring = turn / SHRINK_INTERVAL - 1;
    u8::try_from(ring).ok().filter(|r| *r < MAX_SHRINK_RINGS)
}

/// Block the next ring if the turn counter just reached a shrink step.
///
/// Squares under a token stay open; a mystery box caught by the ring is lost.
pub(crate) fn shrink_if_due(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let Some(ring) = shrink_ring_for_turn(state.turn) else {
        return;
    };

    let mut newly = 0u8;
    for pos in ring_squares(ring) {
        if pos == state.a || pos == state.b {
            continue;
        }
        if state.blocked.insert(pos) {
            newly += 1;
        }
        if state.mystery_box == Some(pos) {
            state.mystery_box = None;
        }
    }
    events.push(GameEvent::ArenaShrunk {
        ring,
        blocked: newly,
    });
}

/// Add one move's worth of charge to side A's meter.
pub(crate) fn accrue_charge(state: &mut MatchState, events: &mut Vec<GameEvent>) {
    let charge = state.charge.saturating_add(CHARGE_PER_MOVE).min(CHARGE_FULL);
    if charge != state.charge {
        state.charge = charge;
        events.push(GameEvent::ChargeChanged { charge });
    }
}

/// Release side A's full disruption charge.
///
/// Blocks one random square that is open and holds neither token nor the
/// mystery box, then empties the meter. Takes effect immediately and does
/// not use up a turn. If the side to move is left without a legal move the
/// match ends.
///
/// # Errors
///
/// Returns an error if the modifier is off, the match is over, the meter is
/// not full or there is no square left to block.
pub fn release_disruption<R: Rng + ?Sized>(
    prior: &MatchState,
    rules: &Rules,
    rng: &mut R,
) -> Result<Transition, DisruptionError> {
    if !rules.modifiers.disruption_charge {
        return Err(DisruptionError::Disabled);
    }
    if prior.is_over() {
        return Err(DisruptionError::MatchOver);
    }
    if prior.charge < CHARGE_FULL {
        return Err(DisruptionError::NotCharged {
            charge: prior.charge,
            full: CHARGE_FULL,
        });
    }

    let candidates: Vec<Position> = Position::all()
        .filter(|p| {
            !prior.blocked.contains(*p)
                && *p != prior.a
                && *p != prior.b
                && prior.mystery_box != Some(*p)
        })
        .collect();
    if candidates.is_empty() {
        return Err(DisruptionError::NoTarget);
    }
    let at = candidates[rng.random_range(0..candidates.len())];

    let mut next = prior.clone();
    let mut events = Vec::with_capacity(3);
    next.blocked.insert(at);
    next.charge = 0;
    events.push(GameEvent::DisruptionReleased { at });
    events.push(GameEvent::ChargeChanged { charge: 0 });
    settle_trap(&mut next, &mut events);

    Ok(Transition {
        state: next,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::rules::ModifierPolicy;
    use crate::game::state::{Outcome, Side, WinCause};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn disruption_rules() -> Rules {
        Rules {
            modifiers: ModifierPolicy {
                disruption_charge: true,
                ..ModifierPolicy::none()
            },
            ..Rules::free_play()
        }
    }

    #[test]
    fn test_ring_sizes() {
        assert_eq!(ring_squares(0).count(), 28);
        assert_eq!(ring_squares(1).count(), 20);
        assert_eq!(ring_squares(2).count(), 12);
        assert_eq!(ring_squares(3).count(), 4);
    }

    #[test]
    fn test_shrink_schedule() {
        assert_eq!(shrink_ring_for_turn(0), None);
        assert_eq!(shrink_ring_for_turn(3), None);
        assert_eq!(shrink_ring_for_turn(4), Some(0));
        assert_eq!(shrink_ring_for_turn(8), Some(1));
        assert_eq!(shrink_ring_for_turn(12), Some(2));
        assert_eq!(shrink_ring_for_turn(16), None);
        assert_eq!(shrink_ring_for_turn(20), None);
    }

    #[test]
    fn test_shrink_spares_tokens_and_drops_box() {
        let mut state = MatchState::free_play();
        state.turn = 4;
        state.mystery_box = Some(Position::new(0, 5));
        let mut events = Vec::new();
        shrink_if_due(&mut state, &mut events);
        assert!(!state.blocked.contains(state.a));
        assert!(!state.blocked.contains(state.b));
        assert!(state.blocked.contains(Position::new(3, 0)));
        assert_eq!(state.mystery_box, None);
        assert_eq!(
            events,
            vec![GameEvent::ArenaShrunk {
                ring: 0,
                blocked: 26
            }]
        );
    }

    #[test]
    fn test_charge_saturates() {
        let mut state = MatchState::free_play();
        let mut events = Vec::new();
        for _ in 0..7 {
            accrue_charge(&mut state, &mut events);
        }
        assert_eq!(state.charge, CHARGE_FULL);
        assert_eq!(events.len(), 5);
    }

    #[test]
    fn test_release_requires_full_meter() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = MatchState::free_play();
        state.charge = 80;
        assert_eq!(
            release_disruption(&state, &disruption_rules(), &mut rng),
            Err(DisruptionError::NotCharged {
                charge: 80,
                full: CHARGE_FULL
            })
        );
        assert_eq!(
            release_disruption(&state, &Rules::free_play(), &mut rng),
            Err(DisruptionError::Disabled)
        );
    }

    #[test]
    fn test_release_blocks_one_open_square() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = MatchState::free_play();
        state.charge = CHARGE_FULL;
        let t = release_disruption(&state, &disruption_rules(), &mut rng).unwrap();
        assert_eq!(t.state.blocked.len(), 1);
        assert_eq!(t.state.charge, 0);
        let at = t.state.blocked.iter().next().unwrap();
        assert_ne!(at, state.a);
        assert_ne!(at, state.b);
        assert_eq!(t.state.to_move, state.to_move);
        assert_eq!(t.state.turn, state.turn);
    }

    #[test]
    fn test_release_can_trap_side_to_move() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut state = MatchState::free_play();
        state.charge = CHARGE_FULL;
        // A keeps exactly one exit; every other open square is taken too.
        state.blocked = Position::all()
            .filter(|p| *p != state.a && *p != state.b && *p != Position::new(1, 2))
            .collect();
        let t = release_disruption(&state, &disruption_rules(), &mut rng).unwrap();
        assert_eq!(
            t.state.outcome,
            Outcome::Ended {
                winner: Side::B,
                cause: WinCause::Trapped
            }
        );
    }
}
