//! Match invariants - sanity checks that detect engine bugs.
//!
//! A state produced by [`apply_move`](crate::game::apply_move) and friends
//! should never trip any of these. They are run by the property tests, the
//! fuzz target and on every state a peer receives from the relay.

use crate::game::modifiers::CHARGE_FULL;
use crate::game::powerup::PowerUpKind;
use crate::game::rules::Rules;
use crate::game::state::{MatchState, Outcome, WinCause};

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invariant violation: {message}")]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Check all match invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &MatchState, rules: &Rules) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();

    if state.blocked.contains(state.a) && state.blocked.contains(state.b) {
        violations.push(InvariantViolation::new(format!(
            "both tokens stand on blocked squares ({} and {})",
            state.a, state.b
        )));
    }

    if state.charge > CHARGE_FULL {
        violations.push(InvariantViolation::new(format!(
            "charge {} exceeds {CHARGE_FULL}",
            state.charge
        )));
    }

    if let Some(at) = state.mystery_box {
        if state.blocked.contains(at) {
            violations.push(InvariantViolation::new(format!("mystery box on blocked square {at}")));
        }
        if at == state.a || at == state.b {
            violations.push(InvariantViolation::new(format!("unopened mystery box under a token at {at}")));
        }
    }

    if let Some(power_up) = state.power_up {
        if power_up.kind != PowerUpKind::Teleport {
            violations.push(InvariantViolation::new(format!(
                "{} power-up left armed for {}",
                power_up.kind, power_up.holder
            )));
        }
    }

    // A terminal move does not advance the counter, so A may be one ahead.
    if state.a_moves > state.turn + 1 {
        violations.push(InvariantViolation::new(format!(
            "side A made {} moves in {} turns",
            state.a_moves, state.turn
        )));
    }

    match state.outcome {
        Outcome::InProgress => {
            if state.tokens_coincide() && rules.capture_ends_match() {
                violations.push(InvariantViolation::new(format!(
                    "tokens share {} but the match goes on",
                    state.a
                )));
            }
            if state.legal_moves_for(state.to_move).is_empty() {
                violations.push(InvariantViolation::new(format!(
                    "{} is to move with no legal move but the match goes on",
                    state.to_move
                )));
            }
        }
        Outcome::Ended {
            cause: WinCause::GoalReached,
            ..
        } => {
            if rules.goal != Some(state.a) {
                violations.push(InvariantViolation::new(format!(
                    "goal reached but A stands on {}",
                    state.a
                )));
            }
        }
        Outcome::Ended { .. } => {}
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Position;
    use crate::game::powerup::ActivePowerUp;
    use crate::game::state::Side;

    #[test]
    fn test_initial_state_is_clean() {
        let rules = Rules::free_play();
        assert!(check_invariants(&MatchState::free_play(), &rules).is_empty());
    }

    #[test]
    fn test_detects_unfinished_capture() {
        let mut state = MatchState::free_play();
        state.b = state.a;
        let violations = check_invariants(&state, &Rules::free_play());
        assert_eq!(violations.len(), 1);
        assert!(violations[0].message.contains("share"));
    }

    #[test]
    fn test_detects_unreported_trap() {
        let mut state = MatchState::free_play();
        state.blocked = [Position::new(1, 2), Position::new(2, 1)].into_iter().collect();
        let violations = check_invariants(&state, &Rules::free_play());
        assert!(violations.iter().any(|v| v.message.contains("no legal move")));
    }

    #[test]
    fn test_detects_armed_instant_power_up() {
        let mut state = MatchState::free_play();
        state.power_up = Some(ActivePowerUp {
            holder: Side::A,
            kind: PowerUpKind::AreaClear,
        });
        state.charge = CHARGE_FULL + 1;
        let violations = check_invariants(&state, &Rules::free_play());
        assert_eq!(violations.len(), 2);
    }
}
