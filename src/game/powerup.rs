//! Mystery boxes and the power-ups they grant.

use crate::game::board::{BOARD_SIZE, BlockedSet, Position};
use crate::game::engine::{GameEvent, Transition};
use crate::game::rules::Rules;
use crate::game::state::{MatchState, Side};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Chance that a spawn attempt places a box.
pub const BOX_SPAWN_CHANCE: f64 = 0.15;

/// Random squares tried before a spawn attempt gives up.
pub const BOX_SPAWN_ATTEMPTS: u32 = 20;

/// Effect granted by a mystery box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum PowerUpKind {
    /// The holder's next move may land on any unblocked square.
    Teleport,
    /// Unblocks the 3x3 neighbourhood around the box square.
    AreaClear,
    /// The mover keeps the turn and moves again.
    SkipOpponentTurn,
}

impl PowerUpKind {
    /// Every kind, in draw order.
    pub const ALL: [PowerUpKind; 3] = [
        PowerUpKind::Teleport,
        PowerUpKind::AreaClear,
        PowerUpKind::SkipOpponentTurn,
    ];

    /// Draw a kind uniformly at random.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }
}

impl fmt::Display for PowerUpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PowerUpKind::Teleport => f.write_str("teleport"),
            PowerUpKind::AreaClear => f.write_str("area clear"),
            PowerUpKind::SkipOpponentTurn => f.write_str("skip opponent turn"),
        }
    }
}

/// A power-up that outlives the move that collected it.
///
/// Only teleport is ever armed; the other kinds apply immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivePowerUp {
    /// Side that will use it.
    pub holder: Side,
    /// What it does.
    pub kind: PowerUpKind,
}

/// Unblock the 3x3 square centred on `center`. Returns how many were cleared.
pub fn clear_area(blocked: &mut BlockedSet, center: Position) -> u8 {
    let mut cleared = 0;
    for dy in -1..=1 {
        for dx in -1..=1 {
            if let Some(pos) = center.offset(dx, dy) {
                if blocked.remove(pos) {
                    cleared += 1;
                }
            }
        }
    }
    cleared
}

/// Open up the box under `mover` at `at` and apply what it holds.
///
/// Returns `true` when the move keeps the turn for the mover.
pub(crate) fn resolve_box<R: Rng + ?Sized>(
    state: &mut MatchState,
    mover: Side,
    at: Position,
    rng: &mut R,
    events: &mut Vec<GameEvent>,
) -> bool {
    state.mystery_box = None;
    let kind = PowerUpKind::random(rng);
    events.push(GameEvent::PowerUpCollected {
        side: mover,
        kind,
        at,
    });

    match kind {
        PowerUpKind::Teleport => {
            state.power_up = Some(ActivePowerUp {
                holder: mover,
                kind,
            });
            false
        }
        PowerUpKind::AreaClear => {
            let cleared = clear_area(&mut state.blocked, at);
            events.push(GameEvent::AreaCleared {
                side: mover,
                center: at,
                cleared,
            });
            false
        }
        PowerUpKind::SkipOpponentTurn => {
            events.push(GameEvent::OpponentSkipped { side: mover });
            true
        }
    }
}

/// One spawn attempt for the current turn.
///
/// Does nothing when boxes are disabled, the match is over, a box is already
/// on the board or a power-up is still armed. Otherwise, with probability
/// [`BOX_SPAWN_CHANCE`], tries up to [`BOX_SPAWN_ATTEMPTS`] random squares for
/// one that is neither blocked nor occupied and gives up silently if none is
/// found.
pub fn try_spawn_box<R: Rng + ?Sized>(
    state: &MatchState,
    rules: &Rules,
    rng: &mut R,
) -> Option<Transition> {
    if !rules.modifiers.mystery_boxes
        || state.is_over()
        || state.mystery_box.is_some()
        || state.power_up.is_some()
    {
        return None;
    }
    if !rng.random_bool(BOX_SPAWN_CHANCE) {
        return None;
    }

    for _ in 0..BOX_SPAWN_ATTEMPTS {
        let pos = Position::new(
            rng.random_range(0..BOARD_SIZE),
            rng.random_range(0..BOARD_SIZE),
        );
        if state.blocked.contains(pos) || pos == state.a || pos == state.b {
            continue;
        }
        let mut next = state.clone();
        next.mystery_box = Some(pos);
        return Some(Transition {
            state: next,
            events: vec![GameEvent::BoxSpawned { at: pos }],
        });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_clear_area_removes_neighbourhood_only() {
        let mut blocked: BlockedSet = Position::all().collect();
        let cleared = clear_area(&mut blocked, Position::new(3, 3));
        assert_eq!(cleared, 9);
        assert!(!blocked.contains(Position::new(2, 2)));
        assert!(!blocked.contains(Position::new(4, 4)));
        assert!(blocked.contains(Position::new(5, 3)));
    }

    #[test]
    fn test_clear_area_at_corner_stays_on_board() {
        let mut blocked: BlockedSet = Position::all().collect();
        assert_eq!(clear_area(&mut blocked, Position::new(0, 0)), 4);
    }

    #[test]
    fn test_spawn_never_lands_on_blocked_or_tokens() {
        let rules = Rules::free_play();
        let mut state = MatchState::free_play();
        state.blocked = Position::all()
            .filter(|p| p.index() % 3 == 0)
            .filter(|p| *p != state.a && *p != state.b)
            .collect();
        let mut rng = StdRng::seed_from_u64(7);
        let mut spawned = 0;
        for _ in 0..500 {
            if let Some(t) = try_spawn_box(&state, &rules, &mut rng) {
                let at = t.state.mystery_box.unwrap();
                assert!(!state.blocked.contains(at));
                assert_ne!(at, state.a);
                assert_ne!(at, state.b);
                spawned += 1;
            }
        }
        assert!(spawned > 0);
    }

    #[test]
    fn test_spawn_is_noop_while_box_or_power_up_live() {
        let rules = Rules::free_play();
        let mut rng = StdRng::seed_from_u64(1);

        let mut with_box = MatchState::free_play();
        with_box.mystery_box = Some(Position::new(4, 4));
        let mut armed = MatchState::free_play();
        armed.power_up = Some(ActivePowerUp {
            holder: Side::B,
            kind: PowerUpKind::Teleport,
        });

        for _ in 0..200 {
            assert!(try_spawn_box(&with_box, &rules, &mut rng).is_none());
            assert!(try_spawn_box(&armed, &rules, &mut rng).is_none());
        }
    }

    #[test]
    fn test_spawn_disabled_by_policy() {
        let rules = Rules {
            modifiers: crate::game::ModifierPolicy::none(),
            ..Rules::free_play()
        };
        let mut rng = StdRng::seed_from_u64(3);
        let state = MatchState::free_play();
        for _ in 0..200 {
            assert!(try_spawn_box(&state, &rules, &mut rng).is_none());
        }
    }
}
