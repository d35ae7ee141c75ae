//! Property-based tests for the move engine and its modifiers.
//!
//! Run with: cargo test --release prop_engine

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use knight_chase::game::{
    BlockedSet, Difficulty, GameEvent, LevelConfig, MatchState, ModifierPolicy, Position, Rules,
    Side, apply_move, check_invariants, choose_move, is_legal_move, legal_moves,
    release_disruption, reset_match, try_spawn_box,
};

fn position() -> impl Strategy<Value = Position> {
    (0u8..8, 0u8..8).prop_map(|(x, y)| Position::new(x, y))
}

fn blocked_set() -> impl Strategy<Value = BlockedSet> {
    any::<u64>().prop_map(BlockedSet::from_bits)
}

fn difficulty() -> impl Strategy<Value = Difficulty> {
    prop_oneof![
        Just(Difficulty::Easy),
        Just(Difficulty::Medium),
        Just(Difficulty::Hard),
    ]
}

fn modifiers() -> impl Strategy<Value = ModifierPolicy> {
    (any::<bool>(), any::<bool>(), any::<bool>()).prop_map(|(boxes, shrink, disruption)| {
        ModifierPolicy {
            mystery_boxes: boxes,
            arena_shrink: shrink,
            disruption_charge: disruption,
            fading_blocks: false,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    /// Knight legality is exactly "one knight step onto an open square".
    #[test]
    fn prop_knight_legality(from in position(), to in position(), blocked in blocked_set()) {
        let dx = (i16::from(from.x) - i16::from(to.x)).abs();
        let dy = (i16::from(from.y) - i16::from(to.y)).abs();
        let expected = ((dx == 1 && dy == 2) || (dx == 2 && dy == 1)) && !blocked.contains(to);
        prop_assert_eq!(is_legal_move(from, to, blocked, false), expected);
        prop_assert_eq!(legal_moves(from, blocked, false).contains(&to), expected);
    }

    /// A teleport reaches any open square but the origin.
    #[test]
    fn prop_teleport_legality(from in position(), to in position(), blocked in blocked_set()) {
        let expected = to != from && !blocked.contains(to);
        prop_assert_eq!(is_legal_move(from, to, blocked, true), expected);
        prop_assert_eq!(legal_moves(from, blocked, true).contains(&to), expected);
    }

    /// Knight destinations never repeat and never exceed eight.
    #[test]
    fn prop_legal_moves_distinct(from in position(), blocked in blocked_set()) {
        let moves = legal_moves(from, blocked, false);
        prop_assert!(moves.len() <= 8);
        let mut sorted = moves.clone();
        sorted.sort_by_key(|p| p.index());
        sorted.dedup();
        prop_assert_eq!(sorted.len(), moves.len());
    }

    /// The computer takes a capture whenever one is on offer.
    #[test]
    fn prop_ai_always_captures(
        own in position(),
        blocked in blocked_set(),
        pick in any::<prop::sample::Index>(),
        level in difficulty(),
        seed in any::<u64>(),
    ) {
        let blocked = BlockedSet::from_bits(blocked.bits() & !(1u64 << own.index()));
        let moves = legal_moves(own, blocked, false);
        prop_assume!(!moves.is_empty());
        let opponent = moves[pick.index(moves.len())];
        let mut rng = StdRng::seed_from_u64(seed);
        let chosen = choose_move(own, opponent, blocked, level, false, &mut rng);
        prop_assert_eq!(chosen, Some(opponent));
    }

    /// The computer's pick is always legal, and it gives up only when trapped.
    #[test]
    fn prop_ai_move_is_legal(
        own in position(),
        opponent in position(),
        blocked in blocked_set(),
        level in difficulty(),
        teleport in any::<bool>(),
        seed in any::<u64>(),
    ) {
        prop_assume!(own != opponent);
        let mut rng = StdRng::seed_from_u64(seed);
        match choose_move(own, opponent, blocked, level, teleport, &mut rng) {
            Some(target) => prop_assert!(is_legal_move(own, target, blocked, teleport)),
            None => prop_assert!(legal_moves(own, blocked, teleport).is_empty()),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Resetting a level twice gives identical states and digests.
    #[test]
    fn prop_reset_is_deterministic(id in 0u32..9, extra in blocked_set()) {
        let mut level = LevelConfig::builtin(id).unwrap_or_else(LevelConfig::free_play);
        let start_bits = (1u64 << level.a_start.index()) | (1u64 << level.b_start.index());
        level.initial_blocked = BlockedSet::from_bits(extra.bits() & !start_bits);
        let first = reset_match(&level);
        let second = reset_match(&level);
        prop_assert_eq!(first.digest(), second.digest());
        prop_assert_eq!(first, second);
    }

    /// Random games keep every invariant and never reopen squares except
    /// through an area clear.
    #[test]
    fn prop_random_games_hold_invariants(
        id in 0u32..9,
        policy in modifiers(),
        seed in any::<u64>(),
    ) {
        let level = LevelConfig::builtin(id).unwrap_or_else(LevelConfig::free_play);
        let rules = Rules::new(&level, policy);
        let mut rng = StdRng::seed_from_u64(seed);
        let mut state = reset_match(&level);
        prop_assert!(check_invariants(&state, &rules).is_empty());

        for _ in 0..400 {
            if state.is_over() {
                break;
            }
            let prior = state.clone();

            let disrupted = if rng.random_bool(0.1) {
                release_disruption(&prior, &rules, &mut rng).ok()
            } else {
                None
            };
            let transition = if let Some(t) = disrupted {
                t
            } else {
                let side = prior.to_move;
                let moves = prior.legal_moves_for(side);
                prop_assert!(!moves.is_empty(), "side to move is stuck in a live match");
                let target = moves[rng.random_range(0..moves.len())];
                let t = apply_move(&prior, &rules, side, target, &mut rng).unwrap();
                let cleared = t
                    .events
                    .iter()
                    .any(|e| matches!(e, GameEvent::AreaCleared { .. }));
                if !cleared {
                    prop_assert!(t.state.blocked.contains(prior.position(side)));
                }
                t
            };

            let cleared = transition
                .events
                .iter()
                .any(|e| matches!(e, GameEvent::AreaCleared { .. }));
            if !cleared {
                prop_assert!(prior.blocked.is_subset(transition.state.blocked));
            }
            state = transition.state;
            let violations = check_invariants(&state, &rules);
            prop_assert!(violations.is_empty(), "{:?}", violations);

            if let Some(spawned) = try_spawn_box(&state, &rules, &mut rng) {
                prop_assert!(rules.modifiers.mystery_boxes);
                prop_assert_eq!(spawned.state.blocked, state.blocked);
                state = spawned.state;
                prop_assert!(check_invariants(&state, &rules).is_empty());
            }
        }
    }

    /// Moves by the side not on turn are refused and change nothing.
    #[test]
    fn prop_out_of_turn_rejected(target in position(), seed in any::<u64>()) {
        let state = MatchState::free_play();
        let rules = Rules::free_play();
        let mut rng = StdRng::seed_from_u64(seed);
        prop_assert!(apply_move(&state, &rules, Side::B, target, &mut rng).is_err());
    }
}
