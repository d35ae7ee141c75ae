#![no_main]

//! Move sequence fuzzer.
//!
//! Drives a match with arbitrary moves, disruptions and box spawns, legal or
//! not, and checks after every accepted step that every match invariant
//! holds and that no square reopens except through an area clear.

use arbitrary::Arbitrary;
use knight_chase::game::{
    GameEvent, LevelConfig, ModifierPolicy, Position, Rules, Side, apply_move, check_invariants,
    release_disruption, reset_match, try_spawn_box,
};
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A fuzzer-generated action.
#[derive(Arbitrary, Debug, Clone)]
enum FuzzAction {
    /// Move for either side, coordinates reduced onto the board.
    Move { b_side: bool, x: u8, y: u8 },
    /// Release side A's charge.
    Disrupt,
    /// One box spawn attempt.
    Spawn,
}

/// Structured input for move fuzzing.
#[derive(Arbitrary, Debug)]
struct MovesInput {
    level: u8,
    boxes: bool,
    shrink: bool,
    disruption: bool,
    rng_seed: u64,
    actions: Vec<FuzzAction>,
}

fuzz_target!(|input: MovesInput| {
    let level =
        LevelConfig::builtin(u32::from(input.level % 9)).unwrap_or_else(LevelConfig::free_play);
    let rules = Rules::new(
        &level,
        ModifierPolicy {
            mystery_boxes: input.boxes,
            arena_shrink: input.shrink,
            disruption_charge: input.disruption,
            fading_blocks: false,
        },
    );
    let mut rng = StdRng::seed_from_u64(input.rng_seed);
    let mut state = reset_match(&level);

    for action in input.actions.into_iter().take(200) {
        let prior = state.clone();
        let result = match action {
            FuzzAction::Move { b_side, x, y } => {
                let side = if b_side { Side::B } else { Side::A };
                apply_move(&prior, &rules, side, Position::new(x % 8, y % 8), &mut rng).ok()
            }
            FuzzAction::Disrupt => release_disruption(&prior, &rules, &mut rng).ok(),
            FuzzAction::Spawn => try_spawn_box(&prior, &rules, &mut rng),
        };
        let Some(transition) = result else {
            continue;
        };

        let cleared = transition
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::AreaCleared { .. }));
        if !cleared {
            assert!(
                prior.blocked.is_subset(transition.state.blocked),
                "squares reopened without an area clear"
            );
        }
        state = transition.state;

        let violations = check_invariants(&state, &rules);
        assert!(violations.is_empty(), "Invariants violated: {:?}", violations);
    }
});
