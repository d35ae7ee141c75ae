//! Benchmarks for the move engine and the computer opponent.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use knight_chase::game::{
    BlockedSet, Difficulty, MatchState, Position, Rules, Side, apply_move, choose_move,
    legal_moves,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// A crowded mid-game board.
fn crowded() -> BlockedSet {
    Position::all()
        .filter(|p| (p.x * 3 + p.y * 5) % 4 == 0)
        .filter(|p| *p != Position::new(3, 3) && *p != Position::new(5, 4))
        .collect()
}

fn bench_legal_moves(c: &mut Criterion) {
    let blocked = crowded();
    c.bench_function("legal_moves_knight", |b| {
        b.iter(|| legal_moves(black_box(Position::new(3, 3)), black_box(blocked), false));
    });
    c.bench_function("legal_moves_teleport", |b| {
        b.iter(|| legal_moves(black_box(Position::new(3, 3)), black_box(blocked), true));
    });
}

fn bench_apply_move(c: &mut Criterion) {
    let state = MatchState::free_play();
    let rules = Rules::free_play();
    let mut rng = StdRng::seed_from_u64(42);
    c.bench_function("apply_move_opening", |b| {
        b.iter(|| {
            let t = apply_move(
                black_box(&state),
                &rules,
                Side::A,
                black_box(Position::new(1, 2)),
                &mut rng,
            );
            black_box(t)
        });
    });
}

fn bench_choose_move(c: &mut Criterion) {
    let blocked = crowded();
    let mut rng = StdRng::seed_from_u64(42);
    let mut group = c.benchmark_group("choose_move");
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        group.bench_function(difficulty.to_string(), |b| {
            b.iter(|| {
                choose_move(
                    black_box(Position::new(3, 3)),
                    black_box(Position::new(5, 4)),
                    black_box(blocked),
                    difficulty,
                    false,
                    &mut rng,
                )
            });
        });
    }
    group.bench_function("teleport", |b| {
        b.iter(|| {
            choose_move(
                black_box(Position::new(3, 3)),
                black_box(Position::new(5, 4)),
                black_box(blocked),
                Difficulty::Hard,
                true,
                &mut rng,
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_legal_moves, bench_apply_move, bench_choose_move);
criterion_main!(benches);
