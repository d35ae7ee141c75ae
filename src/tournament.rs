//! Tournament runner for computer-vs-computer matches.
//!
//! Provides a pure function interface: `(seed, config) -> GameResult`
//!
//! The tournament runner handles:
//! - Playing both sides with the AI at per-side difficulties
//! - Mystery-box spawns and the optional modifiers, seeded per game
//! - Parallel batches with rayon, folded into [`TournamentStats`]

use crate::error::LevelError;
use crate::game::{
    CHARGE_FULL, Difficulty, LevelConfig, ModifierPolicy, Outcome, Side, WinCause,
    compute_ai_move,
};
use crate::replay::Recording;
use crate::session::{Action, ActionError, Mode, Session};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Configuration for the tournament.
#[derive(Debug, Clone)]
pub struct TournamentConfig {
    /// Level every game starts from.
    pub level: LevelConfig,
    /// Modifiers in force.
    pub modifiers: ModifierPolicy,
    /// Strength of the AI playing side A.
    pub a_difficulty: Difficulty,
    /// Strength of the AI playing side B.
    pub b_difficulty: Difficulty,
    /// Turns before an unfinished game is scored as a draw.
    pub max_turns: u32,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            level: LevelConfig::free_play(),
            modifiers: ModifierPolicy::default(),
            a_difficulty: Difficulty::Medium,
            b_difficulty: Difficulty::Medium,
            max_turns: 200,
        }
    }
}

/// Final result of a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    /// Winner and cause, or `None` if the turn cap was hit.
    pub outcome: Option<(Side, WinCause)>,
    /// Turn counter at the end.
    pub turns_played: u32,
    /// Disruptions released by side A.
    pub disruptions: u32,
    /// The seed used for this game.
    pub seed: u64,
}

/// Error type for tournament operations.
#[derive(Debug, thiserror::Error)]
pub enum TournamentError {
    /// The configured level is not playable.
    #[error("invalid level: {0}")]
    InvalidLevel(#[from] LevelError),
    /// The engine rejected an AI move.
    #[error("game {seed}: AI move rejected: {source}")]
    AiRejected {
        /// Seed of the failing game.
        seed: u64,
        /// Engine error.
        source: ActionError,
    },
}

/// Run a complete game with the given seed.
///
/// # Determinism
///
/// Given the same seed and config, this function always produces
/// the same `GameResult`.
///
/// # Errors
///
/// Returns an error if the level is invalid or the engine rejects a move.
pub fn run_game(seed: u64, config: &TournamentConfig) -> Result<GameResult, TournamentError> {
    play_game(seed, config).map(|(result, _)| result)
}

/// Run a complete game and keep its recording.
///
/// Both sides are driven through a hot-seat [`Session`], so the recording
/// replays with [`crate::replay::ReplayEngine`]. Side A releases its
/// disruption charge as soon as it is full.
///
/// # Errors
///
/// Returns an error if the level is invalid or the engine rejects a move.
pub fn play_game(
    seed: u64,
    config: &TournamentConfig,
) -> Result<(GameResult, Recording), TournamentError> {
    config.level.validate()?;
    let mut session = Session::new(config.level.clone(), config.modifiers, Mode::HotSeat, seed);
    let mut ai_rng = StdRng::seed_from_u64(seed.rotate_left(32));
    let mut disruptions = 0;

    while !session.state().is_over() && session.state().turn < config.max_turns {
        let side = session.state().to_move;
        let charged = session.state().charge >= CHARGE_FULL;
        if side == Side::A
            && charged
            && session.rules().modifiers.disruption_charge
            && session.disrupt().is_ok()
        {
            disruptions += 1;
            continue;
        }

        let difficulty = match side {
            Side::A => config.a_difficulty,
            Side::B => config.b_difficulty,
        };
        let action = match compute_ai_move(session.state(), difficulty, &mut ai_rng) {
            Some(to) => Action::Move { side, to },
            None => Action::Concede { side },
        };
        session
            .apply(action)
            .map_err(|source| TournamentError::AiRejected { seed, source })?;
    }

    let state = session.state();
    let outcome = match state.outcome {
        Outcome::Ended { winner, cause } => Some((winner, cause)),
        Outcome::InProgress => None,
    };
    debug!(seed, ?outcome, turns = state.turn, "game finished");
    let result = GameResult {
        outcome,
        turns_played: state.turn,
        disruptions,
        seed,
    };
    Ok((result, session.recording()))
}

/// Run `games` games with seeds `base_seed, base_seed + 1, ...` in parallel.
///
/// Each rayon worker accumulates into its own [`TournamentStats`] and the
/// partial results are merged at the end.
///
/// # Errors
///
/// Returns the first error encountered, if any game failed.
pub fn run_tournament(
    config: &TournamentConfig,
    games: u64,
    base_seed: u64,
) -> Result<TournamentStats, TournamentError> {
    run_tournament_with(config, games, base_seed, |_| {})
}

/// [`run_tournament`], calling `on_game` from the worker thread after each
/// game finishes.
///
/// # Errors
///
/// Returns the first error encountered, if any game failed.
pub fn run_tournament_with<F>(
    config: &TournamentConfig,
    games: u64,
    base_seed: u64,
    on_game: F,
) -> Result<TournamentStats, TournamentError>
where
    F: Fn(&GameResult) + Sync,
{
    config.level.validate()?;
    (0..games)
        .into_par_iter()
        .try_fold(TournamentStats::default, |mut local, i| {
            let result = run_game(base_seed.wrapping_add(i), config)?;
            local.add_result(&result);
            on_game(&result);
            Ok(local)
        })
        .try_reduce(TournamentStats::default, |mut a, b| {
            a.merge(&b);
            Ok(a)
        })
}

/// Tournament statistics for aggregated results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentStats {
    /// Total games played.
    pub games_played: u64,
    /// Wins by side A.
    pub a_wins: u64,
    /// Wins by side B.
    pub b_wins: u64,
    /// Games cut off by the turn cap.
    pub draws: u64,
    /// Decided games per win cause.
    pub causes: HashMap<WinCause, u64>,
    total_turns: u64,
    total_disruptions: u64,
}

impl TournamentStats {
    /// Add a game result to the stats.
    pub fn add_result(&mut self, result: &GameResult) {
        self.games_played += 1;
        self.total_turns += u64::from(result.turns_played);
        self.total_disruptions += u64::from(result.disruptions);
        match result.outcome {
            Some((winner, cause)) => {
                match winner {
                    Side::A => self.a_wins += 1,
                    Side::B => self.b_wins += 1,
                }
                *self.causes.entry(cause).or_default() += 1;
            }
            None => self.draws += 1,
        }
    }

    /// Fold another partial result into this one.
    pub fn merge(&mut self, other: &TournamentStats) {
        self.games_played += other.games_played;
        self.a_wins += other.a_wins;
        self.b_wins += other.b_wins;
        self.draws += other.draws;
        self.total_turns += other.total_turns;
        self.total_disruptions += other.total_disruptions;
        for (cause, n) in &other.causes {
            *self.causes.entry(*cause).or_default() += n;
        }
    }

    /// Wins for `side`.
    #[must_use]
    pub fn wins(&self, side: Side) -> u64 {
        match side {
            Side::A => self.a_wins,
            Side::B => self.b_wins,
        }
    }

    /// Win rate for `side` (0.0-1.0).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn win_rate(&self, side: Side) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.wins(side) as f64 / self.games_played as f64
    }

    /// Average game length in turns.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_turns(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_turns as f64 / self.games_played as f64
    }

    /// Average disruptions released per game.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn avg_disruptions(&self) -> f64 {
        if self.games_played == 0 {
            return 0.0;
        }
        self.total_disruptions as f64 / self.games_played as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_game_deterministic() {
        let config = TournamentConfig::default();
        let first = run_game(42, &config).unwrap();
        let second = run_game(42, &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_games_finish_on_open_board() {
        // Each move blocks a square, so 64 squares bound the game length.
        let config = TournamentConfig {
            modifiers: ModifierPolicy::none(),
            max_turns: 1000,
            ..TournamentConfig::default()
        };
        for seed in 0..10 {
            let result = run_game(seed, &config).unwrap();
            assert!(result.outcome.is_some(), "seed {seed} did not finish");
            assert!(result.turns_played < 64);
        }
    }

    #[test]
    fn test_turn_cap_scores_draw() {
        let config = TournamentConfig {
            max_turns: 2,
            ..TournamentConfig::default()
        };
        let result = run_game(1, &config).unwrap();
        assert_eq!(result.outcome, None);
        assert_eq!(result.turns_played, 2);
    }

    #[test]
    fn test_invalid_level_rejected() {
        let mut config = TournamentConfig::default();
        config.level.b_start = config.level.a_start;
        assert!(matches!(
            run_game(0, &config),
            Err(TournamentError::InvalidLevel(_))
        ));
    }

    #[test]
    fn test_disruption_used_when_enabled() {
        let config = TournamentConfig {
            modifiers: ModifierPolicy {
                disruption_charge: true,
                ..ModifierPolicy::none()
            },
            a_difficulty: Difficulty::Easy,
            b_difficulty: Difficulty::Easy,
            ..TournamentConfig::default()
        };
        let stats = run_tournament(&config, 20, 0).unwrap();
        assert!(stats.avg_disruptions() > 0.0);
    }

    #[test]
    fn test_recording_replays_to_same_result() {
        let config = TournamentConfig {
            level: LevelConfig::builtin(3).unwrap(),
            modifiers: ModifierPolicy {
                arena_shrink: true,
                disruption_charge: true,
                ..ModifierPolicy::default()
            },
            ..TournamentConfig::default()
        };
        let (result, recording) = play_game(9, &config).unwrap();
        let replayed = crate::replay::ReplayEngine::verify(recording).unwrap();
        assert_eq!(replayed.turn, result.turns_played);
        assert_eq!(
            replayed.outcome,
            match result.outcome {
                Some((winner, cause)) => Outcome::Ended { winner, cause },
                None => Outcome::InProgress,
            }
        );
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let config = TournamentConfig::default();
        let parallel = run_tournament(&config, 16, 100).unwrap();
        let mut sequential = TournamentStats::default();
        for i in 0..16 {
            sequential.add_result(&run_game(100 + i, &config).unwrap());
        }
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.games_played, 16);
        assert_eq!(
            parallel.a_wins + parallel.b_wins + parallel.draws,
            parallel.games_played
        );
    }
}
