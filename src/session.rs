//! Local match driver for hot-seat and computer play.
//!
//! A [`Session`] owns the current [`MatchState`] for one level and feeds every
//! action through the engine. It keeps two random streams: the engine stream
//! (box spawns, box contents, disruption targets) is seeded from the match
//! seed so a [`Recording`] replays exactly, while the AI stream only drives
//! move selection, whose results are recorded as ordinary moves.

use crate::error::{DisruptionError, MoveError};
use crate::game::{
    Difficulty, GameEvent, LevelConfig, MatchState, ModifierPolicy, Outcome, Position, Rules,
    Side, Transition, WinCause, apply_move, compute_ai_move, concede_if_trapped,
    release_disruption, reset_match, try_spawn_box,
};
use crate::replay::Recording;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mixed into the match seed to derive the AI stream.
const AI_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

/// Who controls side B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum Mode {
    /// Two people share one device.
    HotSeat,
    /// Side B is played by the computer.
    VersusAi {
        /// AI strength.
        difficulty: Difficulty,
    },
}

impl Mode {
    /// The computer opponent for `level`. Free play runs at `requested` when
    /// one is given; every numbered level plays at its own difficulty.
    #[must_use]
    pub fn versus_ai_on(level: &LevelConfig, requested: Option<Difficulty>) -> Self {
        let difficulty = match requested {
            Some(chosen) if level.id == LevelConfig::free_play().id => chosen,
            _ => level.difficulty,
        };
        Mode::VersusAi { difficulty }
    }
}

/// One recorded player action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Action {
    /// `side` moves to `to`.
    Move {
        /// Mover.
        side: Side,
        /// Target square.
        to: Position,
    },
    /// Side A releases its disruption charge.
    Disrupt,
    /// `side` admits it has no move.
    Concede {
        /// The trapped side.
        side: Side,
    },
}

/// Why a session action had no effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    /// The engine declined the move.
    #[error(transparent)]
    Move(#[from] MoveError),
    /// The disruption could not be released.
    #[error(transparent)]
    Disruption(#[from] DisruptionError),
    /// A concession from a side that can still move.
    #[error("{0} is not trapped")]
    NotTrapped(Side),
}

/// Result of a finished match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    /// Level played.
    pub level: u32,
    /// Winner.
    pub winner: Side,
    /// How the match was won.
    pub cause: WinCause,
    /// Turn counter at the end.
    pub turns: u32,
    /// Moves made by side A.
    pub a_moves: u32,
    /// Points awarded to side A.
    pub points: u32,
}

impl MatchSummary {
    /// Points for a result: beating the computer scores by difficulty,
    /// everything else scores nothing.
    #[must_use]
    pub const fn points(mode: Mode, winner: Side) -> u32 {
        match (mode, winner) {
            (Mode::VersusAi { difficulty }, Side::A) => difficulty.win_points(),
            _ => 0,
        }
    }
}

/// A local match in progress.
#[derive(Debug, Clone)]
pub struct Session {
    level: LevelConfig,
    rules: Rules,
    mode: Mode,
    seed: u64,
    round: u64,
    state: MatchState,
    actions: Vec<Action>,
    engine_rng: StdRng,
    ai_rng: StdRng,
}

impl Session {
    /// Start a match on `level`.
    #[must_use]
    pub fn new(level: LevelConfig, modifiers: ModifierPolicy, mode: Mode, seed: u64) -> Self {
        let rules = Rules::new(&level, modifiers);
        let state = reset_match(&level);
        Self {
            level,
            rules,
            mode,
            seed,
            round: 0,
            state,
            actions: Vec::new(),
            engine_rng: StdRng::seed_from_u64(seed),
            ai_rng: StdRng::seed_from_u64(seed ^ AI_STREAM),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Rules in force.
    #[must_use]
    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Level being played.
    #[must_use]
    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    /// Control mode.
    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Actions taken since the last reset.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Whether the computer is due to move.
    #[must_use]
    pub fn ai_to_move(&self) -> bool {
        matches!(self.mode, Mode::VersusAi { .. })
            && !self.state.is_over()
            && self.state.to_move == Side::B
    }

    /// Move the side to move to `target`.
    ///
    /// Against the computer only side A can be moved this way.
    ///
    /// # Errors
    ///
    /// Returns an error if the move is declined; the state is unchanged.
    pub fn play(&mut self, target: Position) -> Result<Vec<GameEvent>, ActionError> {
        if self.ai_to_move() {
            return Err(MoveError::NotYourTurn {
                expected: Side::B,
                got: Side::A,
            }
            .into());
        }
        self.apply(Action::Move {
            side: self.state.to_move,
            to: target,
        })
    }

    /// Let the computer take its turn, if it is due.
    ///
    /// Returns `Ok(None)` when it is not the computer's turn. A computer with
    /// no legal move concedes.
    ///
    /// # Errors
    ///
    /// Returns an error only if the engine rejects the chosen move, which
    /// would be an AI bug.
    pub fn ai_move(&mut self) -> Result<Option<Vec<GameEvent>>, ActionError> {
        let Mode::VersusAi { difficulty } = self.mode else {
            return Ok(None);
        };
        if !self.ai_to_move() {
            return Ok(None);
        }
        let action = match compute_ai_move(&self.state, difficulty, &mut self.ai_rng) {
            Some(to) => Action::Move { side: Side::B, to },
            None => Action::Concede { side: Side::B },
        };
        debug!(?action, %difficulty, "computer move");
        self.apply(action).map(Some)
    }

    /// Release side A's disruption charge.
    ///
    /// # Errors
    ///
    /// Returns an error if the modifier is off or the meter is not full.
    pub fn disrupt(&mut self) -> Result<Vec<GameEvent>, ActionError> {
        self.apply(Action::Disrupt)
    }

    /// Apply any action, recording it if it took effect.
    ///
    /// Moves are followed by one mystery-box spawn attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the action is declined; the state is unchanged.
    pub fn apply(&mut self, action: Action) -> Result<Vec<GameEvent>, ActionError> {
        let mut transition = match action {
            Action::Move { side, to } => {
                apply_move(&self.state, &self.rules, side, to, &mut self.engine_rng)?
            }
            Action::Disrupt => release_disruption(&self.state, &self.rules, &mut self.engine_rng)?,
            Action::Concede { side } => {
                let state = concede_if_trapped(&self.state, side).ok_or(ActionError::NotTrapped(side))?;
                let events = match state.outcome {
                    Outcome::Ended { winner, cause } => vec![GameEvent::MatchEnded { winner, cause }],
                    Outcome::InProgress => Vec::new(),
                };
                Transition { state, events }
            }
        };

        if matches!(action, Action::Move { .. }) {
            if let Some(spawn) = try_spawn_box(&transition.state, &self.rules, &mut self.engine_rng) {
                transition.state = spawn.state;
                transition.events.extend(spawn.events);
            }
        }

        self.actions.push(action);
        self.state = transition.state;
        if let Outcome::Ended { winner, cause } = self.state.outcome {
            debug!(level = self.level.id, %winner, %cause, turns = self.state.turn, "match over");
        }
        Ok(transition.events)
    }

    /// The result, once the match is over.
    #[must_use]
    pub fn summary(&self) -> Option<MatchSummary> {
        let Outcome::Ended { winner, cause } = self.state.outcome else {
            return None;
        };
        Some(MatchSummary {
            level: self.level.id,
            winner,
            cause,
            turns: self.state.turn,
            a_moves: self.state.a_moves,
            points: MatchSummary::points(self.mode, winner),
        })
    }

    /// Start the level again with a fresh engine stream.
    pub fn reset(&mut self) {
        self.round += 1;
        self.engine_rng = StdRng::seed_from_u64(self.round_seed());
        self.state = reset_match(&self.level);
        self.actions.clear();
    }

    fn round_seed(&self) -> u64 {
        self.seed.wrapping_add(self.round)
    }

    /// Everything needed to replay the current match.
    #[must_use]
    pub fn recording(&self) -> Recording {
        Recording {
            level: self.level.clone(),
            modifiers: self.rules.modifiers,
            seed: self.round_seed(),
            actions: self.actions.clone(),
        }
    }
}
