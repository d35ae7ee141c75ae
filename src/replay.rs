//! Match recording and replay.
//!
//! Matches are deterministic given the engine seed, so a recording only needs:
//! - the level and modifier policy
//! - `seed: u64`, which drives box spawns, box contents and disruption targets
//! - the list of player actions, computer moves included
//!
//! No state deltas needed. To view step N, re-run the match from step 0 to N.
//!
//! # Time Travel
//!
//! - **Forward**: Apply the next recorded action
//! - **Backward**: Re-run from step 0 to (`current_step` - 1)
//! - **Jump to step N**: Re-run from step 0 to N

mod render;

pub use render::{RenderOptions, render_ascii};

use crate::game::{LevelConfig, MatchState, ModifierPolicy};
use crate::session::{Action, ActionError, Mode, Session};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything needed to replay one match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    /// Level played.
    pub level: LevelConfig,
    /// Modifiers in force.
    #[serde(default)]
    pub modifiers: ModifierPolicy,
    /// Engine seed.
    pub seed: u64,
    /// Actions in the order they took effect.
    pub actions: Vec<Action>,
}

impl Recording {
    /// Save recording to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })
    }

    /// Load recording from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let recording: Recording = serde_json::from_str(&text)?;
        Ok(recording)
    }
}

/// Error type for replay operations.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    /// Reading or writing the recording failed.
    #[error("failed to access {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The recording is not valid JSON.
    #[error("invalid recording: {0}")]
    Json(#[from] serde_json::Error),
    /// A recorded action no longer applies.
    #[error("recording diverged at step {step}: {source}")]
    Diverged {
        /// Index of the failing action.
        step: usize,
        /// Why it was declined.
        source: ActionError,
    },
    /// Step number out of bounds.
    #[error("step {requested} out of bounds (max: {max_step})")]
    StepOutOfBounds {
        /// Requested step.
        requested: usize,
        /// Last valid step.
        max_step: usize,
    },
    /// Every recorded action has been applied.
    #[error("recording is finished")]
    Finished,
}

/// Replay engine - steps through a match deterministically.
///
/// Since matches are deterministic, this engine can:
/// - Step forward by applying one action
/// - Step backward by replaying from step 0
/// - Jump to any step by replaying from step 0
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    session: Session,
    current_step: usize,
}

impl ReplayEngine {
    /// Create a new replay engine from a recording, starting at step 0.
    ///
    /// # Errors
    ///
    /// Never fails at step 0; see [`Self::new_at_step`].
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at_step(recording, 0)
    }

    /// Create a new replay engine at a specific step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is past the end or an action diverges.
    pub fn new_at_step(recording: Recording, target_step: usize) -> Result<Self, ReplayError> {
        if target_step > recording.actions.len() {
            return Err(ReplayError::StepOutOfBounds {
                requested: target_step,
                max_step: recording.actions.len(),
            });
        }
        let session = Session::new(
            recording.level.clone(),
            recording.modifiers,
            Mode::HotSeat,
            recording.seed,
        );
        let mut engine = Self {
            recording,
            session,
            current_step: 0,
        };
        for _ in 0..target_step {
            engine.step_forward()?;
        }
        Ok(engine)
    }

    /// Replay every action and return the final state.
    ///
    /// # Errors
    ///
    /// Returns an error if any action diverges.
    pub fn verify(recording: Recording) -> Result<MatchState, ReplayError> {
        let len = recording.actions.len();
        let engine = Self::new_at_step(recording, len)?;
        Ok(engine.session.state().clone())
    }

    /// Get the recording.
    #[must_use]
    pub fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Get current step number.
    #[must_use]
    pub fn step(&self) -> usize {
        self.current_step
    }

    /// Number of recorded actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.recording.actions.len()
    }

    /// Whether the recording has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recording.actions.is_empty()
    }

    /// Get current match state.
    #[must_use]
    pub fn state(&self) -> &MatchState {
        self.session.state()
    }

    /// Whether every action has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.current_step == self.recording.actions.len()
    }

    /// Apply the next action.
    ///
    /// # Errors
    ///
    /// Returns an error at the end of the recording or if the action diverges.
    pub fn step_forward(&mut self) -> Result<(), ReplayError> {
        let Some(&action) = self.recording.actions.get(self.current_step) else {
            return Err(ReplayError::Finished);
        };
        self.session
            .apply(action)
            .map_err(|source| ReplayError::Diverged {
                step: self.current_step,
                source,
            })?;
        self.current_step += 1;
        Ok(())
    }

    /// Step backward one action.
    ///
    /// # Errors
    ///
    /// Returns an error if already at step 0.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        if self.current_step == 0 {
            return Err(ReplayError::StepOutOfBounds {
                requested: 0,
                max_step: self.len(),
            });
        }
        self.goto_step(self.current_step - 1)
    }

    /// Jump to a specific step.
    ///
    /// # Errors
    ///
    /// Returns an error if the step is out of bounds or an action diverges.
    pub fn goto_step(&mut self, target_step: usize) -> Result<(), ReplayError> {
        let recording = self.recording.clone();
        *self = Self::new_at_step(recording, target_step)?;
        Ok(())
    }

    /// Render current state to ASCII for terminal viewing.
    #[must_use]
    pub fn render_ascii(&self, options: RenderOptions) -> String {
        render_ascii(self.session.state(), self.session.rules(), options)
    }
}
