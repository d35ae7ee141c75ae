//! Level configuration: static, read-only match setup data.
//!
//! Levels are authored elsewhere; the engine only consumes them. The built-in
//! table mirrors the adventure pages shipped with the game plus one level per
//! non-capture objective.

use crate::error::LevelError;
use crate::game::board::{BlockedSet, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// AI strength tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Difficulty {
    /// Random legal moves (still captures greedily).
    Easy,
    /// One-ply mobility lookahead.
    #[default]
    Medium,
    /// Lookahead with full opponent mobility and a centre bias.
    Hard,
}

impl Difficulty {
    /// Points awarded to side A for beating the AI at this difficulty.
    #[must_use]
    pub const fn win_points(self) -> u32 {
        match self {
            Difficulty::Easy => 100,
            Difficulty::Medium => 200,
            Difficulty::Hard => 300,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => f.write_str("easy"),
            Difficulty::Medium => f.write_str("medium"),
            Difficulty::Hard => f.write_str("hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = LevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(LevelError::UnknownDifficulty(other.to_string())),
        }
    }
}

/// What side A has to do to win.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum Objective {
    /// Capture or trap the opponent.
    #[default]
    Capture,
    /// Reach the goal square. Coinciding tokens do not end the match.
    ReachGoal,
    /// Capture or trap the opponent within the move limit.
    AssassinateWithinLimit,
    /// Avoid capture and traps for the move limit's number of turns.
    SurviveNTurns,
}

/// Static description of a match setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelConfig {
    /// Level identifier (0 is free play).
    pub id: u32,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Win condition for side A.
    #[serde(default)]
    pub objective: Objective,
    /// Side A's starting square.
    pub a_start: Position,
    /// Side B's starting square.
    pub b_start: Position,
    /// AI strength when B is computer-controlled.
    #[serde(default)]
    pub difficulty: Difficulty,
    /// Squares blocked before the first move.
    #[serde(default)]
    pub initial_blocked: BlockedSet,
    /// Goal square for [`Objective::ReachGoal`].
    #[serde(default)]
    pub goal: Option<Position>,
    /// Move budget for side A (turns to survive for [`Objective::SurviveNTurns`]).
    #[serde(default)]
    pub move_limit: Option<u32>,
}

fn blocked(squares: &[(u8, u8)]) -> BlockedSet {
    squares.iter().map(|&(x, y)| Position::new(x, y)).collect()
}

impl LevelConfig {
    /// The default board: A at (0, 0), B at (7, 7), nothing blocked.
    #[must_use]
    pub fn free_play() -> Self {
        Self {
            id: 0,
            title: "Free Play".to_string(),
            objective: Objective::Capture,
            a_start: Position::new(0, 0),
            b_start: Position::new(7, 7),
            difficulty: Difficulty::Medium,
            initial_blocked: BlockedSet::new(),
            goal: None,
            move_limit: None,
        }
    }

    /// The built-in level table.
    #[must_use]
    pub fn builtin_levels() -> Vec<LevelConfig> {
        let base = Self::free_play();
        vec![
            Self {
                id: 1,
                title: "The Sketch".to_string(),
                difficulty: Difficulty::Easy,
                ..base.clone()
            },
            Self {
                id: 2,
                title: "The Coffee Stain".to_string(),
                difficulty: Difficulty::Easy,
                initial_blocked: blocked(&[(3, 3), (3, 4), (4, 3), (4, 4), (2, 2), (5, 5)]),
                ..base.clone()
            },
            Self {
                id: 3,
                title: "The Margins".to_string(),
                difficulty: Difficulty::Medium,
                a_start: Position::new(1, 1),
                b_start: Position::new(6, 6),
                initial_blocked: blocked(&[
                    (0, 0), (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (0, 6), (0, 7),
                    (7, 0), (7, 1), (7, 2), (7, 3), (7, 4), (7, 5), (7, 6), (7, 7),
                    (1, 0), (6, 0), (1, 7), (6, 7),
                ]),
                ..base.clone()
            },
            Self {
                id: 4,
                title: "The Maze".to_string(),
                difficulty: Difficulty::Medium,
                a_start: Position::new(0, 4),
                b_start: Position::new(7, 3),
                initial_blocked: blocked(&[
                    (2, 2), (2, 5), (5, 2), (5, 5), (3, 3), (3, 4), (4, 3), (4, 4), (1, 3), (6, 4),
                ]),
                ..base.clone()
            },
            Self {
                id: 5,
                title: "The Masterpiece".to_string(),
                difficulty: Difficulty::Hard,
                a_start: Position::new(3, 3),
                b_start: Position::new(4, 4),
                ..base.clone()
            },
            Self {
                id: 6,
                title: "The Finish Line".to_string(),
                objective: Objective::ReachGoal,
                difficulty: Difficulty::Medium,
                goal: Some(Position::new(5, 5)),
                move_limit: Some(8),
                ..base.clone()
            },
            Self {
                id: 7,
                title: "The Ambush".to_string(),
                objective: Objective::AssassinateWithinLimit,
                difficulty: Difficulty::Medium,
                a_start: Position::new(2, 2),
                b_start: Position::new(5, 5),
                move_limit: Some(12),
                ..base.clone()
            },
            Self {
                id: 8,
                title: "The Long Night".to_string(),
                objective: Objective::SurviveNTurns,
                difficulty: Difficulty::Hard,
                move_limit: Some(10),
                ..base
            },
        ]
    }

    /// Look up a built-in level by id (0 is free play).
    #[must_use]
    pub fn builtin(id: u32) -> Option<LevelConfig> {
        if id == 0 {
            return Some(Self::free_play());
        }
        Self::builtin_levels().into_iter().find(|l| l.id == id)
    }

    /// Parse and validate a level from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the level is inconsistent.
    pub fn from_json(text: &str) -> Result<Self, LevelError> {
        let level: LevelConfig = serde_json::from_str(text)?;
        level.validate()?;
        Ok(level)
    }

    /// Load and validate a level file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid level.
    pub fn load(path: &Path) -> Result<Self, LevelError> {
        let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Check the level is playable.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.a_start == self.b_start {
            return Err(LevelError::SharedStart(self.a_start));
        }
        for start in [self.a_start, self.b_start] {
            if self.initial_blocked.contains(start) {
                return Err(LevelError::BlockedStart(start));
            }
        }
        match self.objective {
            Objective::ReachGoal => {
                let goal = self.goal.ok_or(LevelError::MissingGoal)?;
                if self.initial_blocked.contains(goal) {
                    return Err(LevelError::BlockedGoal(goal));
                }
            }
            Objective::AssassinateWithinLimit | Objective::SurviveNTurns => {
                if self.move_limit.is_none() {
                    return Err(LevelError::MissingMoveLimit(self.objective));
                }
            }
            Objective::Capture => {}
        }
        if self.move_limit == Some(0) {
            return Err(LevelError::ZeroMoveLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_levels_are_valid() {
        let levels = LevelConfig::builtin_levels();
        assert_eq!(levels.len(), 8);
        for level in &levels {
            level.validate().unwrap();
        }
    }

    #[test]
    fn test_builtin_lookup() {
        assert_eq!(LevelConfig::builtin(0).unwrap().id, 0);
        assert_eq!(LevelConfig::builtin(3).unwrap().a_start, Position::new(1, 1));
        assert!(LevelConfig::builtin(99).is_none());
    }

    #[test]
    fn test_json_defaults() {
        let level = LevelConfig::from_json(
            r#"{"id": 42, "a_start": {"x": 0, "y": 0}, "b_start": {"x": 7, "y": 7}}"#,
        )
        .unwrap();
        assert_eq!(level.objective, Objective::Capture);
        assert_eq!(level.difficulty, Difficulty::Medium);
        assert!(level.initial_blocked.is_empty());
    }

    #[test]
    fn test_reach_goal_requires_goal() {
        let mut level = LevelConfig::free_play();
        level.objective = Objective::ReachGoal;
        assert!(matches!(level.validate(), Err(LevelError::MissingGoal)));
    }

    #[test]
    fn test_blocked_start_rejected() {
        let mut level = LevelConfig::free_play();
        level.initial_blocked.insert(level.b_start);
        assert!(matches!(level.validate(), Err(LevelError::BlockedStart(_))));
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("brutal".parse::<Difficulty>().is_err());
    }
}
