//! CLI command implementations for knight chase.

pub(crate) mod levels;
pub(crate) mod online;
pub(crate) mod play;
pub(crate) mod relay;
pub(crate) mod replay;
pub(crate) mod run;
pub(crate) mod tournament;
pub(crate) mod validate;

mod output;

use clap::{Args, ValueEnum};
use knight_chase::{LevelConfig, ModifierPolicy, Position};
use std::error::Error;
use std::fmt;
use std::path::PathBuf;

/// Output format for the `run` and `levels` commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Output format for the `tournament` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum TournamentFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON output.
    Json,
    /// CSV format.
    Csv,
}

/// Level and modifier selection shared by every match-playing command.
#[derive(Debug, Clone, Args)]
pub(crate) struct MatchArgs {
    /// Built-in level id (see `levels`)
    #[arg(short, long, default_value = "0", conflicts_with = "level_file")]
    pub(crate) level: u32,

    /// Load the level from a JSON file instead
    #[arg(long)]
    pub(crate) level_file: Option<PathBuf>,

    /// Disable mystery boxes
    #[arg(long)]
    pub(crate) no_boxes: bool,

    /// Block one more outer ring every few turns
    #[arg(long)]
    pub(crate) shrink: bool,

    /// Let side A charge and release disruptions
    #[arg(long)]
    pub(crate) disruption: bool,

    /// Hide blocked squares on the board
    #[arg(long)]
    pub(crate) fading: bool,
}

impl MatchArgs {
    /// The selected level, validated.
    pub(crate) fn level(&self) -> Result<LevelConfig, CliError> {
        let level = match &self.level_file {
            Some(path) => LevelConfig::load(path)?,
            None => LevelConfig::builtin(self.level)
                .ok_or_else(|| CliError::new(format!("No built-in level {}", self.level)))?,
        };
        level.validate()?;
        Ok(level)
    }

    /// Modifier policy from the flags.
    pub(crate) fn modifiers(&self) -> ModifierPolicy {
        ModifierPolicy {
            mystery_boxes: !self.no_boxes,
            arena_shrink: self.shrink,
            disruption_charge: self.disruption,
            fading_blocks: self.fading,
        }
    }
}

/// Seed from the command line, or one derived from the clock.
pub(crate) fn seed_or_clock(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| {
        use std::time::{SystemTime, UNIX_EPOCH};
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| u64::try_from(d.as_nanos() & u128::from(u64::MAX)).unwrap_or(42))
            .unwrap_or(42)
    })
}

/// Parse `"x y"` or `"x,y"` into a board square.
pub(crate) fn parse_square(text: &str) -> Option<Position> {
    let mut parts = text
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty());
    let x = parts.next()?.parse::<i64>().ok()?;
    let y = parts.next()?.parse::<i64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Position::checked(x, y)
}

/// CLI error type.
#[derive(Debug)]
pub(crate) struct CliError {
    message: String,
}

impl CliError {
    /// Create a new CLI error.
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for CliError {}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}

impl From<knight_chase::LevelError> for CliError {
    fn from(e: knight_chase::LevelError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<knight_chase::tournament::TournamentError> for CliError {
    fn from(e: knight_chase::tournament::TournamentError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<knight_chase::replay::ReplayError> for CliError {
    fn from(e: knight_chase::replay::ReplayError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<knight_chase::online::ServerError> for CliError {
    fn from(e: knight_chase::online::ServerError) -> Self {
        Self::new(e.to_string())
    }
}

impl From<knight_chase::online::ConnectionError> for CliError {
    fn from(e: knight_chase::online::ConnectionError) -> Self {
        Self::new(e.to_string())
    }
}
