//! Run command implementation.

use super::output::{JsonGameResult, format_text};
use super::{CliError, MatchArgs, OutputFormat, seed_or_clock};
use knight_chase::replay::{RenderOptions, ReplayEngine, render_ascii};
use knight_chase::tournament::{TournamentConfig, play_game};
use knight_chase::{Difficulty, Rules};
use std::path::PathBuf;

/// Execute the run command: one computer-vs-computer game.
///
/// # Errors
///
/// Returns an error if the level is invalid, the game fails to run or the
/// recording cannot be saved.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    setup: &MatchArgs,
    a_difficulty: Difficulty,
    b_difficulty: Difficulty,
    seed: Option<u64>,
    max_turns: u32,
    format: OutputFormat,
    save: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let seed = seed_or_clock(seed);
    let config = TournamentConfig {
        level: setup.level()?,
        modifiers: setup.modifiers(),
        a_difficulty,
        b_difficulty,
        max_turns,
    };

    if !quiet && format == OutputFormat::Text {
        println!("Running level {} with seed {seed}...", config.level.id);
        println!("A: {a_difficulty} AI   B: {b_difficulty} AI");
        println!();
    }

    let (result, recording) = play_game(seed, &config)?;

    if let Some(save_path) = save {
        recording
            .save(&save_path)
            .map_err(|e| CliError::new(format!("Failed to save recording: {e}")))?;
        if !quiet && format == OutputFormat::Text {
            println!("Recording saved to: {}", save_path.display());
            println!();
        }
    }

    match format {
        OutputFormat::Text => {
            if !quiet {
                let rules = Rules::new(&config.level, config.modifiers);
                let final_state = ReplayEngine::verify(recording)?;
                let options = RenderOptions {
                    hide_blocked: config.modifiers.fading_blocks,
                    show_moves: false,
                    ..RenderOptions::default()
                };
                print!("{}", render_ascii(&final_state, &rules, options));
                println!();
            }
            print!("{}", format_text(&result));
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonGameResult::from_game_result(&result))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }
    Ok(())
}
