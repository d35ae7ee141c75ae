//! Tournament command implementation.

use super::output::{JsonTournamentResult, format_tournament_csv, format_tournament_text};
use super::{CliError, MatchArgs, TournamentFormat, seed_or_clock};
use indicatif::{ProgressBar, ProgressStyle};
use knight_chase::Difficulty;
use knight_chase::tournament::{TournamentConfig, run_tournament_with};
use std::time::Instant;

/// Execute the tournament command.
///
/// # Errors
///
/// Returns an error if the level is invalid or any game fails.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    setup: &MatchArgs,
    a_difficulty: Difficulty,
    b_difficulty: Difficulty,
    games: u64,
    seed: Option<u64>,
    threads: Option<usize>,
    max_turns: u32,
    format: TournamentFormat,
    progress: bool,
) -> Result<(), CliError> {
    let config = TournamentConfig {
        level: setup.level()?,
        modifiers: setup.modifiers(),
        a_difficulty,
        b_difficulty,
        max_turns,
    };

    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed_or_clock(seed);

    let pb = if progress {
        let pb = ProgressBar::new(games);
        let style = ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} games ({per_sec})",
            )
            .map_err(|e| CliError::new(format!("Invalid progress template: {e}")))?
            .progress_chars("=>-");
        pb.set_style(style);
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    let stats = run_tournament_with(&config, games, base_seed, |_| {
        if let Some(pb) = &pb {
            pb.inc(1);
        }
    })?;

    if let Some(pb) = pb {
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();
    #[allow(clippy::cast_precision_loss)]
    let games_per_sec = if duration.as_secs_f64() > 0.0 {
        stats.games_played as f64 / duration.as_secs_f64()
    } else {
        0.0
    };

    match format {
        TournamentFormat::Text => {
            println!();
            println!(
                "Level {} | A: {a_difficulty} AI vs B: {b_difficulty} AI | seeds from {base_seed}",
                config.level.id
            );
            print!("{}", format_tournament_text(&stats));
            println!();
            println!(
                "Duration: {:.2}s ({games_per_sec:.0} games/sec)",
                duration.as_secs_f64()
            );
        }
        TournamentFormat::Json => {
            let json = serde_json::to_string_pretty(&JsonTournamentResult::from_stats(&stats))
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
        TournamentFormat::Csv => {
            print!("{}", format_tournament_csv(&stats));
        }
    }

    Ok(())
}
