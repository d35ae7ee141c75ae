//! Replay command implementation.

use super::CliError;
use knight_chase::replay::{Recording, RenderOptions, ReplayEngine};
use std::path::PathBuf;

/// Execute the replay command.
///
/// Prints the board at `step` (default: the end), or at every step with
/// `all`.
///
/// # Errors
///
/// Returns an error if the recording cannot be loaded or no longer replays.
pub(crate) fn execute(
    recording_path: PathBuf,
    step: Option<usize>,
    all: bool,
    no_color: bool,
) -> Result<(), CliError> {
    let recording = Recording::load(&recording_path).map_err(|e| {
        CliError::new(format!(
            "Failed to load recording {}: {e}",
            recording_path.display()
        ))
    })?;
    let options = RenderOptions {
        color: !no_color,
        hide_blocked: false,
        show_moves: false,
    };

    println!(
        "Level {} ({}), seed {}, {} actions",
        recording.level.id,
        recording.level.title,
        recording.seed,
        recording.actions.len()
    );
    println!();

    if all {
        let mut engine = ReplayEngine::new(recording)?;
        print_step(&engine, options);
        while !engine.is_finished() {
            engine.step_forward()?;
            print_step(&engine, options);
        }
        return Ok(());
    }

    let target = step.unwrap_or(recording.actions.len());
    let engine = ReplayEngine::new_at_step(recording, target)?;
    print_step(&engine, options);
    Ok(())
}

fn print_step(engine: &ReplayEngine, options: RenderOptions) {
    println!("--- step {}/{} ---", engine.step(), engine.len());
    if let Some(action) = engine
        .step()
        .checked_sub(1)
        .and_then(|i| engine.recording().actions.get(i))
    {
        println!("after {action:?}");
    }
    print!("{}", engine.render_ascii(options));
    println!();
}
