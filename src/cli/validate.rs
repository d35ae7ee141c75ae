//! Level validation command implementation.

use super::CliError;
use knight_chase::LevelConfig;
use knight_chase::game::legal_moves;
use std::path::PathBuf;

/// Execute the validate command.
///
/// # Errors
///
/// Returns an error if the level file cannot be read or is not playable.
pub(crate) fn execute(path: PathBuf) -> Result<(), CliError> {
    println!("Validating: {}", path.display());
    println!();

    let level = LevelConfig::load(&path);
    print_check("Level JSON", level.is_ok());
    let level = level?;

    let checked = level.validate();
    print_check("Start, goal and limit", checked.is_ok());
    checked?;

    let blocked = level.initial_blocked;
    let a_open = !legal_moves(level.a_start, blocked, false).is_empty();
    let b_open = !legal_moves(level.b_start, blocked, false).is_empty();
    print_check("Side A has an opening move", a_open);
    print_check("Side B has a reply", b_open);

    println!();
    println!("Summary:");
    println!("  Id:        {}", level.id);
    println!("  Title:     {}", level.title);
    println!("  Starts:    A {}  B {}", level.a_start, level.b_start);
    println!("  Blocked:   {} squares", blocked.len());
    if let Some(goal) = level.goal {
        println!("  Goal:      {goal}");
    }
    if let Some(limit) = level.move_limit {
        println!("  Limit:     {limit} moves");
    }
    println!("  AI:        {}", level.difficulty);

    if !a_open {
        return Err(CliError::new("Side A is trapped before the first move"));
    }

    println!();
    println!("Validation successful!");
    Ok(())
}

fn print_check(name: &str, ok: bool) {
    let status = if ok { "OK" } else { "FAILED" };
    let symbol = if ok { "✓" } else { "✗" };
    println!("  {symbol} {name}: {status}");
}
