//! Play command implementation: local hot-seat or versus-computer matches.

use super::output::{describe_event, format_summary};
use super::{CliError, MatchArgs, parse_square, seed_or_clock};
use knight_chase::game::AI_THINK_DELAY;
use knight_chase::replay::{RenderOptions, render_ascii};
use knight_chase::{Difficulty, GameEvent, Mode, Session};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const HELP: &str = "\
Commands:
  x y        move the side to move to square (x, y), e.g. `1 2`
  d          release the disruption charge (side A, when full)
  r          restart the level
  h          show this help
  q          quit";

/// Who plays side B.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Opponent {
    /// A second person at the same terminal.
    Human,
    /// The computer, at the requested strength if the level allows one.
    Computer(Option<Difficulty>),
}

/// Execute the play command.
///
/// # Errors
///
/// Returns an error if the level is invalid, stdin fails or the recording
/// cannot be saved.
pub(crate) fn execute(
    setup: &MatchArgs,
    opponent: Opponent,
    seed: Option<u64>,
    save: Option<PathBuf>,
    no_color: bool,
    no_delay: bool,
) -> Result<(), CliError> {
    let level = setup.level()?;
    let modifiers = setup.modifiers();
    let mode = match opponent {
        Opponent::Human => Mode::HotSeat,
        Opponent::Computer(requested) => Mode::versus_ai_on(&level, requested),
    };
    let overridden = matches!(
        (opponent, mode),
        (Opponent::Computer(Some(requested)), Mode::VersusAi { difficulty }) if requested != difficulty
    );
    if overridden {
        println!("Level {} is played at {}", level.id, level.difficulty);
    }
    let mut session = Session::new(level, modifiers, mode, seed_or_clock(seed));
    let options = RenderOptions {
        color: !no_color,
        hide_blocked: modifiers.fading_blocks,
        show_moves: true,
    };

    println!("Level {}: {}", session.level().id, session.level().title);
    println!("{HELP}");
    println!();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", render_ascii(session.state(), session.rules(), options));

        if session.ai_to_move() {
            if !no_delay {
                std::thread::sleep(AI_THINK_DELAY);
            }
            let events = session
                .ai_move()
                .map_err(|e| CliError::new(format!("Computer move failed: {e}")))?;
            print_events(&events.unwrap_or_default());
            continue;
        }

        if let Some(summary) = session.summary() {
            print!("{}", format_summary(&summary));
            print!("[r]estart or [q]uit > ");
        } else {
            print!("{} > ", session.state().to_move);
        }
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            break;
        };
        match line.trim() {
            "q" | "quit" => break,
            "h" | "help" => println!("{HELP}"),
            "r" | "restart" => session.reset(),
            "d" | "disrupt" => match session.disrupt() {
                Ok(events) => print_events(&events),
                Err(e) => println!("No disruption: {e}"),
            },
            text => match parse_square(text) {
                Some(target) => match session.play(target) {
                    Ok(events) => print_events(&events),
                    Err(e) => println!("Move declined: {e}"),
                },
                None if text.is_empty() => {}
                None => println!("Unknown command `{text}` (h for help)"),
            },
        }
        println!();
    }

    if let Some(path) = save {
        session.recording().save(&path)?;
        println!("Recording saved to: {}", path.display());
    }
    Ok(())
}

fn print_events(events: &[GameEvent]) {
    for line in events.iter().filter_map(describe_event) {
        println!("* {line}");
    }
}
