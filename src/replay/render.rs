//! ASCII renderer for terminal viewing with ANSI colors.

use crate::game::{BOARD_SIZE, CHARGE_FULL, MatchState, Outcome, Position, Rules, Side};
use std::fmt::Write as _;

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const GRAY: &str = "\x1b[90m";

/// Knobs for [`render_ascii`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Emit ANSI colour codes.
    pub color: bool,
    /// Draw blocked squares like open ones (the fading-blocks modifier).
    pub hide_blocked: bool,
    /// Mark the legal moves of the side to move.
    pub show_moves: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: true,
            hide_blocked: false,
            show_moves: true,
        }
    }
}

/// Render a match state to ASCII.
///
/// Output format:
/// ```text
/// Turn 3   B to move   Charge 40/100
///     0 1 2 3 4 5 6 7
///   ┌─────────────────┐
/// 0 │ # . . . . . . . │
/// 1 │ . . # . . . . . │
/// 2 │ . A . . . . . . │
///   ...
///   └─────────────────┘
/// Legend: A B=tokens  #=blocked  ?=mystery box  *=goal  +=legal move
/// ```
#[must_use]
pub fn render_ascii(state: &MatchState, rules: &Rules, options: RenderOptions) -> String {
    let mut output = String::new();
    let paint = Painter(options.color);

    render_header(&mut output, state, rules);

    let moves = if options.show_moves && !state.is_over() {
        state.legal_moves_for(state.to_move)
    } else {
        Vec::new()
    };

    output.push_str("    ");
    for x in 0..BOARD_SIZE {
        let _ = write!(output, "{x} ");
    }
    output.push('\n');
    output.push_str("  ┌");
    for _ in 0..(BOARD_SIZE * 2 + 1) {
        output.push('─');
    }
    output.push_str("┐\n");

    for y in 0..BOARD_SIZE {
        let _ = write!(output, "{y} │ ");
        for x in 0..BOARD_SIZE {
            let pos = Position::new(x, y);
            output.push_str(&square(state, rules, options, &moves, pos, paint));
            output.push(' ');
        }
        output.push_str("│\n");
    }

    output.push_str("  └");
    for _ in 0..(BOARD_SIZE * 2 + 1) {
        output.push('─');
    }
    output.push_str("┘\n");

    output.push_str("Legend: A B=tokens  #=blocked  ?=mystery box  *=goal  +=legal move\n");
    render_status(&mut output, state, paint);
    output
}

#[derive(Clone, Copy)]
struct Painter(bool);

impl Painter {
    fn paint(self, color: &str, text: &str) -> String {
        if self.0 {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

fn side_color(side: Side) -> &'static str {
    match side {
        Side::A => RED,
        Side::B => BLUE,
    }
}

fn square(
    state: &MatchState,
    rules: &Rules,
    options: RenderOptions,
    moves: &[Position],
    pos: Position,
    paint: Painter,
) -> String {
    if pos == state.a && pos == state.b {
        return paint.paint(BOLD, "X");
    }
    for side in Side::BOTH {
        if pos == state.position(side) {
            let mark = if state.has_teleport(side) {
                side.to_string().to_lowercase()
            } else {
                side.to_string()
            };
            return paint.paint(side_color(side), &mark);
        }
    }
    if state.mystery_box == Some(pos) {
        return paint.paint(YELLOW, "?");
    }
    if moves.contains(&pos) {
        return paint.paint(GREEN, "+");
    }
    if state.blocked.contains(pos) && !options.hide_blocked {
        return paint.paint(GRAY, "#");
    }
    if rules.goal == Some(pos) {
        return paint.paint(YELLOW, "*");
    }
    ".".to_string()
}

fn render_header(output: &mut String, state: &MatchState, rules: &Rules) {
    let _ = write!(output, "Turn {}", state.turn);
    if let Some(limit) = rules.move_limit {
        let _ = write!(output, "   A moves {}/{limit}", state.a_moves);
    }
    if !state.is_over() {
        let _ = write!(output, "   {} to move", state.to_move);
    }
    if rules.modifiers.disruption_charge {
        let _ = write!(output, "   Charge {}/{CHARGE_FULL}", state.charge);
    }
    if let Some(power_up) = state.power_up {
        let _ = write!(output, "   {} holds {}", power_up.holder, power_up.kind);
    }
    output.push('\n');
}

fn render_status(output: &mut String, state: &MatchState, paint: Painter) {
    if let Outcome::Ended { winner, cause } = state.outcome {
        let text = format!("{winner} wins ({cause})");
        output.push_str(&paint.paint(side_color(winner), &text));
        output.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ModifierPolicy, WinCause};

    fn plain() -> RenderOptions {
        RenderOptions {
            color: false,
            hide_blocked: false,
            show_moves: false,
        }
    }

    #[test]
    fn test_render_free_play() {
        let output = render_ascii(&MatchState::free_play(), &Rules::free_play(), plain());
        assert!(output.contains("Turn 0"));
        assert!(output.contains("A to move"));
        assert!(output.contains("0 │ A . . . . . . . │"));
        assert!(output.contains("7 │ . . . . . . . B │"));
        assert!(output.contains("┘"));
        assert!(!output.contains('\x1b'));
    }

    #[test]
    fn test_render_blocked_and_fading() {
        let mut state = MatchState::free_play();
        state.blocked.insert(Position::new(3, 0));
        let shown = render_ascii(&state, &Rules::free_play(), plain());
        assert!(shown.contains("0 │ A . . # . . . . │"));

        let hidden = render_ascii(
            &state,
            &Rules::free_play(),
            RenderOptions {
                hide_blocked: true,
                ..plain()
            },
        );
        assert!(hidden.contains("0 │ A . . . . . . . │"));
    }

    #[test]
    fn test_render_moves_and_charge() {
        let rules = Rules {
            modifiers: ModifierPolicy {
                disruption_charge: true,
                ..ModifierPolicy::none()
            },
            ..Rules::free_play()
        };
        let output = render_ascii(
            &MatchState::free_play(),
            &rules,
            RenderOptions {
                show_moves: true,
                ..plain()
            },
        );
        assert!(output.contains("Charge 0/100"));
        assert!(output.contains("1 │ . . + . . . . . │"));
    }

    #[test]
    fn test_render_outcome() {
        let mut state = MatchState::free_play();
        state.outcome = Outcome::Ended {
            winner: Side::B,
            cause: WinCause::Trapped,
        };
        let output = render_ascii(&state, &Rules::free_play(), plain());
        assert!(output.contains("B wins (trapped)"));
        assert!(!output.contains("to move"));
    }
}
