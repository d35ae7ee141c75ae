//! Output formatting utilities for CLI.

use knight_chase::tournament::{GameResult, TournamentStats};
use knight_chase::{GameEvent, LevelConfig, MatchSummary, Side, WinCause};
use serde::Serialize;
use std::fmt::Write as _;

/// JSON-serializable game result.
#[derive(Debug, Serialize)]
pub(super) struct JsonGameResult {
    /// Random seed used.
    pub(super) seed: u64,
    /// Winning side (null if the turn cap was hit).
    pub(super) winner: Option<Side>,
    /// How the game was won.
    pub(super) cause: Option<WinCause>,
    /// Total turns played.
    pub(super) turns_played: u32,
    /// Disruptions released by side A.
    pub(super) disruptions: u32,
}

impl JsonGameResult {
    /// Create from a GameResult.
    pub(super) fn from_game_result(result: &GameResult) -> Self {
        Self {
            seed: result.seed,
            winner: result.outcome.map(|(side, _)| side),
            cause: result.outcome.map(|(_, cause)| cause),
            turns_played: result.turns_played,
            disruptions: result.disruptions,
        }
    }
}

/// Format a game result as human-readable text.
pub(super) fn format_text(result: &GameResult) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Game Result (seed: {})", result.seed);
    match result.outcome {
        Some((winner, cause)) => {
            let _ = writeln!(output, "  Winner: {winner} ({cause})");
        }
        None => output.push_str("  Winner: none (turn cap)\n"),
    }
    let _ = writeln!(output, "  Turns: {}", result.turns_played);
    if result.disruptions > 0 {
        let _ = writeln!(output, "  Disruptions: {}", result.disruptions);
    }
    output
}

/// One line describing an engine event, or `None` for routine ones.
pub(super) fn describe_event(event: &GameEvent) -> Option<String> {
    let text = match *event {
        GameEvent::Moved { .. } | GameEvent::ChargeChanged { .. } => return None,
        GameEvent::PowerUpCollected { side, kind, at } => {
            format!("{side} opened the box at {at}: {kind}")
        }
        GameEvent::TeleportUsed { side } => format!("{side} teleported"),
        GameEvent::AreaCleared { center, cleared, .. } => {
            format!("{cleared} squares cleared around {center}")
        }
        GameEvent::OpponentSkipped { side } => format!("{side} moves again"),
        GameEvent::BoxSpawned { at } => format!("A mystery box appeared at {at}"),
        GameEvent::ArenaShrunk { ring, blocked } => {
            format!("The arena shrinks: ring {ring} closed ({blocked} squares)")
        }
        GameEvent::DisruptionReleased { at } => format!("Disruption! {at} is now blocked"),
        GameEvent::MatchEnded { winner, cause } => format!("{winner} wins ({cause})"),
    };
    Some(text)
}

/// Format a finished local match.
pub(super) fn format_summary(summary: &MatchSummary) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "Match over on level {}", summary.level);
    let _ = writeln!(output, "  Winner: {} ({})", summary.winner, summary.cause);
    let _ = writeln!(output, "  Turns: {}  A moves: {}", summary.turns, summary.a_moves);
    if summary.points > 0 {
        let _ = writeln!(output, "  Points: {}", summary.points);
    }
    output
}

/// Format the level table as text.
pub(super) fn format_levels(levels: &[LevelConfig]) -> String {
    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:>3}  {:<24} {:<26} {:<8} {:>7}  {:>5}",
        "id", "title", "objective", "ai", "blocked", "limit"
    );
    for level in levels {
        let objective = serde_json::to_value(level.objective)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default();
        let limit = level
            .move_limit
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        let _ = writeln!(
            output,
            "{:>3}  {:<24} {:<26} {:<8} {:>7}  {:>5}",
            level.id,
            level.title,
            objective,
            level.difficulty.to_string(),
            level.initial_blocked.len(),
            limit
        );
    }
    output
}

/// JSON-serializable tournament statistics.
#[derive(Debug, Serialize)]
pub(super) struct JsonTournamentResult {
    /// Total games played.
    games_played: u64,
    /// Wins by side A.
    a_wins: u64,
    /// Wins by side B.
    b_wins: u64,
    /// Games cut off by the turn cap.
    draws: u64,
    /// Side A win rate (0.0-1.0).
    a_win_rate: f64,
    /// Decided games per win cause.
    causes: Vec<JsonCause>,
    /// Average game length in turns.
    avg_turns: f64,
    /// Average disruptions per game.
    avg_disruptions: f64,
}

/// JSON-serializable win-cause count.
#[derive(Debug, Serialize)]
pub(super) struct JsonCause {
    cause: WinCause,
    games: u64,
}

impl JsonTournamentResult {
    /// Create from stats.
    pub(super) fn from_stats(stats: &TournamentStats) -> Self {
        Self {
            games_played: stats.games_played,
            a_wins: stats.a_wins,
            b_wins: stats.b_wins,
            draws: stats.draws,
            a_win_rate: stats.win_rate(Side::A),
            causes: sorted_causes(stats)
                .into_iter()
                .map(|(cause, games)| JsonCause { cause, games })
                .collect(),
            avg_turns: stats.avg_turns(),
            avg_disruptions: stats.avg_disruptions(),
        }
    }
}

fn sorted_causes(stats: &TournamentStats) -> Vec<(WinCause, u64)> {
    let mut causes: Vec<_> = stats.causes.iter().map(|(c, n)| (*c, *n)).collect();
    causes.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
    causes
}

/// Format tournament stats as human-readable text.
#[allow(clippy::cast_precision_loss)]
pub(super) fn format_tournament_text(stats: &TournamentStats) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Tournament Results ({} games)", stats.games_played);
    output.push_str("========================================\n\n");

    output.push_str("Win Rates:\n");
    for side in Side::BOTH {
        let _ = writeln!(
            output,
            "  Side {side}: {:.1}% ({} wins)",
            stats.win_rate(side) * 100.0,
            stats.wins(side)
        );
    }
    let draw_rate = if stats.games_played == 0 {
        0.0
    } else {
        stats.draws as f64 / stats.games_played as f64 * 100.0
    };
    let _ = writeln!(output, "  Draws: {} ({draw_rate:.1}%)\n", stats.draws);

    output.push_str("Win Causes:\n");
    for (cause, games) in sorted_causes(stats) {
        let _ = writeln!(output, "  {cause}: {games}");
    }

    let _ = writeln!(output, "\nAverage Game Length: {:.1} turns", stats.avg_turns());
    if stats.avg_disruptions() > 0.0 {
        let _ = writeln!(output, "Average Disruptions: {:.2}", stats.avg_disruptions());
    }
    output
}

/// Format tournament stats as CSV.
pub(super) fn format_tournament_csv(stats: &TournamentStats) -> String {
    let mut output = String::new();
    output.push_str("side,wins,win_rate,draws,avg_turns\n");
    for side in Side::BOTH {
        let _ = writeln!(
            output,
            "{side},{},{:.4},{},{:.2}",
            stats.wins(side),
            stats.win_rate(side),
            stats.draws,
            stats.avg_turns()
        );
    }
    output
}
