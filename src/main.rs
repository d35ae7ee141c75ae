//! Knight chase CLI - play, replay and benchmark knight chase matches.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use knight_chase::Difficulty;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Knight chase - a two-token knight-move pursuit game
#[derive(Parser, Debug)]
#[command(name = "knight-chase")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// More log output (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// List the built-in levels
    Levels {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Check a level file
    Validate {
        /// Level JSON file
        #[arg(required = true)]
        level: PathBuf,
    },

    /// Run a single computer-vs-computer game
    Run {
        #[command(flatten)]
        setup: cli::MatchArgs,

        /// Side A AI strength: easy, medium or hard
        #[arg(long, default_value = "medium")]
        a: Difficulty,

        /// Side B AI strength: easy, medium or hard
        #[arg(long, default_value = "medium")]
        b: Difficulty,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Turns before the game is called a draw
        #[arg(short = 't', long, default_value = "200")]
        max_turns: u32,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Save recording to file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Only print the result
        #[arg(short, long)]
        quiet: bool,
    },

    /// Play a local match in the terminal
    Play {
        #[command(flatten)]
        setup: cli::MatchArgs,

        /// Let the computer play B (default: hot-seat)
        #[arg(long)]
        ai: bool,

        /// Computer strength in free play; numbered levels use their own
        #[arg(long, requires = "ai")]
        difficulty: Option<Difficulty>,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Save the recording on exit
        #[arg(long)]
        save: Option<PathBuf>,

        /// Plain output without ANSI colours
        #[arg(long)]
        no_color: bool,

        /// Skip the computer's thinking pause
        #[arg(long)]
        no_delay: bool,
    },

    /// Replay a recorded match
    Replay {
        /// Recording file (.json)
        #[arg(required = true)]
        recording: PathBuf,

        /// Show the board after this many actions (default: the end)
        #[arg(long, conflicts_with = "all")]
        step: Option<usize>,

        /// Show the board after every action
        #[arg(long)]
        all: bool,

        /// Plain output without ANSI colours
        #[arg(long)]
        no_color: bool,
    },

    /// Run mass parallel games and aggregate statistics
    Tournament {
        #[command(flatten)]
        setup: cli::MatchArgs,

        /// Side A AI strength: easy, medium or hard
        #[arg(long, default_value = "medium")]
        a: Difficulty,

        /// Side B AI strength: easy, medium or hard
        #[arg(long, default_value = "medium")]
        b: Difficulty,

        /// Number of games to run (default: 1000)
        #[arg(short, long, default_value = "1000")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Turns before a game is called a draw
        #[arg(short = 't', long, default_value = "200")]
        max_turns: u32,

        /// Output format: text, json, or csv
        #[arg(short, long, default_value = "text")]
        format: cli::TournamentFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Run a relay server for online play
    Relay {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:7878")]
        listen: String,

        /// Reject state submissions not based on the room's current state
        #[arg(long)]
        strict: bool,
    },

    /// Play online through a relay
    Online {
        /// Relay address
        #[arg(long, default_value = "127.0.0.1:7878")]
        server: String,

        /// Open a room on connect
        #[arg(long, conflicts_with = "join")]
        create: bool,

        /// Join this room on connect
        #[arg(long)]
        join: Option<String>,

        #[command(flatten)]
        setup: cli::MatchArgs,

        /// Random seed (default: random)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Plain output without ANSI colours
        #[arg(long)]
        no_color: bool,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    let result = match args.command {
        Commands::Levels { format } => cli::levels::execute(format),

        Commands::Validate { level } => cli::validate::execute(level),

        Commands::Run {
            setup,
            a,
            b,
            seed,
            max_turns,
            format,
            save,
            quiet,
        } => cli::run::execute(&setup, a, b, seed, max_turns, format, save, quiet),

        Commands::Play {
            setup,
            ai,
            difficulty,
            seed,
            save,
            no_color,
            no_delay,
        } => {
            let opponent = if ai {
                cli::play::Opponent::Computer(difficulty)
            } else {
                cli::play::Opponent::Human
            };
            cli::play::execute(&setup, opponent, seed, save, no_color, no_delay)
        }

        Commands::Replay {
            recording,
            step,
            all,
            no_color,
        } => cli::replay::execute(recording, step, all, no_color),

        Commands::Tournament {
            setup,
            a,
            b,
            games,
            seed,
            threads,
            max_turns,
            format,
            progress,
        } => cli::tournament::execute(
            &setup, a, b, games, seed, threads, max_turns, format, progress,
        ),

        Commands::Relay { listen, strict } => cli::relay::execute(&listen, strict),

        Commands::Online {
            server,
            create,
            join,
            setup,
            seed,
            no_color,
        } => {
            let entry = match (create, join) {
                (_, Some(room)) => cli::online::Entry::Join(room),
                (true, None) => cli::online::Entry::Create,
                (false, None) => cli::online::Entry::Lobby,
            };
            cli::online::execute(&server, entry, &setup, seed, no_color)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
