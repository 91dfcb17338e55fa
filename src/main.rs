//! Gomoku MCTS engine.
//!
//! ## Usage
//!
//! - `gomoku-mcts` - Start the text protocol on stdin/stdout
//! - `gomoku-mcts protocol` - Same as above
//! - `gomoku-mcts demo` - Watch the engine play itself

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use gomoku_mcts::demo::{DemoOptions, run_demo};
use gomoku_mcts::logging::init_logging;
use gomoku_mcts::protocol::ProtocolEngine;

/// Gomoku MCTS: a 15x15 five-in-a-row engine
#[derive(Parser)]
#[command(name = "gomoku-mcts")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level for stderr output (overridden by RUST_LOG)
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the UCI-style text protocol (the default)
    Protocol,
    /// Play a self-play demo game
    Demo(DemoArgs),
}

#[derive(Args)]
struct DemoArgs {
    /// Search time per move in milliseconds
    #[arg(long, default_value_t = 1000, value_parser = clap::value_parser!(u64).range(1..))]
    movetime: u64,

    /// Random seed (0 = time-derived)
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Pause between moves in milliseconds
    #[arg(long, default_value_t = 500)]
    pause_ms: u64,

    /// Transcript file (default: game_<unix-seconds>.txt)
    #[arg(long)]
    transcript: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = init_logging(&cli.log_level)?;

    match cli.command {
        Some(Commands::Demo(args)) => {
            let options = DemoOptions {
                movetime_ms: args.movetime,
                seed: args.seed,
                pause_ms: args.pause_ms,
                transcript: args.transcript,
            };
            run_demo(&options)?;
        }
        Some(Commands::Protocol) | None => {
            let mut engine = ProtocolEngine::new();
            engine.run()?;
        }
    }

    Ok(())
}
