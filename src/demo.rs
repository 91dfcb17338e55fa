//! Self-play demo game.
//!
//! The engine plays both sides from the empty board until the game ends,
//! printing the board after every move and saving a transcript file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use log::{info, warn};

use crate::board::{Board, Cell, GameResult, Move};
use crate::mcts::{Mcts, MctsConfig};

const RULE: &str = "----------------------------------------";
const BANNER: &str = "========================================";

/// Demo settings.
#[derive(Debug, Clone)]
pub struct DemoOptions {
    /// Search time per move
    pub movetime_ms: u64,
    /// Random seed; 0 picks a time-derived seed
    pub seed: u64,
    /// Pause after each move
    pub pause_ms: u64,
    /// Transcript file; defaults to `game_<unix-seconds>.txt`
    pub transcript: Option<PathBuf>,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            movetime_ms: 1000,
            seed: 0,
            pause_ms: 500,
            transcript: None,
        }
    }
}

/// One move of a finished demo game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DemoMove {
    /// 1-based move number
    pub number: usize,
    pub player: Cell,
    pub mv: Move,
    pub elapsed_ms: u128,
    pub iterations: usize,
}

/// A finished demo game.
#[derive(Debug, Clone)]
pub struct DemoGame {
    pub board: Board,
    pub moves: Vec<DemoMove>,
}

impl DemoGame {
    pub fn move_list(&self) -> String {
        format_move_list(self.moves.iter().map(|m| m.mv))
    }
}

/// Render moves as `1.H8 H9 2.I9 ...`.
pub fn format_move_list(moves: impl IntoIterator<Item = Move>) -> String {
    let mut out = String::new();
    for (i, mv) in moves.into_iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        if i % 2 == 0 {
            out.push_str(&format!("{}.", i / 2 + 1));
        }
        out.push_str(&mv.to_string());
    }
    out
}

/// Human-readable game outcome.
pub fn result_text(result: GameResult) -> &'static str {
    match result {
        GameResult::BlackWin => "BLACK (X) WINS!",
        GameResult::WhiteWin => "WHITE (O) WINS!",
        GameResult::Draw => "DRAW!",
        GameResult::Ongoing => "Unknown",
    }
}

/// Play a full self-play game, calling `on_move` after each move.
///
/// Stops early if the search ever fails to produce a move.
pub fn play_game<F>(config: MctsConfig, mut on_move: F) -> DemoGame
where
    F: FnMut(&Board, &DemoMove),
{
    let movetime_ms = config.max_time_ms;
    let mut mcts = Mcts::new(config);
    let mut board = Board::new();
    let mut moves = Vec::new();

    while !board.is_terminal() {
        let player = board.current_player();
        let start = Instant::now();
        let mv = mcts.search_with_time_limit(&board, movetime_ms);
        let elapsed_ms = start.elapsed().as_millis();

        if !board.is_legal(mv) {
            warn!("search returned no playable move at move {}", moves.len() + 1);
            break;
        }
        board.make_move(mv);

        let played = DemoMove {
            number: moves.len() + 1,
            player,
            mv,
            elapsed_ms,
            iterations: mcts.iterations(),
        };
        on_move(&board, &played);
        moves.push(played);
    }

    DemoGame { board, moves }
}

/// Write a game transcript.
pub fn write_transcript<W: Write>(
    mut out: W,
    game: &DemoGame,
    started: u64,
    movetime_ms: u64,
) -> io::Result<()> {
    writeln!(out, "{BANNER}")?;
    writeln!(out, "         GOMOKU GAME LOG")?;
    writeln!(out, "{BANNER}")?;
    writeln!(out, "Started: {started}")?;
    writeln!(out, "Search time: {movetime_ms}ms per move")?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;

    for m in &game.moves {
        writeln!(
            out,
            "Move {:>3}: {:>10} -> {} ({}ms)",
            m.number,
            m.player.name(),
            m.mv,
            m.elapsed_ms
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{RULE}")?;
    writeln!(out, "RESULT: {}", result_text(game.board.result()))?;
    writeln!(out, "Total moves: {}", game.moves.len())?;
    writeln!(out, "{RULE}")?;
    writeln!(out)?;
    writeln!(out, "Final position:")?;
    write!(out, "{}", game.board)?;
    writeln!(out)?;
    writeln!(out, "Move list: {}", game.move_list())?;
    out.flush()
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Play and display a demo game, then save its transcript.
///
/// Returns the transcript path.
pub fn run_demo(options: &DemoOptions) -> anyhow::Result<PathBuf> {
    let started = unix_seconds();
    let path = options
        .transcript
        .clone()
        .unwrap_or_else(|| PathBuf::from(format!("game_{started}.txt")));

    println!("=== Gomoku Demo Game ===");
    println!("Search time: {}ms per move", options.movetime_ms);
    println!("Game log: {}", path.display());
    println!("Press Ctrl+C to stop");
    println!();

    let config = MctsConfig {
        max_time_ms: options.movetime_ms,
        max_iterations: 100_000,
        seed: options.seed,
        ..MctsConfig::default()
    };
    info!("demo started: {config:?}");

    let pause = Duration::from_millis(options.pause_ms);
    let mut moves = Vec::new();
    let game = play_game(config, |board, played| {
        moves.push(played.mv);

        // Clear the screen and home the cursor
        print!("\x1b[2J\x1b[H");
        println!("=== Gomoku Demo Game ===");
        println!();
        print!("{board}");
        println!();
        println!(
            "Move {}: {} plays {} ({}ms, {} iterations)",
            played.number,
            played.player.name(),
            played.mv,
            played.elapsed_ms,
            played.iterations
        );
        println!();
        println!("Moves: {}", format_move_list(moves.iter().copied()));

        if !pause.is_zero() {
            thread::sleep(pause);
        }
    });

    println!();
    println!("{BANNER}");
    println!("GAME OVER: {}", result_text(game.board.result()));
    println!("Total moves: {}", game.moves.len());
    println!("{BANNER}");

    let file = File::create(&path)
        .with_context(|| format!("failed to create transcript {}", path.display()))?;
    write_transcript(BufWriter::new(file), &game, started, options.movetime_ms)
        .with_context(|| format!("failed to write transcript {}", path.display()))?;

    println!();
    println!("Game saved to: {}", path.display());
    info!("demo finished after {} moves", game.moves.len());
    Ok(path)
}
