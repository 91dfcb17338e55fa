//! UCI-style text protocol.
//!
//! One command per line on stdin, replies on stdout. Commands are
//! case-insensitive and blank lines are ignored. Commands that have nothing
//! to report produce no reply; failed commands reply with
//! `info string <reason>`.
//!
//! ## Supported Commands
//!
//! - `uci` - Identify the engine
//! - `isready` - Reply `readyok`
//! - `ucinewgame` - Clear the board
//! - `position startpos [moves m1 m2 ...]` - Set up a position
//! - `go [movetime ms] [nodes n] [depth d]` - Search and reply `bestmove <move>`
//! - `setoption name <name> value <value>` - Change a search setting
//! - `stop` - Accepted; searches always run to completion
//! - `d` / `display` - Show the board
//! - `perft <depth>` - Count candidate-move tree leaves
//! - `quit` / `exit` - Leave the command loop
//!
//! ## Example
//!
//! ```ignore
//! use gomoku_mcts::protocol::ProtocolEngine;
//! let mut engine = ProtocolEngine::new();
//! engine.run()?;
//! ```

use std::io::{self, BufRead, Write};

use anyhow::Context;
use log::{info, warn};
use thiserror::Error;

use crate::board::{Board, GameResult, Move};
use crate::mcts::{Mcts, MctsConfig};

/// Options accepted by `setoption`.
pub const OPTIONS: &[&str] = &[
    "exploration",
    "heuristic_rollouts",
    "iterations",
    "movetime",
    "random_rollouts",
    "seed",
];

/// Why a command could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("missing argument for {0}")]
    MissingArgument(&'static str),
    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: String, value: String },
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("unknown position type: {0}")]
    UnknownPosition(String),
}

fn parse_value<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, CommandError> {
    value.parse().map_err(|_| CommandError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(name: &str, value: &str) -> Result<bool, CommandError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "on" | "1" => Ok(true),
        "false" | "off" | "0" => Ok(false),
        _ => Err(CommandError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Protocol engine state.
pub struct ProtocolEngine {
    /// Current game position
    board: Board,
    /// Search driver, kept across commands
    mcts: Mcts,
    running: bool,
}

impl Default for ProtocolEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ProtocolEngine {
    /// Create an engine with default search settings.
    pub fn new() -> Self {
        Self::with_config(MctsConfig::default())
    }

    /// Create an engine with the given search settings.
    pub fn with_config(config: MctsConfig) -> Self {
        Self {
            board: Board::new(),
            mcts: Mcts::new(config),
            running: true,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mcts(&self) -> &Mcts {
        &self.mcts
    }

    /// False once `quit` has been received.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Run the command loop on stdin and stdout.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let stdout = io::stdout();
        self.run_with(stdin.lock(), stdout.lock())
    }

    /// Run the command loop until `quit` or end of input.
    pub fn run_with<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> anyhow::Result<()> {
        info!("protocol loop started");

        for line in input.lines() {
            let line = line.context("failed to read command")?;

            if let Some(reply) = self.process_command(&line) {
                writeln!(output, "{reply}").context("failed to write reply")?;
                output.flush().context("failed to flush reply")?;
            }

            if !self.running {
                break;
            }
        }

        info!("protocol loop finished");
        Ok(())
    }

    /// Handle one input line and return the reply, if any.
    pub fn process_command(&mut self, line: &str) -> Option<String> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let (command, args) = parts.split_first()?;
        let command = command.to_lowercase();

        match self.execute(&command, args) {
            Ok(reply) => reply,
            Err(err) => {
                warn!("{command}: {err}");
                Some(format!("info string {err}"))
            }
        }
    }

    /// Execute a command and return its reply.
    fn execute(&mut self, command: &str, args: &[&str]) -> Result<Option<String>, CommandError> {
        match command {
            "uci" => Ok(Some(format!(
                "id name Gomoku MCTS\nid author {}\nuciok",
                env!("CARGO_PKG_NAME")
            ))),

            "isready" => Ok(Some("readyok".to_string())),

            "ucinewgame" => {
                info!("new game");
                self.board.reset();
                Ok(None)
            }

            "position" => self.cmd_position(args).map(|()| None),

            "go" => self.cmd_go(args).map(Some),

            "setoption" => self.cmd_setoption(args).map(|()| None),

            "stop" => Ok(None),

            "d" | "display" => Ok(Some(self.display())),

            "perft" => {
                let depth = match args.first() {
                    Some(arg) => parse_value("perft", arg)?,
                    None => 1,
                };
                let nodes = self.board.perft(depth);
                Ok(Some(format!("perft {depth}: {nodes}")))
            }

            "quit" | "exit" => {
                self.running = false;
                Ok(None)
            }

            _ => Ok(None),
        }
    }

    fn cmd_position(&mut self, args: &[&str]) -> Result<(), CommandError> {
        let mut tokens = args.iter().copied();

        match tokens.next() {
            Some(kind) if kind.eq_ignore_ascii_case("startpos") => {
                self.board.reset();
                if !tokens.next().is_some_and(|t| t.eq_ignore_ascii_case("moves")) {
                    return Ok(());
                }
            }
            Some(kind) if kind.eq_ignore_ascii_case("fen") => {
                // Position strings are not supported; start from the empty board
                self.board.reset();
                if !tokens.any(|t| t.eq_ignore_ascii_case("moves")) {
                    return Ok(());
                }
            }
            Some(kind) if kind.eq_ignore_ascii_case("moves") => {}
            Some(kind) => return Err(CommandError::UnknownPosition(kind.to_string())),
            None => return Err(CommandError::MissingArgument("position")),
        }

        for token in tokens {
            match token.parse::<Move>() {
                Ok(mv) if !self.board.is_terminal() && self.board.is_legal(mv) => {
                    self.board.make_move(mv);
                }
                Ok(mv) => warn!("skipping illegal move {mv}"),
                Err(err) => warn!("skipping move: {err}"),
            }
        }
        Ok(())
    }

    fn cmd_go(&mut self, args: &[&str]) -> Result<String, CommandError> {
        let mut time_ms = self.mcts.config().max_time_ms;
        let mut tokens = args.iter().copied();

        while let Some(token) = tokens.next() {
            let key = token.to_lowercase();
            match key.as_str() {
                "movetime" | "nodes" | "depth" => {
                    let value = tokens.next().ok_or(CommandError::MissingArgument("go"))?;
                    let value: usize = parse_value(&key, value)?;
                    match key.as_str() {
                        "movetime" => time_ms = value as u64,
                        "nodes" => self.mcts.config_mut().max_iterations = value,
                        _ => {
                            let iterations = value.checked_mul(1000).ok_or_else(|| {
                                CommandError::InvalidValue {
                                    name: key.clone(),
                                    value: value.to_string(),
                                }
                            })?;
                            self.mcts.config_mut().max_iterations = iterations;
                        }
                    }
                }
                _ => {}
            }
        }

        let best = self.mcts.search_with_time_limit(&self.board, time_ms);
        info!(
            "go: {} after {} iterations",
            best,
            self.mcts.iterations()
        );
        Ok(format!("bestmove {}", best.to_string().to_lowercase()))
    }

    fn cmd_setoption(&mut self, args: &[&str]) -> Result<(), CommandError> {
        let name_pos = args
            .iter()
            .position(|t| t.eq_ignore_ascii_case("name"))
            .ok_or(CommandError::MissingArgument("setoption"))?;
        let value_pos = args
            .iter()
            .position(|t| t.eq_ignore_ascii_case("value"))
            .ok_or(CommandError::MissingArgument("setoption"))?;
        if value_pos <= name_pos + 1 || value_pos + 1 >= args.len() {
            return Err(CommandError::MissingArgument("setoption"));
        }

        let name = args[name_pos + 1..value_pos].join(" ").to_lowercase();
        let value = args[value_pos + 1..].join(" ");

        match name.as_str() {
            "exploration" => {
                let exploration: f64 = parse_value(&name, &value)?;
                if !exploration.is_finite() || exploration < 0.0 {
                    return Err(CommandError::InvalidValue { name, value });
                }
                self.mcts.config_mut().exploration_constant = exploration;
            }
            "iterations" => self.mcts.config_mut().max_iterations = parse_value(&name, &value)?,
            "movetime" => self.mcts.config_mut().max_time_ms = parse_value(&name, &value)?,
            "seed" => {
                let seed = parse_value(&name, &value)?;
                self.mcts.reseed(seed);
            }
            "heuristic_rollouts" => {
                self.mcts.config_mut().use_heuristic_rollouts = parse_flag(&name, &value)?;
            }
            "random_rollouts" => {
                self.mcts.config_mut().use_random_rollouts = parse_flag(&name, &value)?;
            }
            _ => return Err(CommandError::UnknownOption(name)),
        }

        info!("option {name} = {value}");
        Ok(())
    }

    fn display(&self) -> String {
        let mut out = self.board.to_string();
        out.push_str(&format!(
            "\nCurrent player: {}",
            self.board.current_player().name()
        ));
        out.push_str(&format!("\nMove count: {}", self.board.move_count()));

        let outcome = match self.board.result() {
            GameResult::BlackWin => Some("BLACK wins"),
            GameResult::WhiteWin => Some("WHITE wins"),
            GameResult::Draw => Some("Draw"),
            GameResult::Ongoing => None,
        };
        if let Some(outcome) = outcome.filter(|_| self.board.is_terminal()) {
            out.push_str(&format!("\nGame over: {outcome}"));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;

    fn engine() -> ProtocolEngine {
        ProtocolEngine::with_config(MctsConfig {
            seed: 7,
            max_iterations: 50,
            ..MctsConfig::default()
        })
    }

    #[test]
    fn test_uci_and_isready() {
        let mut engine = engine();
        let reply = engine.process_command("uci").unwrap();
        assert_eq!(reply, "id name Gomoku MCTS\nid author gomoku-mcts\nuciok");
        assert_eq!(engine.process_command("ISREADY").as_deref(), Some("readyok"));
    }

    #[test]
    fn test_blank_and_unknown_commands() {
        let mut engine = engine();
        assert_eq!(engine.process_command(""), None);
        assert_eq!(engine.process_command("   "), None);
        assert_eq!(engine.process_command("frobnicate 3"), None);
        assert_eq!(engine.process_command("stop"), None);
    }

    #[test]
    fn test_position_startpos_moves() {
        let mut engine = engine();
        assert_eq!(engine.process_command("position startpos moves h8 i9 7,9"), None);

        let board = engine.board();
        assert_eq!(board.move_count(), 3);
        assert_eq!(board.get(7, 7), Cell::Black);
        assert_eq!(board.get(8, 8), Cell::White);
        assert_eq!(board.get(7, 9), Cell::Black);
    }

    #[test]
    fn test_position_skips_bad_moves() {
        let mut engine = engine();
        // a1 is out of reach, z9 and xx are unparseable, h8 repeated is occupied
        engine.process_command("position startpos moves h8 a1 z9 xx h8 i8");

        let board = engine.board();
        assert_eq!(board.move_count(), 2);
        assert_eq!(board.get(8, 7), Cell::White);
    }

    #[test]
    fn test_position_resets_previous_game() {
        let mut engine = engine();
        engine.process_command("position startpos moves h8 i8");
        engine.process_command("position startpos");
        assert_eq!(engine.board().move_count(), 0);

        engine.process_command("position fen whatever moves h8");
        assert_eq!(engine.board().move_count(), 1);

        engine.process_command("ucinewgame");
        assert_eq!(engine.board().move_count(), 0);
    }

    #[test]
    fn test_position_errors() {
        let mut engine = engine();
        assert_eq!(
            engine.process_command("position").as_deref(),
            Some("info string missing argument for position")
        );
        assert_eq!(
            engine.process_command("position sideways").as_deref(),
            Some("info string unknown position type: sideways")
        );
    }

    #[test]
    fn test_go_finds_win() {
        let mut engine = engine();
        engine.process_command("position startpos moves h8 h9 i8 i9 j8 j9 k8 k9");
        let reply = engine.process_command("go movetime 5000").unwrap();
        assert_eq!(reply, "bestmove g8");
        // The board is left untouched
        assert_eq!(engine.board().move_count(), 8);
    }

    #[test]
    fn test_go_empty_board_and_limits() {
        let mut engine = engine();
        assert_eq!(engine.process_command("go").as_deref(), Some("bestmove h8"));

        engine.process_command("go nodes 20");
        assert_eq!(engine.mcts().config().max_iterations, 20);

        engine.process_command("go depth 2");
        assert_eq!(engine.mcts().config().max_iterations, 2000);

        assert_eq!(
            engine.process_command("go nodes lots").as_deref(),
            Some("info string invalid value \"lots\" for nodes")
        );
    }

    #[test]
    fn test_go_depth_overflow() {
        let mut engine = engine();
        engine.process_command("go nodes 20");

        let reply = engine.process_command("go depth 18446744073709551615");
        assert_eq!(
            reply.as_deref(),
            Some("info string invalid value \"18446744073709551615\" for depth")
        );
        assert_eq!(engine.mcts().config().max_iterations, 20);
        assert!(engine.is_running());
    }

    #[test]
    fn test_go_on_finished_game() {
        let mut engine = engine();
        engine.process_command("position startpos moves h8 h9 i8 i9 j8 j9 k8 k9 l8");
        assert!(engine.board().is_terminal());
        assert_eq!(engine.process_command("go").as_deref(), Some("bestmove none"));
    }

    #[test]
    fn test_setoption() {
        let mut engine = engine();
        engine.process_command("setoption name exploration value 0.5");
        engine.process_command("setoption name iterations value 123");
        engine.process_command("setoption name MoveTime value 250");
        engine.process_command("setoption name heuristic_rollouts value false");
        engine.process_command("setoption name random_rollouts value off");
        engine.process_command("setoption name seed value 99");

        let config = engine.mcts().config();
        assert_eq!(config.exploration_constant, 0.5);
        assert_eq!(config.max_iterations, 123);
        assert_eq!(config.max_time_ms, 250);
        assert!(!config.use_heuristic_rollouts);
        assert!(!config.use_random_rollouts);
        assert_eq!(config.seed, 99);
    }

    #[test]
    fn test_setoption_errors() {
        let mut engine = engine();
        assert_eq!(
            engine.process_command("setoption name colour value red").as_deref(),
            Some("info string unknown option: colour")
        );
        assert_eq!(
            engine.process_command("setoption name seed").as_deref(),
            Some("info string missing argument for setoption")
        );
        assert_eq!(
            engine.process_command("setoption name random_rollouts value maybe").as_deref(),
            Some("info string invalid value \"maybe\" for random_rollouts")
        );
    }

    #[test]
    fn test_setoption_rejects_bad_exploration() {
        let mut engine = engine();
        for bad in ["NaN", "inf", "-0.5"] {
            let reply = engine.process_command(&format!("setoption name exploration value {bad}"));
            assert_eq!(
                reply,
                Some(format!("info string invalid value {bad:?} for exploration"))
            );
        }
        assert_eq!(engine.mcts().config().exploration_constant, 1.2);

        assert_eq!(engine.process_command("setoption name exploration value 0"), None);
        assert_eq!(engine.mcts().config().exploration_constant, 0.0);
    }

    #[test]
    fn test_display() {
        let mut engine = engine();
        let reply = engine.process_command("d").unwrap();
        assert!(reply.starts_with("   A B C"));
        assert!(reply.contains("\nCurrent player: BLACK (X)"));
        assert!(reply.ends_with("\nMove count: 0"));

        engine.process_command("position startpos moves h8 h9 i8 i9 j8 j9 k8 k9 l8");
        let reply = engine.process_command("display").unwrap();
        assert!(reply.contains("Current player: WHITE (O)"));
        assert!(reply.contains("Move count: 9"));
        assert!(reply.ends_with("Game over: BLACK wins"));
    }

    #[test]
    fn test_perft() {
        let mut engine = engine();
        assert_eq!(engine.process_command("perft").as_deref(), Some("perft 1: 1"));
        assert_eq!(engine.process_command("perft 2").as_deref(), Some("perft 2: 24"));

        engine.process_command("position startpos moves h8");
        assert_eq!(engine.process_command("perft 1").as_deref(), Some("perft 1: 24"));
        assert_eq!(engine.board().move_count(), 1);
    }

    #[test]
    fn test_quit_stops_loop() {
        let mut engine = engine();
        let input = "uci\n\nisready\nquit\nisready\n";
        let mut output = Vec::new();
        engine.run_with(input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        assert_eq!(text, "id name Gomoku MCTS\nid author gomoku-mcts\nuciok\nreadyok\n");
        assert!(!engine.is_running());
    }

    #[test]
    fn test_exit_alias() {
        let mut engine = engine();
        assert_eq!(engine.process_command("exit"), None);
        assert!(!engine.is_running());
    }
}
