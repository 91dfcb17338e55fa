//! Gomoku MCTS: a five-in-a-row engine for the 15x15 board.
//!
//! Black moves first and always opens at the center. Candidate moves are the
//! empty cells within two steps of any stone. Five or more in a row wins.
//!
//! ## Modules
//!
//! - [`constants`] - Board dimensions, score tiers and search defaults
//! - [`bitboard`] - 225-bit cell masks
//! - [`board`] - Game state, move legality, win detection and undo
//! - [`heuristic`] - Pattern scoring and tactical move finders
//! - [`playout`] - Bounded heuristic and random game simulation
//! - [`mcts`] - Monte Carlo Tree Search with UCT
//! - [`protocol`] - UCI-style text protocol
//! - [`demo`] - Self-play demo with game transcripts
//! - [`logging`] - Logger setup
//!
//! ## Example
//!
//! ```
//! use gomoku_mcts::board::{Board, Move};
//! use gomoku_mcts::mcts::{Mcts, MctsConfig};
//!
//! // Create a new game
//! let mut board = Board::new();
//!
//! // Play the opening move
//! board.make_move(Move::new(7, 7));
//!
//! // Run MCTS to find the best response
//! let mut mcts = Mcts::new(MctsConfig {
//!     max_iterations: 100,
//!     seed: 42,
//!     ..MctsConfig::default()
//! });
//! let best = mcts.search(&board);
//! println!("Best move: {best}");
//! assert!(board.is_legal(best));
//! ```

pub mod bitboard;
pub mod board;
pub mod constants;
pub mod demo;
pub mod heuristic;
pub mod logging;
pub mod mcts;
pub mod playout;
pub mod protocol;
