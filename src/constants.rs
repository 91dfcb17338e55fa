//! Constants for board geometry, pattern scores, and search parameters.
//!
//! The engine only plays on a fixed 15x15 board with five-in-a-row wins.
//! Cells are addressed row-major: index = y * N + x.

// =============================================================================
// Board Geometry
// =============================================================================

/// Board size (NxN).
pub const N: usize = 15;

/// Total number of cells on the board.
pub const BOARD_CELLS: usize = N * N;

/// Center coordinate; the first move of every game is forced here.
pub const CENTER: i8 = (N / 2) as i8;

/// Chebyshev radius around existing stones in which moves are candidates.
pub const LEGAL_RADIUS: i32 = 2;

/// Stones in a row needed to win. Longer runs also win.
pub const WIN_LENGTH: usize = 5;

/// Line directions as (dx, dy): horizontal, vertical, diagonal, anti-diagonal.
pub const DIRECTIONS: [(i32, i32); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

// =============================================================================
// Pattern Scores
// =============================================================================

/// Move completes five (or more) in a row.
pub const SCORE_WIN: i32 = 1_000_000;

/// Move makes four with both ends open.
pub const SCORE_FOUR_OPEN: i32 = 100_000;

/// Move makes four with one end open.
pub const SCORE_FOUR_CLOSED: i32 = 10_000;

/// Move makes an open three (or a broken three with an open end).
pub const SCORE_THREE_OPEN: i32 = 5_000;

/// Move makes a three with one end open.
pub const SCORE_THREE_CLOSED: i32 = 500;

/// Move makes an open two.
pub const SCORE_TWO_OPEN: i32 = 200;

/// Move makes a two with one end open.
pub const SCORE_TWO_CLOSED: i32 = 20;

/// Bonus per empty cell in the 5x5 neighborhood.
pub const SCORE_SPACE: i32 = 10;

/// Bonus per stone in the 5x5 neighborhood, scaled by (3 - distance).
pub const SCORE_CLUSTER: i32 = 10;

/// Multiplier applied to the defensive half of a move score.
pub const DEFENSE_WEIGHT: f64 = 1.1;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default UCT exploration constant.
pub const EXPLORATION_CONSTANT: f64 = 1.2;

/// Default iteration cap per search.
pub const MAX_ITERATIONS: usize = 10_000;

/// Default wall-clock cap per search, in milliseconds.
pub const MAX_TIME_MS: u64 = 1000;

/// Maximum plies played by a single rollout.
pub const ROLLOUT_MAX_PLIES: usize = 50;

/// Heuristic rollouts pick uniformly among this many top-ranked moves.
pub const ROLLOUT_TOP_N: usize = 3;

/// Above this many untried moves, expansion samples instead of picking uniformly.
pub const EXPAND_RANDOM_LIMIT: usize = 3;

/// Number of shuffled untried moves scored during biased expansion.
pub const EXPAND_SAMPLE: usize = 5;
