//! Monte Carlo playouts (bounded game simulation).
//!
//! A playout plays moves from the given position until the game ends or
//! [`ROLLOUT_MAX_PLIES`] plies have been played, then scores the result from
//! the perspective of the player to move at the start:
//! - `1.0` = starting player won
//! - `-1.0` = starting player lost
//! - `0.0` = draw, or the ply limit was reached
//!
//! All randomness comes from the caller's generator so that a seeded search
//! is reproducible.

use fastrand::Rng;

use crate::board::{Board, Cell};
use crate::constants::{ROLLOUT_MAX_PLIES, ROLLOUT_TOP_N};
use crate::heuristic::Heuristic;

/// Play uniformly among the top [`ROLLOUT_TOP_N`] heuristic moves at each ply.
pub fn heuristic_playout(board: &mut Board, heuristic: &Heuristic, rng: &mut Rng) -> f64 {
    let start_player = board.current_player();

    for _ in 0..ROLLOUT_MAX_PLIES {
        if board.is_terminal() {
            break;
        }
        let scored = heuristic.scored_moves(board);
        if scored.is_empty() {
            break;
        }
        let top_n = scored.len().min(ROLLOUT_TOP_N);
        board.make_move(scored[rng.usize(..top_n)].mv);
    }

    outcome(board, start_player)
}

/// Play a uniformly random legal move at each ply.
pub fn random_playout(board: &mut Board, rng: &mut Rng) -> f64 {
    let start_player = board.current_player();

    for _ in 0..ROLLOUT_MAX_PLIES {
        if board.is_terminal() {
            break;
        }
        let moves = board.legal_moves();
        if moves.is_empty() {
            break;
        }
        board.make_move(moves[rng.usize(..moves.len())]);
    }

    outcome(board, start_player)
}

/// Score the final position for `start_player`.
fn outcome(board: &Board, start_player: Cell) -> f64 {
    match board.winner() {
        Cell::Empty => 0.0,
        winner if winner == start_player => 1.0,
        _ => -1.0,
    }
}
