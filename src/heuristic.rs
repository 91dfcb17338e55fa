//! Static pattern-based move evaluation.
//!
//! Each candidate move is scored by looking along the four line directions
//! through the empty target cell:
//!
//! - **Offense**: the run the side to move would form by playing there.
//! - **Defense**: the run the opponent would form by playing there,
//!   weighted by [`DEFENSE_WEIGHT`] so that blocking is slightly preferred.
//! - **Clustering**: a bonus for nearby stones and open space in the 5x5
//!   neighborhood.
//!
//! Runs are classified by length and by how many ends are open, with a
//! correction for broken shapes such as `X_XX`.

use crate::board::{Board, Cell, Move, in_bounds};
use crate::constants::{
    DEFENSE_WEIGHT, DIRECTIONS, LEGAL_RADIUS, SCORE_CLUSTER, SCORE_FOUR_CLOSED, SCORE_FOUR_OPEN,
    SCORE_SPACE, SCORE_THREE_CLOSED, SCORE_THREE_OPEN, SCORE_TWO_CLOSED, SCORE_TWO_OPEN, SCORE_WIN,
};

/// A move with its heuristic score and tactical flags.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
    /// Playing here completes five for the side to move.
    pub is_winning: bool,
    /// Playing here stops the opponent from making at least an open four.
    pub is_blocking: bool,
}

impl ScoredMove {
    pub fn new(mv: Move, score: i32) -> Self {
        Self {
            mv,
            score,
            is_winning: false,
            is_blocking: false,
        }
    }

    /// Ranking key: winning, then blocking, then raw score.
    #[inline]
    pub fn rank(&self) -> (bool, bool, i32) {
        (self.is_winning, self.is_blocking, self.score)
    }
}

/// The move evaluator. Holds no board state.
#[derive(Copy, Clone, Debug, Default)]
pub struct Heuristic;

impl Heuristic {
    pub fn new() -> Self {
        Heuristic
    }

    /// Score the line through (x, y) along (dx, dy) as if `player` played there.
    pub fn evaluate_line(
        &self,
        board: &Board,
        x: i32,
        y: i32,
        dx: i32,
        dy: i32,
        player: Cell,
    ) -> i32 {
        let count_pos = board.run_length(x, y, dx, dy, player);
        let count_neg = board.run_length(x, y, -dx, -dy, player);
        let total = count_pos + count_neg;

        if total >= 4 {
            return SCORE_WIN;
        }

        // Cells just past each end of the run
        let (end_pos_x, end_pos_y) = (x + dx * (count_pos + 1), y + dy * (count_pos + 1));
        let (end_neg_x, end_neg_y) = (x - dx * (count_neg + 1), y - dy * (count_neg + 1));
        let open_pos = in_bounds(end_pos_x, end_pos_y) && board.is_empty(end_pos_x, end_pos_y);
        let open_neg = in_bounds(end_neg_x, end_neg_y) && board.is_empty(end_neg_x, end_neg_y);
        let openness = open_pos as i32 + open_neg as i32;

        // Stones of the same color beyond a single gap
        let gap_pos = if open_pos {
            board.run_length(end_pos_x, end_pos_y, dx, dy, player)
        } else {
            0
        };
        let gap_neg = if open_neg {
            board.run_length(end_neg_x, end_neg_y, -dx, -dy, player)
        } else {
            0
        };

        match total {
            3 => match openness {
                2 => SCORE_FOUR_OPEN,
                1 => SCORE_FOUR_CLOSED,
                _ => 0,
            },
            2 => {
                // Broken three such as X_XX is still a threat
                if (gap_pos >= 1 || gap_neg >= 1) && openness >= 1 {
                    return SCORE_THREE_OPEN;
                }
                match openness {
                    2 => SCORE_THREE_OPEN,
                    1 => SCORE_THREE_CLOSED,
                    _ => 0,
                }
            }
            1 => {
                if gap_pos >= 2 || gap_neg >= 2 {
                    return SCORE_THREE_CLOSED;
                }
                if (gap_pos >= 1 || gap_neg >= 1) && openness >= 1 {
                    return SCORE_TWO_OPEN;
                }
                match openness {
                    2 => SCORE_TWO_OPEN,
                    1 => SCORE_TWO_CLOSED,
                    _ => 0,
                }
            }
            // Isolated placements only earn the space bonus
            _ => 0,
        }
    }

    /// Bonus for stones and open space within Chebyshev distance 2 of `mv`.
    pub fn cluster_bonus(&self, board: &Board, mv: Move) -> i32 {
        let (mx, my) = (mv.x as i32, mv.y as i32);
        let mut bonus = 0;
        let mut empty_count = 0;

        for dx in -LEGAL_RADIUS..=LEGAL_RADIUS {
            for dy in -LEGAL_RADIUS..=LEGAL_RADIUS {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let (nx, ny) = (mx + dx, my + dy);
                if !in_bounds(nx, ny) {
                    continue;
                }
                if board.is_empty(nx, ny) {
                    empty_count += 1;
                } else {
                    let dist = dx.abs().max(dy.abs());
                    bonus += SCORE_CLUSTER * (3 - dist);
                }
            }
        }

        bonus + empty_count * SCORE_SPACE
    }

    /// Heuristic value of playing `mv` for the side to move.
    pub fn evaluate_move(&self, board: &Board, mv: Move) -> i32 {
        self.score_move(board, mv).score
    }

    /// Score `mv` and flag it as winning and/or blocking.
    pub fn score_move(&self, board: &Board, mv: Move) -> ScoredMove {
        let player = board.current_player();
        let opponent = player.opponent();
        let (x, y) = (mv.x as i32, mv.y as i32);

        let mut scored = ScoredMove::new(mv, 0);
        let mut offensive = 0;
        let mut defensive = 0;

        for &(dx, dy) in &DIRECTIONS {
            let off_score = self.evaluate_line(board, x, y, dx, dy, player);
            let def_score = self.evaluate_line(board, x, y, dx, dy, opponent);

            if off_score >= SCORE_WIN {
                scored.is_winning = true;
            }
            if def_score >= SCORE_FOUR_OPEN {
                scored.is_blocking = true;
            }

            offensive += off_score;
            defensive += def_score;
        }

        scored.score =
            offensive + (defensive as f64 * DEFENSE_WEIGHT) as i32 + self.cluster_bonus(board, mv);
        scored
    }

    /// Every legal move, best first.
    ///
    /// Ties keep row-major order.
    pub fn scored_moves(&self, board: &Board) -> Vec<ScoredMove> {
        let mut scored: Vec<ScoredMove> = board
            .legal_moves()
            .into_iter()
            .map(|mv| self.score_move(board, mv))
            .collect();
        scored.sort_by(|a, b| b.rank().cmp(&a.rank()));
        scored
    }

    /// First legal move that completes five for the side to move, or `Move::NONE`.
    pub fn find_winning_move(&self, board: &Board) -> Move {
        first_completing_move(board, board.current_player())
    }

    /// A move the side to move should play to stop the opponent.
    ///
    /// Prefers a cell that would complete five for the opponent; otherwise the
    /// cell where the opponent would make the strongest four (open four or
    /// better). Returns `Move::NONE` when there is nothing urgent.
    pub fn find_blocking_move(&self, board: &Board) -> Move {
        let opponent = board.current_player().opponent();

        let immediate = first_completing_move(board, opponent);
        if immediate.is_valid() {
            return immediate;
        }

        let mut best_block = Move::NONE;
        let mut best_threat = 0;
        for mv in board.legal_moves() {
            let (x, y) = (mv.x as i32, mv.y as i32);
            for &(dx, dy) in &DIRECTIONS {
                let threat = self.evaluate_line(board, x, y, dx, dy, opponent);
                if threat >= SCORE_FOUR_OPEN && threat > best_threat {
                    best_threat = threat;
                    best_block = mv;
                }
            }
        }
        best_block
    }
}

/// First legal move (row-major) where `player` would have five or more in a row.
fn first_completing_move(board: &Board, player: Cell) -> Move {
    board
        .legal_moves()
        .into_iter()
        .find(|mv| {
            let (x, y) = (mv.x as i32, mv.y as i32);
            DIRECTIONS.iter().any(|&(dx, dy)| {
                board.run_length(x, y, dx, dy, player) + board.run_length(x, y, -dx, -dy, player) >= 4
            })
        })
        .unwrap_or(Move::NONE)
}
