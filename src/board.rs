//! Gomoku board state and move execution.
//!
//! The board keeps a flat cell array alongside bit masks for occupancy,
//! per-color stones, and candidate moves. Candidate (legal) moves are empty
//! cells within Chebyshev distance [`LEGAL_RADIUS`] of any stone; the very
//! first move is forced to the center.
//!
//! Moves are not validated by [`Board::make_move`]. Callers check
//! [`Board::is_legal`] first.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::bitboard::BitBoard;
use crate::constants::{BOARD_CELLS, CENTER, DIRECTIONS, LEGAL_RADIUS, N, WIN_LENGTH};

/// Contents of a single cell, also used to name the players.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Black,
    White,
}

impl Cell {
    /// The other player. `Empty` maps to itself.
    #[inline]
    pub fn opponent(self) -> Cell {
        match self {
            Cell::Black => Cell::White,
            Cell::White => Cell::Black,
            Cell::Empty => Cell::Empty,
        }
    }

    /// Single-character board symbol.
    pub fn symbol(self) -> char {
        match self {
            Cell::Black => 'X',
            Cell::White => 'O',
            Cell::Empty => '.',
        }
    }

    /// Player name as shown in console output.
    pub fn name(self) -> &'static str {
        match self {
            Cell::Black => "BLACK (X)",
            Cell::White => "WHITE (O)",
            Cell::Empty => "NONE",
        }
    }
}

/// Returns true if (x, y) lies on the board.
#[inline]
pub fn in_bounds(x: i32, y: i32) -> bool {
    x >= 0 && x < N as i32 && y >= 0 && y < N as i32
}

#[inline]
fn to_index(x: i32, y: i32) -> usize {
    y as usize * N + x as usize
}

/// A board coordinate. Negative coordinates mean "no move".
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub x: i8,
    pub y: i8,
}

impl Move {
    /// The "no move" sentinel.
    pub const NONE: Move = Move { x: -1, y: -1 };

    /// Both coordinates must be on the board, or both negative for "no move".
    pub fn new(x: i32, y: i32) -> Self {
        debug_assert!(
            in_bounds(x, y) || (x < 0 && y < 0),
            "move ({x}, {y}) is off the board"
        );
        Self {
            x: x as i8,
            y: y as i8,
        }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.x >= 0 && self.y >= 0
    }

    /// Row-major cell index. Only meaningful for valid moves.
    #[inline]
    pub fn to_index(self) -> usize {
        to_index(self.x as i32, self.y as i32)
    }

    #[inline]
    pub fn from_index(idx: usize) -> Self {
        Self::new((idx % N) as i32, (idx / N) as i32)
    }
}

impl Default for Move {
    fn default() -> Self {
        Move::NONE
    }
}

/// Formats as column letter + 1-based row, e.g. `H8` for (7, 7).
impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return write!(f, "none");
        }
        let col = (b'A' + self.x as u8) as char;
        write!(f, "{col}{}", self.y as i32 + 1)
    }
}

/// Error returned when a move string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMoveError {
    #[error("empty move string")]
    Empty,
    #[error("invalid column in move {0:?}")]
    Column(String),
    #[error("invalid row in move {0:?}")]
    Row(String),
    #[error("move {0:?} is off the board")]
    OutOfRange(String),
}

/// Parses `h8` / `H8` (column letter, 1-based row) or `7,7` (0-based x,y).
impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();
        let Some(first) = chars.next() else {
            return Err(ParseMoveError::Empty);
        };

        let (x, y) = if let Some((xs, ys)) = s.split_once(',') {
            let x = xs
                .trim()
                .parse::<i32>()
                .map_err(|_| ParseMoveError::Column(s.to_string()))?;
            let y = ys
                .trim()
                .parse::<i32>()
                .map_err(|_| ParseMoveError::Row(s.to_string()))?;
            (x, y)
        } else if first.is_ascii_alphabetic() {
            let x = (first.to_ascii_lowercase() as u8 - b'a') as i32;
            let row = chars
                .as_str()
                .parse::<i32>()
                .map_err(|_| ParseMoveError::Row(s.to_string()))?;
            (x, row - 1)
        } else {
            return Err(ParseMoveError::Column(s.to_string()));
        };

        if !in_bounds(x, y) {
            return Err(ParseMoveError::OutOfRange(s.to_string()));
        }
        Ok(Move::new(x, y))
    }
}

/// Outcome of the game so far.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum GameResult {
    #[default]
    Ongoing,
    BlackWin,
    WhiteWin,
    Draw,
}

/// The authoritative game state.
#[derive(Clone, Debug)]
pub struct Board {
    cells: [Cell; BOARD_CELLS],
    occupied: BitBoard,
    black: BitBoard,
    white: BitBoard,
    legal: BitBoard,
    current: Cell,
    terminal: bool,
    result: GameResult,
    history: Vec<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_CELLS],
            occupied: BitBoard::new(),
            black: BitBoard::new(),
            white: BitBoard::new(),
            legal: BitBoard::new(),
            current: Cell::Black,
            terminal: false,
            result: GameResult::Ongoing,
            history: Vec::with_capacity(BOARD_CELLS),
        }
    }

    /// Return to the empty board with Black to move.
    pub fn reset(&mut self) {
        self.cells.fill(Cell::Empty);
        self.occupied.reset();
        self.black.reset();
        self.white.reset();
        self.legal.reset();
        self.current = Cell::Black;
        self.terminal = false;
        self.result = GameResult::Ongoing;
        self.history.clear();
    }

    /// Place a stone for the side to move.
    ///
    /// The target must be an empty, in-bounds cell the caller has checked
    /// with [`Board::is_legal`], and the position must not be terminal.
    pub fn make_move(&mut self, mv: Move) {
        let idx = mv.to_index();

        self.cells[idx] = self.current;
        self.occupied.set(idx);
        match self.current {
            Cell::Black => self.black.set(idx),
            _ => self.white.set(idx),
        }

        // The first stone replaces any candidate set left over from undo
        if self.history.is_empty() {
            self.legal.reset();
            self.legal.set(idx);
        }
        self.add_neighborhood(mv);
        self.legal.clear(idx);

        self.history.push(mv);

        if self.check_win(mv) {
            self.terminal = true;
            self.result = match self.current {
                Cell::Black => GameResult::BlackWin,
                _ => GameResult::WhiteWin,
            };
        } else if self.legal.is_empty() {
            self.terminal = true;
            self.result = GameResult::Draw;
        }

        self.current = self.current.opponent();
    }

    /// Place a stone at (x, y) for the side to move. See [`Board::make_move`].
    pub fn play(&mut self, x: i32, y: i32) {
        self.make_move(Move::new(x, y));
    }

    /// Undo the most recent move. `mv` must be that move.
    ///
    /// Does nothing when no moves have been played. The candidate mask is
    /// rebuilt from the whole history because a cell may be supported by
    /// several stones.
    pub fn unmake_move(&mut self, mv: Move) {
        if self.history.is_empty() {
            return;
        }

        self.current = self.current.opponent();

        let idx = mv.to_index();
        self.cells[idx] = Cell::Empty;
        self.occupied.clear(idx);
        self.black.clear(idx);
        self.white.clear(idx);

        self.terminal = false;
        self.result = GameResult::Ongoing;

        self.history.pop();

        self.legal.reset();
        if self.history.is_empty() {
            self.legal.set(to_index(CENTER as i32, CENTER as i32));
        } else {
            let history = std::mem::take(&mut self.history);
            for &m in &history {
                self.add_neighborhood(m);
            }
            self.history = history;
        }
    }

    /// Mark every empty cell within the legal radius of `mv` as a candidate.
    fn add_neighborhood(&mut self, mv: Move) {
        let (mx, my) = (mv.x as i32, mv.y as i32);
        for dy in -LEGAL_RADIUS..=LEGAL_RADIUS {
            for dx in -LEGAL_RADIUS..=LEGAL_RADIUS {
                let (nx, ny) = (mx + dx, my + dy);
                if in_bounds(nx, ny) && !self.occupied.get(to_index(nx, ny)) {
                    self.legal.set(to_index(nx, ny));
                }
            }
        }
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Cell {
        self.cells[to_index(x, y)]
    }

    #[inline]
    pub fn get_index(&self, idx: usize) -> Cell {
        self.cells[idx]
    }

    #[inline]
    pub fn is_empty(&self, x: i32, y: i32) -> bool {
        self.get(x, y) == Cell::Empty
    }

    /// Whether a stone may be placed at (x, y).
    ///
    /// On the empty board every cell passes this check even though
    /// [`Board::legal_moves`] only offers the center.
    pub fn is_legal_at(&self, x: i32, y: i32) -> bool {
        if !in_bounds(x, y) {
            return false;
        }
        if self.history.is_empty() {
            return self.is_empty(x, y);
        }
        let idx = to_index(x, y);
        self.legal.get(idx) && !self.occupied.get(idx)
    }

    pub fn is_legal(&self, mv: Move) -> bool {
        self.is_legal_at(mv.x as i32, mv.y as i32)
    }

    /// Candidate moves in row-major order. The empty board yields only the center.
    pub fn legal_moves(&self) -> Vec<Move> {
        if self.history.is_empty() {
            return vec![Move::new(CENTER as i32, CENTER as i32)];
        }
        self.legal.iter_ones().map(Move::from_index).collect()
    }

    pub fn count_legal_moves(&self) -> usize {
        if self.history.is_empty() {
            return 1;
        }
        self.legal.count()
    }

    #[inline]
    pub fn current_player(&self) -> Cell {
        self.current
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    #[inline]
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// The winning color, or `Cell::Empty` if the game is ongoing or drawn.
    pub fn winner(&self) -> Cell {
        match self.result {
            GameResult::BlackWin => Cell::Black,
            GameResult::WhiteWin => Cell::White,
            _ => Cell::Empty,
        }
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    #[inline]
    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn occupied_mask(&self) -> BitBoard {
        self.occupied
    }

    pub fn black_mask(&self) -> BitBoard {
        self.black
    }

    pub fn white_mask(&self) -> BitBoard {
        self.white
    }

    pub fn legal_mask(&self) -> BitBoard {
        self.legal
    }

    /// Count `player` stones starting one step from (x, y) along (dx, dy).
    ///
    /// The cell (x, y) itself is not counted.
    pub fn run_length(&self, x: i32, y: i32, dx: i32, dy: i32, player: Cell) -> i32 {
        let mut count = 0;
        let (mut nx, mut ny) = (x + dx, y + dy);
        while in_bounds(nx, ny) && self.get(nx, ny) == player {
            count += 1;
            nx += dx;
            ny += dy;
        }
        count
    }

    /// Whether the stone at `mv` is part of a run of at least five.
    fn check_win(&self, mv: Move) -> bool {
        let (x, y) = (mv.x as i32, mv.y as i32);
        let player = self.get(x, y);

        DIRECTIONS.iter().any(|&(dx, dy)| {
            let count = 1
                + self.run_length(x, y, dx, dy, player)
                + self.run_length(x, y, -dx, -dy, player);
            count >= WIN_LENGTH as i32
        })
    }

    /// Count the leaf nodes of the candidate-move tree `depth` plies deep.
    pub fn perft(&self, depth: usize) -> u64 {
        fn walk(board: &mut Board, depth: usize) -> u64 {
            if depth == 0 {
                return 1;
            }
            if board.is_terminal() {
                return 0;
            }
            let mut nodes = 0;
            for mv in board.legal_moves() {
                board.make_move(mv);
                nodes += walk(board, depth - 1);
                board.unmake_move(mv);
            }
            nodes
        }

        let mut board = self.clone();
        walk(&mut board, depth)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "   ")?;
        for x in 0..N {
            write!(f, "{} ", (b'A' + x as u8) as char)?;
        }
        writeln!(f)?;

        for y in 0..N {
            write!(f, "{:>2} ", y + 1)?;
            for x in 0..N {
                write!(f, "{} ", self.cells[y * N + x].symbol())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
