//! Fixed-size cell masks for the 15x15 board.
//!
//! 225 cells fit in four `u64` words (256 bits). Bits above `BOARD_CELLS`
//! are never set.

use std::ops::{BitAnd, BitOr};

use crate::constants::BOARD_CELLS;

const WORDS: usize = BOARD_CELLS.div_ceil(64);

/// A set of board cells, indexed row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitBoard {
    bits: [u64; WORDS],
}

impl BitBoard {
    /// Create an empty mask.
    pub const fn new() -> Self {
        Self { bits: [0; WORDS] }
    }

    #[inline]
    pub fn set(&mut self, idx: usize) {
        debug_assert!(idx < BOARD_CELLS);
        self.bits[idx / 64] |= 1u64 << (idx % 64);
    }

    #[inline]
    pub fn clear(&mut self, idx: usize) {
        debug_assert!(idx < BOARD_CELLS);
        self.bits[idx / 64] &= !(1u64 << (idx % 64));
    }

    #[inline]
    pub fn get(&self, idx: usize) -> bool {
        debug_assert!(idx < BOARD_CELLS);
        (self.bits[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Clear every bit.
    #[inline]
    pub fn reset(&mut self) {
        self.bits = [0; WORDS];
    }

    /// Number of set bits.
    #[inline]
    pub fn count(&self) -> usize {
        self.bits.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|&w| w == 0)
    }

    /// Iterate over set cell indices in ascending (row-major) order.
    pub fn iter_ones(&self) -> BitBoardIter {
        BitBoardIter {
            bits: self.bits,
            word_idx: 0,
        }
    }
}

impl BitOr for BitBoard {
    type Output = BitBoard;

    fn bitor(self, rhs: BitBoard) -> BitBoard {
        BitBoard {
            bits: std::array::from_fn(|i| self.bits[i] | rhs.bits[i]),
        }
    }
}

impl BitAnd for BitBoard {
    type Output = BitBoard;

    fn bitand(self, rhs: BitBoard) -> BitBoard {
        BitBoard {
            bits: std::array::from_fn(|i| self.bits[i] & rhs.bits[i]),
        }
    }
}

/// Iterator over the set bits of a [`BitBoard`].
pub struct BitBoardIter {
    bits: [u64; WORDS],
    word_idx: usize,
}

impl Iterator for BitBoardIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        while self.word_idx < WORDS {
            let word = self.bits[self.word_idx];
            if word != 0 {
                let bit = word.trailing_zeros() as usize;
                // Drop the lowest set bit
                self.bits[self.word_idx] = word & (word - 1);
                return Some(self.word_idx * 64 + bit);
            }
            self.word_idx += 1;
        }
        None
    }
}
