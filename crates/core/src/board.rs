//! Board module - the playfield grid and its pure transformations
//!
//! The board is a 10x20 grid of binary cells (0 = empty, 1 = filled).
//! Coordinates are (row, col) with row 0 at the top. Every operation here takes
//! a board by reference and returns a new value; nothing is mutated in place,
//! so the session can swap whole boards atomically.

use arrayvec::ArrayVec;

use crate::pieces::Piece;
use crate::types::{Cell, Position, BOARD_HEIGHT, BOARD_WIDTH, EMPTY, FILLED};

/// Row-major cell storage, always exactly `BOARD_HEIGHT` x `BOARD_WIDTH`
pub type Grid = [[Cell; BOARD_WIDTH]; BOARD_HEIGHT];

/// Row indices of cleared lines, top to bottom
pub type ClearedRows = ArrayVec<usize, BOARD_HEIGHT>;

/// The game board - 10 columns x 20 rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Board {
    rows: Grid,
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            rows: [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
        }
    }

    /// Wrap an existing grid
    pub fn from_rows(rows: Grid) -> Self {
        Self { rows }
    }

    /// Borrow the grid
    pub fn rows(&self) -> &Grid {
        &self.rows
    }

    /// Get cell at (row, col), or None if out of bounds
    pub fn get(&self, row: i32, col: i32) -> Option<Cell> {
        if Self::in_bounds(row, col) {
            Some(self.rows[row as usize][col as usize])
        } else {
            None
        }
    }

    /// Cell at an index the caller has already bounds-checked
    #[inline]
    pub fn cell(&self, row: usize, col: usize) -> Cell {
        debug_assert!(
            row < BOARD_HEIGHT && col < BOARD_WIDTH,
            "board access out of bounds: ({}, {})",
            row,
            col
        );
        self.rows[row][col]
    }

    /// Whether (row, col) lies inside the grid
    #[inline]
    pub fn in_bounds(row: i32, col: i32) -> bool {
        row >= 0 && row < BOARD_HEIGHT as i32 && col >= 0 && col < BOARD_WIDTH as i32
    }

    /// Check if position is within bounds and empty
    pub fn is_free(&self, row: i32, col: i32) -> bool {
        matches!(self.get(row, col), Some(EMPTY))
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, row: usize) -> bool {
        row < BOARD_HEIGHT && self.rows[row].iter().all(|&c| c == FILLED)
    }

    /// Indices of every full row, top to bottom
    pub fn full_rows(&self) -> ClearedRows {
        (0..BOARD_HEIGHT).filter(|&r| self.is_row_full(r)).collect()
    }

    /// Number of filled cells
    pub fn filled_count(&self) -> usize {
        self.rows.iter().flatten().filter(|&&c| c == FILLED).count()
    }

    /// Board with the given cells filled; out-of-range cells are ignored
    pub fn with_filled(&self, cells: &[(i32, i32)]) -> Self {
        let mut rows = self.rows;
        for &(r, c) in cells {
            if Self::in_bounds(r, c) {
                rows[r as usize][c as usize] = FILLED;
            }
        }
        Self { rows }
    }

    /// Board with every cell of `row` filled
    pub fn with_full_row(&self, row: usize) -> Self {
        let mut rows = self.rows;
        if row < BOARD_HEIGHT {
            rows[row] = [FILLED; BOARD_WIDTH];
        }
        Self { rows }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of removing full rows from a board
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClearResult {
    /// Collapsed board, still exactly `BOARD_HEIGHT` rows
    pub board: Board,
    pub lines_cleared: u32,
    /// Pre-clear indices of the removed rows, top to bottom
    pub cleared_rows: ClearedRows,
}

/// An empty HEIGHT x WIDTH board
pub fn empty_board() -> Board {
    Board::new()
}

/// Whether `piece` can occupy `position` on `board`.
///
/// Only filled shape cells are checked, so the empty margin of a shape may
/// hang past the board edge.
pub fn is_valid_move(board: &Board, piece: &Piece, position: Position) -> bool {
    piece.shape.filled().all(|(r, c)| {
        board.is_free(position.row + r as i32, position.col + c as i32)
    })
}

/// Board with every in-bounds filled cell of `piece` at `position` set.
///
/// Cells that fall outside the grid are skipped rather than rejected.
pub fn merge_piece_with_board(board: &Board, piece: &Piece, position: Position) -> Board {
    let mut rows = board.rows;
    for (r, c) in piece.shape.filled() {
        let br = position.row + r as i32;
        let bc = position.col + c as i32;
        if Board::in_bounds(br, bc) {
            rows[br as usize][bc as usize] = FILLED;
        }
    }
    Board { rows }
}

/// Remove every full row, shifting the rows above down and refilling the top
/// with empty rows.
pub fn clear_lines(board: &Board) -> ClearResult {
    let cleared_rows = board.full_rows();
    if cleared_rows.is_empty() {
        return ClearResult {
            board: *board,
            lines_cleared: 0,
            cleared_rows,
        };
    }

    let mut rows = [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT];
    let mut write = BOARD_HEIGHT;

    // Scan from bottom to top, packing surviving rows downward
    for read in (0..BOARD_HEIGHT).rev() {
        if !board.is_row_full(read) {
            write -= 1;
            rows[write] = board.rows[read];
        }
    }

    ClearResult {
        board: Board { rows },
        lines_cleared: cleared_rows.len() as u32,
        cleared_rows,
    }
}
