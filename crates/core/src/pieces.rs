//! Pieces module - tetromino shape catalog and rotation
//!
//! Every shape is a square binary matrix (2x2, 3x3 or 4x4) where 1 marks an
//! occupied cell. Rotation is a pure 90° clockwise matrix transform with no
//! wall kicks: a rotated piece is either valid where it stands or rejected.

use crate::types::{Cell, Color, PieceKind, BOARD_WIDTH, FILLED};

/// Largest shape matrix in the catalog (the I piece)
pub const MAX_SHAPE_SIZE: usize = 4;

/// Square occupancy matrix of a piece in one orientation.
///
/// Stored in a fixed 4x4 array; only the top-left `size x size` block is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Shape {
    size: usize,
    cells: [[Cell; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE],
}

impl Shape {
    /// Build a shape from row slices.
    ///
    /// # Panics
    ///
    /// Panics if the rows do not form a square matrix of side 1..=4. Catalog
    /// shapes are static data, so a malformed one is a programming error.
    pub fn from_rows(rows: &[&[Cell]]) -> Self {
        let size = rows.len();
        assert!(
            (1..=MAX_SHAPE_SIZE).contains(&size),
            "shape must have 1..={} rows, got {}",
            MAX_SHAPE_SIZE,
            size
        );
        let mut cells = [[0; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for (r, row) in rows.iter().enumerate() {
            assert_eq!(
                row.len(),
                size,
                "shape must be square: row {} has {} cells, expected {}",
                r,
                row.len(),
                size
            );
            for (c, &cell) in row.iter().enumerate() {
                cells[r][c] = cell;
            }
        }
        Self { size, cells }
    }

    /// Side length of the matrix
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cell at (row, col) inside the matrix; 0 outside it
    pub fn get(&self, row: usize, col: usize) -> Cell {
        if row < self.size && col < self.size {
            self.cells[row][col]
        } else {
            0
        }
    }

    /// Iterate `(row, col)` of every filled cell, row-major
    pub fn filled(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.size;
        (0..n)
            .flat_map(move |r| (0..n).map(move |c| (r, c)))
            .filter(move |&(r, c)| self.cells[r][c] == FILLED)
    }

    /// The matrix as nested vectors, for display and assertions
    pub fn to_rows(&self) -> Vec<Vec<Cell>> {
        (0..self.size)
            .map(|r| self.cells[r][..self.size].to_vec())
            .collect()
    }

    /// 90° clockwise transform: `new[c][n-1-r] = old[r][c]`
    pub fn rotated_cw(&self) -> Self {
        let n = self.size;
        let mut cells = [[0; MAX_SHAPE_SIZE]; MAX_SHAPE_SIZE];
        for r in 0..n {
            for c in 0..n {
                cells[c][n - 1 - r] = self.cells[r][c];
            }
        }
        Self { size: n, cells }
    }
}

/// Canonical spawn shape for a piece kind
pub fn get_shape(kind: PieceKind) -> Shape {
    match kind {
        PieceKind::I => Shape::from_rows(&[
            &[0, 0, 0, 0],
            &[1, 1, 1, 1],
            &[0, 0, 0, 0],
            &[0, 0, 0, 0],
        ]),
        PieceKind::O => Shape::from_rows(&[&[1, 1], &[1, 1]]),
        PieceKind::T => Shape::from_rows(&[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]]),
        PieceKind::S => Shape::from_rows(&[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]]),
        PieceKind::Z => Shape::from_rows(&[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]]),
        PieceKind::J => Shape::from_rows(&[&[1, 0, 0], &[1, 1, 1], &[0, 0, 0]]),
        PieceKind::L => Shape::from_rows(&[&[0, 0, 1], &[1, 1, 1], &[0, 0, 0]]),
    }
}

/// A piece value: shape in its current orientation plus kind and color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub color: Color,
}

impl Piece {
    /// Fresh catalog piece in spawn orientation
    pub fn new(kind: PieceKind) -> Self {
        Self {
            kind,
            shape: get_shape(kind),
            color: kind.color(),
        }
    }

    /// Spawn column: horizontally centered bounding box
    pub fn spawn_col(&self) -> i32 {
        (BOARD_WIDTH / 2) as i32 - (self.shape.size() / 2) as i32
    }
}

/// Rotate a piece 90° clockwise, returning a new piece with the same kind and color
pub fn rotate_piece(piece: &Piece) -> Piece {
    Piece {
        shape: piece.shape.rotated_cw(),
        ..*piece
    }
}
