//! Snapshot module - read-only published view of a session
//!
//! [`GameSnapshot`] is what drivers and renderers see. During the line-clear
//! window the full rows are still present in `board`, so
//! [`GameSnapshot::clearing_rows`] can derive them without extra state.

use serde::Serialize;

use crate::board::{ClearedRows, Grid};
use crate::pieces::Piece;
use crate::types::{Position, BOARD_HEIGHT, BOARD_WIDTH, EMPTY, FILLED};

/// Outcome of one committed settle
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SettleEvent {
    pub lines_cleared: u32,
    /// Pre-clear row indices, top to bottom. Informational only.
    pub cleared_rows: ClearedRows,
    pub score_delta: u32,
}

/// Read-only view of a session, published to drivers and renderers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct GameSnapshot {
    pub board: Grid,
    pub current: Piece,
    pub position: Position,
    pub next: Piece,
    pub score: u32,
    pub lines: u32,
    pub game_over: bool,
    pub paused: bool,
    /// Full rows are on display, waiting for the delayed collapse
    pub clearing: bool,
    pub landing_row: i32,
    pub generation: u64,
    pub pieces_spawned: u64,
    pub last_settle: Option<SettleEvent>,
}

impl GameSnapshot {
    pub fn new(current: Piece, next: Piece) -> Self {
        Self {
            board: [[EMPTY; BOARD_WIDTH]; BOARD_HEIGHT],
            current,
            position: Position::new(0, current.spawn_col()),
            next,
            score: 0,
            lines: 0,
            game_over: false,
            paused: false,
            clearing: false,
            landing_row: 0,
            generation: 0,
            pieces_spawned: 0,
            last_settle: None,
        }
    }

    /// Whether the timer should issue automatic descent
    pub fn playable(&self) -> bool {
        !self.game_over && !self.paused && !self.clearing
    }

    /// Rows that are completely filled in this snapshot, top to bottom
    pub fn clearing_rows(&self) -> ClearedRows {
        (0..BOARD_HEIGHT)
            .filter(|&r| self.board[r].iter().all(|&c| c == FILLED))
            .collect()
    }

    /// Board coordinates of the current piece's filled cells
    pub fn current_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.current
            .shape
            .filled()
            .map(move |(r, c)| (self.position.row + r as i32, self.position.col + c as i32))
    }
}
