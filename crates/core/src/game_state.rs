//! Game state module - the session state machine
//!
//! `GameState` owns the board, the active and preview pieces, the score and the
//! pause/game-over flags. Every command reads the current state, computes the
//! next one through the pure primitives in [`crate::board`] and
//! [`crate::pieces`], and swaps it in.
//!
//! # Settling
//!
//! When a piece can no longer move down it is merged into the board. If no
//! rows are full the settle commits at once. Otherwise the settle is split in
//! two phases:
//!
//! 1. the merged board (full rows still visible) is published and a
//!    [`ClearTicket`] is handed back to the caller;
//! 2. after the clear delay the caller redeems the ticket with
//!    [`GameState::commit_clear`], which collapses the rows, scores them and
//!    spawns the next piece.
//!
//! Between the two phases the landed piece is frozen: movement commands are
//! rejected. A ticket issued before a [`GameState::reset`] is never honoured
//! after it.

use tracing::{debug, info};

use crate::board::{clear_lines, is_valid_move, merge_piece_with_board, Board, ClearResult, ClearedRows};
use crate::pieces::{rotate_piece, Piece};
use crate::rng::{random_piece, PieceSource, SimpleRng};
use crate::snapshot::{GameSnapshot, SettleEvent};
use crate::types::{Command, Position, POINTS_PER_LINE};

/// Handle for the deferred second phase of a multi-line settle.
///
/// Bound to the session generation and the settle that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearTicket {
    pub generation: u64,
    pub settle_id: u64,
}

/// What a command did to the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing changed
    Rejected,
    /// Position, shape or flags changed
    Applied,
    /// The piece landed and the settle committed immediately
    Settled(SettleEvent),
    /// The piece landed on full rows; redeem the ticket after the clear delay
    Clearing(ClearTicket),
}

impl Step {
    /// Whether the session changed
    pub fn changed(&self) -> bool {
        !matches!(self, Step::Rejected)
    }

    /// Ticket for a pending clear, if this step started one
    pub fn ticket(&self) -> Option<ClearTicket> {
        match self {
            Step::Clearing(ticket) => Some(*ticket),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingClear {
    ticket: ClearTicket,
    result: ClearResult,
}

/// Spawn position for a piece: top row, bounding box centered
pub fn spawn_position(piece: &Piece) -> Position {
    Position::new(0, piece.spawn_col())
}

/// Complete session state
#[derive(Debug)]
pub struct GameState {
    board: Board,
    current: Piece,
    position: Position,
    next: Piece,
    score: u32,
    lines: u32,
    game_over: bool,
    paused: bool,
    pending: Option<PendingClear>,
    /// Incremented on every reset
    generation: u64,
    /// Incremented on every landing
    settle_id: u64,
    pieces_spawned: u64,
    last_settle: Option<SettleEvent>,
    source: Box<dyn PieceSource>,
}

impl GameState {
    /// Create a new session with the seeded uniform piece source
    pub fn new(seed: u32) -> Self {
        Self::with_source(Box::new(SimpleRng::new(seed)))
    }

    /// Create a new session drawing pieces from `source`
    pub fn with_source(mut source: Box<dyn PieceSource>) -> Self {
        let current = random_piece(source.as_mut());
        let next = random_piece(source.as_mut());

        Self {
            board: Board::new(),
            position: spawn_position(&current),
            current,
            next,
            score: 0,
            lines: 0,
            game_over: false,
            paused: false,
            pending: None,
            generation: 0,
            settle_id: 0,
            pieces_spawned: 1,
            last_settle: None,
            source,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_piece(&self) -> &Piece {
        &self.current
    }

    pub fn current_position(&self) -> Position {
        self.position
    }

    pub fn next_piece(&self) -> &Piece {
        &self.next
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Whether a multi-line settle is waiting for its second phase
    pub fn is_clearing(&self) -> bool {
        self.pending.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pieces_spawned(&self) -> u64 {
        self.pieces_spawned
    }

    pub fn last_settle(&self) -> Option<&SettleEvent> {
        self.last_settle.as_ref()
    }

    /// Ticket of the pending clear, if any
    pub fn pending_ticket(&self) -> Option<ClearTicket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    /// Rows full in the published board (non-empty only while clearing)
    pub fn clearing_rows(&self) -> ClearedRows {
        self.board.full_rows()
    }

    /// Whether movement commands act on the current piece
    pub fn playable(&self) -> bool {
        !self.game_over && !self.paused && self.pending.is_none()
    }

    /// Row the current piece would settle at if hard-dropped
    pub fn landing_row(&self) -> i32 {
        let mut row = self.position.row;
        while is_valid_move(&self.board, &self.current, Position::new(row + 1, self.position.col)) {
            row += 1;
        }
        row
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.board = *self.board.rows();
        out.current = self.current;
        out.position = self.position;
        out.next = self.next;
        out.score = self.score;
        out.lines = self.lines;
        out.game_over = self.game_over;
        out.paused = self.paused;
        out.clearing = self.pending.is_some();
        out.landing_row = self.landing_row();
        out.generation = self.generation;
        out.pieces_spawned = self.pieces_spawned;
        out.last_settle = self.last_settle.clone();
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::new(self.current, self.next);
        self.snapshot_into(&mut s);
        s
    }

    /// Apply a driver command.
    ///
    /// Once the game is over only [`Command::allowed_when_over`] commands act,
    /// and while paused only [`Command::allowed_when_paused`] ones do.
    pub fn apply(&mut self, command: Command) -> Step {
        if self.game_over && !command.allowed_when_over() {
            return Step::Rejected;
        }
        if self.paused && !command.allowed_when_paused() {
            return Step::Rejected;
        }
        match command {
            Command::MoveLeft => self.move_left(),
            Command::MoveRight => self.move_right(),
            Command::MoveDown => self.move_down(),
            Command::Rotate => self.rotate(),
            Command::HardDrop => self.hard_drop(),
            Command::TogglePause => self.toggle_pause(),
            Command::Reset => {
                self.reset();
                Step::Applied
            }
        }
    }

    pub fn move_left(&mut self) -> Step {
        self.try_shift(0, -1)
    }

    pub fn move_right(&mut self) -> Step {
        self.try_shift(0, 1)
    }

    /// Soft drop by one row, settling the piece if it cannot move
    pub fn move_down(&mut self) -> Step {
        if !self.playable() {
            return Step::Rejected;
        }
        match self.try_shift(1, 0) {
            Step::Rejected => self.land(),
            step => step,
        }
    }

    /// Rotate clockwise in place; no wall kicks
    pub fn rotate(&mut self) -> Step {
        if !self.playable() {
            return Step::Rejected;
        }
        let rotated = rotate_piece(&self.current);
        if is_valid_move(&self.board, &rotated, self.position) {
            self.current = rotated;
            Step::Applied
        } else {
            Step::Rejected
        }
    }

    /// Drop to the lowest valid row and settle
    pub fn hard_drop(&mut self) -> Step {
        if !self.playable() {
            return Step::Rejected;
        }
        self.position.row = self.landing_row();
        self.land()
    }

    /// Flip the pause flag. Ignored once the game is over.
    pub fn toggle_pause(&mut self) -> Step {
        if self.game_over {
            return Step::Rejected;
        }
        self.paused = !self.paused;
        debug!(paused = self.paused, "pause toggled");
        Step::Applied
    }

    /// Reinitialize the session. Always permitted; invalidates any pending ticket.
    pub fn reset(&mut self) {
        let current = random_piece(self.source.as_mut());
        let next = random_piece(self.source.as_mut());

        self.generation = self.generation.wrapping_add(1);
        self.board = Board::new();
        self.position = spawn_position(&current);
        self.current = current;
        self.next = next;
        self.score = 0;
        self.lines = 0;
        self.game_over = false;
        self.paused = false;
        self.pending = None;
        self.pieces_spawned = 1;
        self.last_settle = None;

        info!(generation = self.generation, "session reset");
    }

    /// Second phase of a multi-line settle.
    ///
    /// Returns `None` and leaves the session untouched if `ticket` does not
    /// match the pending clear (already committed, or superseded by a reset).
    pub fn commit_clear(&mut self, ticket: ClearTicket) -> Option<SettleEvent> {
        match self.pending.take() {
            Some(pending) if pending.ticket == ticket => Some(self.finish_settle(pending.result)),
            other => {
                self.pending = other;
                debug!(?ticket, "discarding stale clear commit");
                None
            }
        }
    }

    fn try_shift(&mut self, d_row: i32, d_col: i32) -> Step {
        if !self.playable() {
            return Step::Rejected;
        }
        let candidate = self.position.offset(d_row, d_col);
        if is_valid_move(&self.board, &self.current, candidate) {
            self.position = candidate;
            Step::Applied
        } else {
            Step::Rejected
        }
    }

    /// Merge the current piece at its last valid position and clear rows
    fn land(&mut self) -> Step {
        let merged = merge_piece_with_board(&self.board, &self.current, self.position);
        let result = clear_lines(&merged);
        self.settle_id = self.settle_id.wrapping_add(1);

        if result.lines_cleared == 0 {
            return Step::Settled(self.finish_settle(result));
        }

        let ticket = ClearTicket {
            generation: self.generation,
            settle_id: self.settle_id,
        };
        debug!(rows = ?result.cleared_rows, "full rows pending clear");
        self.board = merged;
        self.pending = Some(PendingClear { ticket, result });
        Step::Clearing(ticket)
    }

    fn finish_settle(&mut self, result: ClearResult) -> SettleEvent {
        let score_delta = result.lines_cleared * POINTS_PER_LINE;

        self.board = result.board;
        self.score = self.score.saturating_add(score_delta);
        self.lines = self.lines.saturating_add(result.lines_cleared);

        self.current = self.next;
        self.next = random_piece(self.source.as_mut());
        self.position = spawn_position(&self.current);
        self.pieces_spawned = self.pieces_spawned.wrapping_add(1);
        self.game_over = !is_valid_move(&self.board, &self.current, self.position);

        let event = SettleEvent {
            lines_cleared: result.lines_cleared,
            cleared_rows: result.cleared_rows,
            score_delta,
        };
        debug!(lines = event.lines_cleared, score = self.score, "piece settled");
        if self.game_over {
            info!(score = self.score, lines = self.lines, "game over");
        }
        self.last_settle = Some(event.clone());
        event
    }

    /// Replace the board, for building scenarios in tests and tools.
    ///
    /// Clears any pending clear.
    pub fn set_board(&mut self, board: Board) {
        self.board = board;
        self.pending = None;
    }

    /// Replace the current piece and position without validation,
    /// for building scenarios in tests and tools.
    pub fn set_current(&mut self, piece: Piece, position: Position) {
        self.current = piece;
        self.position = position;
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}
