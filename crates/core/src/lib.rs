//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the rules of the falling-block game: board primitives,
//! the piece catalog, random piece selection and the session state machine.
//! It has **no dependencies** on timers, threads, rendering or I/O:
//!
//! - **Deterministic**: same seed (or scripted piece source) produces the same game
//! - **Value-typed**: boards and pieces are `Copy` values replaced wholesale
//! - **Testable**: the delayed line-clear commit is an explicit ticket, so tests
//!   can drive both phases synchronously
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid, collision test, merge and line clearing
//! - [`pieces`]: tetromino shape catalog and clockwise rotation
//! - [`rng`]: injected piece sources (seeded uniform LCG, scripted)
//! - [`game_state`]: session state and the command surface
//! - [`snapshot`]: read-only published view of a session
//!
//! # Game Rules
//!
//! - **Uniform draws**: each new piece is an independent uniform choice among 7 kinds
//! - **No wall kicks**: a rotation that collides is rejected outright
//! - **Flat scoring**: 100 points per cleared line
//! - **Two-phase clear**: full rows stay visible until the clear is committed
//! - **Game over**: the freshly spawned piece does not fit at the spawn position
//!
//! # Example
//!
//! ```
//! use blockfall_core::{GameState, Step};
//! use blockfall_core::types::Command;
//!
//! let mut game = GameState::new(12345);
//!
//! game.apply(Command::MoveRight);
//! game.apply(Command::Rotate);
//! let step = game.apply(Command::HardDrop);
//! assert!(matches!(step, Step::Settled(_)));
//!
//! assert_eq!(game.score(), 0);
//! assert_eq!(game.board().filled_count(), 4);
//! ```

pub mod board;
pub mod game_state;
pub mod pieces;
pub mod rng;
pub mod snapshot;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use board::{clear_lines, empty_board, is_valid_move, merge_piece_with_board, Board, ClearResult, Grid};
pub use game_state::{spawn_position, ClearTicket, GameState, Step};
pub use pieces::{get_shape, rotate_piece, Piece, Shape};
pub use rng::{random_piece, PieceSource, ScriptedPieces, SimpleRng};
pub use snapshot::{GameSnapshot, SettleEvent};
