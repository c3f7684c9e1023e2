//! Terminal key bindings (driver-facing).
//!
//! Maps `crossterm` key events to [`crate::types::Command`] using the
//! reference bindings: arrows move and rotate, space hard-drops, enter
//! toggles pause.

pub mod map;

pub use blockfall_types as types;

pub use map::{command_for_key, should_quit};
