//! Blockfall (workspace facade crate).
//!
//! Re-exports the member crates under one `blockfall::{core,engine,input,types}`
//! namespace while the implementation lives in dedicated crates under `crates/`.

pub use blockfall_core as core;
pub use blockfall_engine as engine;
pub use blockfall_input as input;
pub use blockfall_types as types;

pub mod cli;
