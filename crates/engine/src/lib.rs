//! Engine runtime - serialized command handling and the delayed clear commit
//!
//! [`blockfall_core::GameState`] is a plain synchronous value. This crate wraps
//! it for use from concurrent drivers:
//!
//! - [`Engine`]: one exclusive lock per session, snapshot publication over a
//!   `tokio::sync::watch` channel, and the second phase of a multi-line clear
//!   scheduled as a cancellable tokio task
//! - [`run_driver`]: fixed-period automatic descent plus a command channel
//! - [`EngineConfig`]: timing and seed, from defaults, TOML and environment
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use blockfall_engine::{run_driver, Engine, EngineConfig};
//! use blockfall_engine::types::Command;
//! use tokio::sync::{mpsc, watch};
//!
//! # async fn demo() -> blockfall_engine::Result<()> {
//! let engine = Arc::new(Engine::new(EngineConfig::from_env())?);
//! let (cmd_tx, cmd_rx) = mpsc::channel(32);
//! let (_stop_tx, stop_rx) = watch::channel(false);
//!
//! let driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));
//! cmd_tx.send(Command::HardDrop).await.ok();
//! drop(cmd_tx);
//! let _report = driver.await;
//! println!("score: {}", engine.snapshot().score);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod driver;
pub mod engine;
pub mod error;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use config::EngineConfig;
pub use driver::{run_driver, DriverReport};
pub use engine::Engine;
pub use error::{ConfigError, EngineError, Result};
