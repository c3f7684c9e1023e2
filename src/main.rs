//! Headless driver (default binary).
//!
//! Runs one engine session with the reference drop timer and feeds it commands
//! either from a seeded autoplay generator or from terminal key presses.
//! Nothing is drawn; progress is reported through `tracing`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use blockfall::cli::{parse_run_args, InputMode, RunArgs};
use blockfall::engine::{run_driver, Engine, EngineConfig};
use blockfall::input::{command_for_key, should_quit};
use blockfall::types::Command;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_run_args(&argv)?;

    let mut config = match &args.config_path {
        Some(path) => {
            EngineConfig::load_with_env(path).with_context(|| format!("loading config {}", path))?
        }
        None => EngineConfig::load_from_env().context("loading config")?,
    };
    let seed = config.seed_or_random();
    config.seed = Some(seed);
    info!(seed, drop_ms = config.drop_interval_ms, clear_ms = config.line_clear_delay_ms, "starting session");

    let engine = Arc::new(Engine::new(config)?);
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(64);
    let (stop_tx, stop_rx) = watch::channel(false);
    let mut driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));

    if args.mode == InputMode::Keys {
        crossterm::terminal::enable_raw_mode()?;
    }
    let source = match args.mode {
        InputMode::Autoplay => tokio::spawn(autoplay(cmd_tx, seed, args.autoplay_ms)),
        InputMode::Keys => tokio::task::spawn_blocking(move || read_keys(cmd_tx)),
    };

    let outcome = watch_session(&engine, &args, &mut driver).await;

    let _ = stop_tx.send(true);
    if args.mode == InputMode::Keys {
        let _ = crossterm::terminal::disable_raw_mode();
    }
    source.abort();
    if !driver.is_finished() {
        let report = (&mut driver).await?;
        debug!(?report, "driver stopped");
    }
    outcome?;

    let snap = engine.snapshot();
    info!(score = snap.score, lines = snap.lines, pieces = snap.pieces_spawned, game_over = snap.game_over, "session finished");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snap)?);
    }
    Ok(())
}

/// Follow published snapshots until the session should end
async fn watch_session(
    engine: &Engine,
    args: &RunArgs,
    driver: &mut tokio::task::JoinHandle<blockfall::engine::DriverReport>,
) -> Result<()> {
    let mut snapshots = engine.subscribe();
    let mut last_score = 0;

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                changed.context("engine dropped")?;
                let snap = snapshots.borrow_and_update().clone();

                if snap.score != last_score {
                    info!(score = snap.score, lines = snap.lines, "score");
                    last_score = snap.score;
                }
                if snap.game_over && args.mode == InputMode::Autoplay {
                    return Ok(());
                }
                if let Some(max) = args.max_pieces {
                    if snap.pieces_spawned >= max {
                        return Ok(());
                    }
                }
            }
            report = &mut *driver => {
                let report = report?;
                debug!(?report, "driver stopped");
                return Ok(());
            }
        }
    }
}

async fn autoplay(commands: mpsc::Sender<Command>, seed: u32, every_ms: u64) {
    let mut rng = fastrand::Rng::with_seed(seed as u64);
    let mut ticker = tokio::time::interval(Duration::from_millis(every_ms));

    loop {
        ticker.tick().await;
        let command = match rng.u8(0..100) {
            0..=29 => Command::MoveLeft,
            30..=59 => Command::MoveRight,
            60..=84 => Command::Rotate,
            _ => Command::HardDrop,
        };
        if commands.send(command).await.is_err() {
            break;
        }
    }
}

/// Blocking key loop; returns when the user quits or the driver goes away
fn read_keys(commands: mpsc::Sender<Command>) {
    loop {
        match event::poll(Duration::from_millis(100)) {
            Ok(false) => {
                if commands.is_closed() {
                    return;
                }
                continue;
            }
            Ok(true) => {}
            Err(e) => {
                warn!("terminal poll failed: {}", e);
                return;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) => key,
            Ok(_) => continue,
            Err(e) => {
                warn!("terminal read failed: {}", e);
                return;
            }
        };

        if should_quit(key) {
            return;
        }
        if let Some(command) = command_for_key(key) {
            if commands.blocking_send(command).is_err() {
                return;
            }
        }
    }
}
