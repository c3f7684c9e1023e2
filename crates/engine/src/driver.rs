//! Driver loop.
//!
//! Bridges the two external command sources with the engine: a fixed-period
//! timer issuing automatic descent, and a channel of discrete commands from an
//! input dispatcher.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use crate::engine::Engine;
use crate::types::Command;

/// Counters reported when the driver stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverReport {
    /// Timer ticks that issued a move-down
    pub drops: u64,
    /// Commands received from the channel
    pub commands: u64,
}

/// Run until the command channel closes or `shutdown` becomes true.
///
/// Timer ticks issue `moveDown` only while the published snapshot is playable
/// (not over, not paused, not mid-clear).
pub async fn run_driver(
    engine: Arc<Engine>,
    mut commands: mpsc::Receiver<Command>,
    mut shutdown: watch::Receiver<bool>,
) -> DriverReport {
    let mut report = DriverReport::default();
    let mut ticker = interval(engine.config().drop_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if engine.snapshot().playable() {
                    engine.move_down();
                    report.drops += 1;
                }
            }
            command = commands.recv() => {
                let Some(command) = command else {
                    debug!("command channel closed");
                    break;
                };
                report.commands += 1;
                let step = engine.dispatch(command);
                debug!(command = command.as_str(), changed = step.changed(), "command applied");
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use blockfall_core::ScriptedPieces;
    use crate::config::EngineConfig;
    use crate::types::PieceKind;

    fn o_engine() -> Arc<Engine> {
        let source = Box::new(ScriptedPieces::new(vec![PieceKind::O]));
        Arc::new(Engine::with_source(EngineConfig::default(), source).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_descends_once_per_interval() {
        let engine = o_engine();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (stop_tx, stop_rx) = watch::channel(false);
        let driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(engine.snapshot().position.row, 3);

        stop_tx.send(true).unwrap();
        let report = driver.await.unwrap();
        assert_eq!(report.drops, 3);
        drop(cmd_tx);
    }

    #[tokio::test(start_paused = true)]
    async fn test_paused_session_skips_ticks() {
        let engine = o_engine();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));

        cmd_tx.send(Command::TogglePause).await.unwrap();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        assert!(engine.snapshot().paused);
        assert_eq!(engine.snapshot().position.row, 0);

        drop(cmd_tx);
        let report = driver.await.unwrap();
        assert_eq!(report.drops, 0);
        assert_eq!(report.commands, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands_are_forwarded() {
        let engine = o_engine();
        let (cmd_tx, cmd_rx) = mpsc::channel(8);
        let (_stop_tx, stop_rx) = watch::channel(false);
        let driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));

        cmd_tx.send(Command::MoveLeft).await.unwrap();
        cmd_tx.send(Command::HardDrop).await.unwrap();
        drop(cmd_tx);
        driver.await.unwrap();

        let snap = engine.snapshot();
        assert_eq!(snap.board[19][3], 1);
        assert_eq!(snap.board[18][4], 1);
        assert_eq!(snap.pieces_spawned, 2);
    }
}
