//! Concurrent engine handle.
//!
//! Serializes every command against one [`GameState`] behind an exclusive
//! lock, publishes a [`GameSnapshot`] after each change, and runs the delayed
//! second phase of a multi-line clear as a tokio task bound to its
//! [`ClearTicket`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

use blockfall_core::{ClearTicket, GameSnapshot, GameState, PieceSource, SimpleRng, Step};

use crate::config::EngineConfig;
use crate::error::Result;
use crate::types::Command;

struct Shared {
    state: Mutex<GameState>,
    published: watch::Sender<GameSnapshot>,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, GameState> {
        // Every command leaves the state whole, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &GameState) {
        self.published.send_replace(state.snapshot());
    }
}

/// Shareable rules engine. All methods take `&self`; wrap in an `Arc` to
/// drive it from a timer and an input source at once.
pub struct Engine {
    shared: Arc<Shared>,
    pending_commit: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
    config: EngineConfig,
}

impl Engine {
    /// Engine with a uniform random piece source seeded from `config`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let seed = config.seed_or_random();
        Self::with_source(config, Box::new(SimpleRng::new(seed)))
    }

    /// Engine drawing pieces from `source`
    pub fn with_source(config: EngineConfig, source: Box<dyn PieceSource>) -> Result<Self> {
        Self::with_state(config, GameState::with_source(source))
    }

    /// Engine wrapping a prepared session
    pub fn with_state(config: EngineConfig, state: GameState) -> Result<Self> {
        let runtime = Handle::try_current()?;
        Self::with_handle(config, state, runtime)
    }

    /// Engine scheduling its delayed commits on `runtime`.
    ///
    /// Fails if `config` does not validate.
    pub fn with_handle(config: EngineConfig, state: GameState, runtime: Handle) -> Result<Self> {
        config.validate()?;
        let (published, _) = watch::channel(state.snapshot());
        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                published,
            }),
            pending_commit: Mutex::new(None),
            runtime,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> GameSnapshot {
        self.shared.published.borrow().clone()
    }

    /// Receiver notified on every published change
    pub fn subscribe(&self) -> watch::Receiver<GameSnapshot> {
        self.shared.published.subscribe()
    }

    pub fn move_left(&self) -> Step {
        self.dispatch(Command::MoveLeft)
    }

    pub fn move_right(&self) -> Step {
        self.dispatch(Command::MoveRight)
    }

    pub fn move_down(&self) -> Step {
        self.dispatch(Command::MoveDown)
    }

    pub fn rotate(&self) -> Step {
        self.dispatch(Command::Rotate)
    }

    pub fn hard_drop(&self) -> Step {
        self.dispatch(Command::HardDrop)
    }

    pub fn toggle_pause(&self) -> Step {
        self.dispatch(Command::TogglePause)
    }

    pub fn reset(&self) -> Step {
        self.dispatch(Command::Reset)
    }

    /// Apply one command atomically and publish the result
    pub fn dispatch(&self, command: Command) -> Step {
        let mut state = self.shared.lock_state();

        if command == Command::Reset {
            self.cancel_pending_commit();
        }

        let step = state.apply(command);
        if step.changed() {
            self.shared.publish(&state);
        }
        if let Step::Clearing(ticket) = step {
            self.schedule_commit(ticket);
        }
        step
    }

    fn schedule_commit(&self, ticket: ClearTicket) {
        let shared = Arc::clone(&self.shared);
        let delay = self.config.line_clear_delay();

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock_state();
            if state.commit_clear(ticket).is_some() {
                shared.publish(&state);
            }
        });

        let previous = self
            .pending_commit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_pending_commit(&self) {
        let pending = self
            .pending_commit
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            if !task.is_finished() {
                debug!("cancelling pending line clear commit");
            }
            task.abort();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.cancel_pending_commit();
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("snapshot", &*self.shared.published.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use blockfall_core::{Board, ScriptedPieces};
    use crate::error::{ConfigError, EngineError};
    use crate::types::{PieceKind, BOARD_WIDTH};

    /// Session with an I piece next to a bottom row that it completes
    fn one_line_setup() -> GameState {
        let mut state = GameState::with_source(Box::new(ScriptedPieces::new(vec![
            PieceKind::I,
            PieceKind::O,
        ])));
        let cells: Vec<(i32, i32)> = (0..BOARD_WIDTH as i32)
            .filter(|c| !(3..7).contains(c))
            .map(|c| (19, c))
            .collect();
        state.set_board(Board::new().with_filled(&cells));
        state
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        assert!(Engine::new(EngineConfig::default()).is_err());
    }

    #[tokio::test]
    async fn test_zero_drop_interval_rejected() {
        let config = EngineConfig {
            drop_interval_ms: 0,
            ..EngineConfig::default()
        };
        let err = Engine::new(config).unwrap_err();
        assert!(matches!(err, EngineError::Config(ConfigError::Invalid(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_commits_after_delay() {
        let engine = Engine::with_state(EngineConfig::default(), one_line_setup()).unwrap();

        assert!(matches!(engine.hard_drop(), Step::Clearing(_)));
        let snap = engine.snapshot();
        assert!(snap.clearing);
        assert_eq!(snap.clearing_rows().as_slice(), &[19]);
        assert_eq!(snap.score, 0);

        tokio::time::sleep(Duration::from_millis(799)).await;
        assert!(engine.snapshot().clearing);

        tokio::time::sleep(Duration::from_millis(2)).await;
        let snap = engine.snapshot();
        assert!(!snap.clearing);
        assert_eq!(snap.score, 100);
        assert_eq!(snap.current.kind, PieceKind::O);
        assert!(snap.clearing_rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_cancels_pending_commit() {
        let engine = Engine::with_state(EngineConfig::default(), one_line_setup()).unwrap();

        assert!(matches!(engine.hard_drop(), Step::Clearing(_)));
        engine.reset();
        let after_reset = engine.snapshot();
        assert_eq!(after_reset.generation, 1);

        tokio::time::sleep(Duration::from_millis(1000)).await;
        let snap = engine.snapshot();
        assert_eq!(snap, after_reset);
        assert_eq!(snap.score, 0);
        assert_eq!(snap.board, *Board::new().rows());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_both_phases() {
        let engine = Engine::with_state(EngineConfig::default(), one_line_setup()).unwrap();
        let mut rx = engine.subscribe();

        engine.hard_drop();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().clearing);

        rx.changed().await.unwrap();
        let snap = rx.borrow_and_update().clone();
        assert!(!snap.clearing);
        assert_eq!(snap.lines, 1);
    }
}
