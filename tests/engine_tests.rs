//! Engine tests - serialized commands, delayed commit and the driver loop

use std::sync::Arc;
use std::time::Duration;

use blockfall::core::{Board, GameSnapshot, GameState, ScriptedPieces, SimpleRng, Step};
use blockfall::engine::{run_driver, Engine, EngineConfig};
use blockfall::types::{Command, PieceKind, BOARD_HEIGHT, BOARD_WIDTH, EMPTY};
use tokio::sync::{mpsc, watch};

fn scripted_engine(config: EngineConfig, kinds: &[PieceKind]) -> Engine {
    let source = Box::new(ScriptedPieces::new(kinds.to_vec()));
    Engine::with_source(config, source).unwrap()
}

fn assert_piece_fits(snap: &GameSnapshot) {
    for (row, col) in snap.current_cells() {
        assert!(
            (0..BOARD_HEIGHT as i32).contains(&row) && (0..BOARD_WIDTH as i32).contains(&col),
            "cell ({}, {}) out of bounds",
            row,
            col
        );
        assert_eq!(snap.board[row as usize][col as usize], EMPTY, "cell ({}, {}) overlaps", row, col);
    }
}

#[tokio::test(start_paused = true)]
async fn test_o_stack_reaches_game_over() {
    let engine = scripted_engine(EngineConfig::default(), &[PieceKind::O]);

    // Each O adds two rows to columns 4-5; the tenth fills the spawn area.
    for _ in 0..9 {
        assert!(matches!(engine.hard_drop(), Step::Settled(_)));
        assert!(!engine.snapshot().game_over);
    }
    engine.hard_drop();
    let over = engine.snapshot();
    assert!(over.game_over);
    assert_eq!(over.pieces_spawned, 11);
    assert_eq!(over.score, 0);

    for command in [Command::MoveLeft, Command::Rotate, Command::HardDrop, Command::TogglePause] {
        assert_eq!(engine.dispatch(command), Step::Rejected);
    }
    assert_eq!(engine.snapshot(), over);

    assert_eq!(engine.reset(), Step::Applied);
    let fresh = engine.snapshot();
    assert!(!fresh.game_over);
    assert_eq!(fresh.board, *Board::new().rows());
}

#[tokio::test(start_paused = true)]
async fn test_configured_clear_delay() {
    let config = EngineConfig::from_toml_str("line_clear_delay_ms = 50").unwrap();
    let mut state = GameState::with_source(Box::new(ScriptedPieces::new(vec![PieceKind::I])));
    state.set_board(Board::new().with_filled(&[
        (19, 0),
        (19, 1),
        (19, 2),
        (19, 7),
        (19, 8),
        (19, 9),
    ]));
    let engine = Engine::with_state(config, state).unwrap();

    assert!(matches!(engine.hard_drop(), Step::Clearing(_)));
    tokio::time::sleep(Duration::from_millis(49)).await;
    assert!(engine.snapshot().clearing);

    tokio::time::sleep(Duration::from_millis(2)).await;
    let snap = engine.snapshot();
    assert!(!snap.clearing);
    assert_eq!(snap.score, 100);
    assert_eq!(snap.last_settle.map(|ev| ev.lines_cleared), Some(1));
}

#[tokio::test(start_paused = true)]
async fn test_driver_descends_and_settles() {
    let engine = Arc::new(scripted_engine(EngineConfig::default(), &[PieceKind::O]));
    let (cmd_tx, cmd_rx) = mpsc::channel(8);
    let (stop_tx, stop_rx) = watch::channel(false);
    let driver = tokio::spawn(run_driver(Arc::clone(&engine), cmd_rx, stop_rx));

    // 18 descents reach the floor, the 19th settles.
    tokio::time::sleep(Duration::from_millis(19_500)).await;
    let snap = engine.snapshot();
    assert_eq!(snap.pieces_spawned, 2);
    assert_eq!(snap.position.row, 0);
    assert_eq!(snap.board[19][4], 1);
    assert_eq!(snap.board[18][5], 1);

    stop_tx.send(true).unwrap();
    let report = driver.await.unwrap();
    assert_eq!(report.drops, 19);
    assert_eq!(report.commands, 0);
    drop(cmd_tx);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commands_keep_piece_in_bounds() {
    let config = EngineConfig {
        line_clear_delay_ms: 0,
        seed: Some(7),
        ..EngineConfig::default()
    };
    let engine = Arc::new(Engine::new(config).unwrap());
    let commands = [
        Command::MoveLeft,
        Command::MoveRight,
        Command::MoveDown,
        Command::Rotate,
        Command::HardDrop,
    ];

    let mut workers = Vec::new();
    for worker in 0..4u32 {
        let engine = Arc::clone(&engine);
        workers.push(tokio::spawn(async move {
            let mut rng = SimpleRng::new(worker + 1);
            for _ in 0..500 {
                let command = commands[rng.next_range(commands.len() as u32) as usize];
                engine.dispatch(command);

                let snap = engine.snapshot();
                if snap.game_over {
                    engine.reset();
                } else if !snap.clearing {
                    assert_piece_fits(&snap);
                }
                tokio::task::yield_now().await;
            }
        }));
    }
    for worker in workers {
        worker.await.unwrap();
    }

    let snap = engine.snapshot();
    assert!(snap.pieces_spawned >= 2);
}
