//! Solve a slice of the key space and carry it through every output
//! format.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use teeko_core::{negamax, Board, GameMode, Value};
use teeko_solver::checkpoint::Checkpoint;
use teeko_solver::{book, SolveOutcome, Solver, SolverConfig};

/// Every position with at most three markers.
const LIMIT: u64 = 7_526;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("teeko_pipeline_{}_{}", std::process::id(), name))
}

fn config(checkpoint: &str, book: &str) -> SolverConfig {
    SolverConfig {
        mode: GameMode::Regular,
        key_limit: Some(LIMIT),
        checkpoint_path: temp_path(checkpoint),
        book_path: temp_path(book),
        checkpoint_interval_secs: 3600,
        log_interval_secs: 3600,
        ..SolverConfig::default()
    }
}

#[test]
fn test_limited_solve_through_book_and_checkpoint() {
    let config = config("solve.bin", "solve.txt");
    let mut solver = Solver::new(&config);

    let running = Arc::new(AtomicBool::new(true));
    let outcome = solver.solve(running, &config.checkpoint_path).unwrap();
    assert!(matches!(outcome, SolveOutcome::Converged { .. }));

    solver.save_checkpoint(&config.checkpoint_path).unwrap();
    let table = solver.into_table();
    assert_eq!(table.len() as u64, LIMIT);
    assert_eq!(book::save(&config.book_path, &table).unwrap() as u64, LIMIT);

    // Nobody can have a shape with three markers, and unsolved children
    // count as ties: the whole slice is drawn
    assert!(table.values().iter().all(|&v| v == Value::Tie));
    assert_eq!(table.evaluate(&Board::new()), Value::Tie);

    let from_book = book::load_exact(&config.book_path, LIMIT).unwrap();
    assert_eq!(from_book.values(), table.values());

    let checkpoint = Checkpoint::load(&config.checkpoint_path).unwrap();
    assert_eq!(checkpoint.mode, GameMode::Regular);
    let from_checkpoint = checkpoint.into_table();
    assert_eq!(from_checkpoint.values(), table.values());

    // All drops tie, so the first one generated is chosen
    assert_eq!(from_checkpoint.best_drop(&Board::new()), Some(1));

    std::fs::remove_file(&config.checkpoint_path).ok();
    std::fs::remove_file(&config.book_path).ok();
}

#[test]
fn test_seeded_values_propagate_two_plies() {
    let config = config("seeded.bin", "seeded.txt");
    let mut solver = Solver::new(&config);
    solver.initialization_pass().unwrap();

    // Declare the position after drops on squares 0, 24 and 12 lost for
    // the side to move
    let mut board = Board::new();
    board.drop_marker(1 << 0);
    board.drop_marker(1 << 24);
    let parent_key = solver.encoder().encode(&board);
    let mut child = board;
    child.drop_marker(1 << 12);
    let child_key = solver.encoder().encode(&child);
    assert!(solver.set_value(child_key, Value::Lose));

    while solver.back_propagation_pass().unwrap() > 0 {}

    assert_eq!(solver.get(child_key), Value::Lose);
    assert_eq!(solver.get(parent_key), Value::Distance(125));

    let table = solver.into_table();
    assert_eq!(table.best_drop(&board), Some(1 << 12));

    // The grandparent stays a tie: the opponent avoids square 24
    let mut grandparent = Board::new();
    grandparent.drop_marker(1 << 0);
    let children: Vec<Value> = grandparent
        .successors()
        .map(|(_, c)| table.evaluate(&c))
        .collect();
    assert_eq!(negamax(children), Value::Tie);
    assert_eq!(table.evaluate(&grandparent), Value::Tie);
}
