//! Teeko Solver
//!
//! Builds the perfect-play table by retrograde analysis, checkpointing as it
//! goes, and writes the finished table as a text book.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use log::{info, warn};

use teeko_core::{Board, Square};
use teeko_solver::book;
use teeko_solver::checkpoint::Checkpoint;
use teeko_solver::config::{SolverConfig, USAGE};
use teeko_solver::{SolveOutcome, Solver};

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {:?}", parent))?;
    }
    Ok(())
}

/// Load the checkpoint if one exists and matches the configuration.
fn load_or_new(config: &SolverConfig) -> Solver {
    let path = &config.checkpoint_path;
    if !path.exists() {
        return Solver::new(config);
    }

    info!("Loading checkpoint from {:?}...", path);
    let start = Instant::now();
    let resumed = Checkpoint::load(path)
        .map_err(anyhow::Error::from)
        .and_then(|checkpoint| Ok(Solver::from_checkpoint(config, checkpoint)?));

    match resumed {
        Ok(solver) => {
            info!(
                "Loaded {} entries after {} passes in {:.2}s",
                solver.len(),
                solver.passes(),
                start.elapsed().as_secs_f64()
            );
            solver
        }
        Err(e) => {
            warn!("Failed to load checkpoint: {:#}", e);
            warn!("Starting fresh.");
            Solver::new(config)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match SolverConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    info!("Teeko Solver");
    info!("Rules: {:?}", config.mode);
    match config.key_limit {
        Some(limit) => info!("Key limit: {}", limit),
        None => info!("Key limit: none (full key space)"),
    }
    info!("Checkpoint: {:?} every {}s", config.checkpoint_path, config.checkpoint_interval_secs);
    info!("Log interval: {}s", config.log_interval_secs);

    // Set up SIGINT handler for graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, saving checkpoint...");
        r.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl-C handler")?;

    ensure_parent(&config.checkpoint_path)?;
    ensure_parent(&config.book_path)?;

    let mut solver = load_or_new(&config);

    let start = Instant::now();
    let outcome = solver
        .solve(running, &config.checkpoint_path)
        .context("solve failed")?;

    info!("==========================");
    info!("Result: {:?}", outcome);
    info!("Time: {:.2}s", start.elapsed().as_secs_f64());
    solver.stats.log_summary();

    match outcome {
        SolveOutcome::Interrupted { passes } => {
            info!("Solve was interrupted after {} passes; rerun to resume.", passes);
            return Ok(());
        }
        SolveOutcome::PassLimit { passes } => {
            solver.save_checkpoint(&config.checkpoint_path)?;
            info!("Stopped at the pass limit ({} passes); rerun to continue.", passes);
            return Ok(());
        }
        SolveOutcome::Converged { .. } => {
            solver.save_checkpoint(&config.checkpoint_path)?;
        }
    }

    let table = solver.into_table();
    info!("Writing book to {:?}...", config.book_path);
    let save_start = Instant::now();
    let count = book::save(&config.book_path, &table)
        .with_context(|| format!("writing book {:?}", config.book_path))?;
    info!(
        "Wrote {} entries in {:.2}s",
        count,
        save_start.elapsed().as_secs_f64()
    );

    // Interpret result
    let board = Board::new();
    info!("Initial position: {}", table.evaluate(&board));
    if let Some(square) = table.best_drop(&board).and_then(Square::from_bit) {
        info!(
            "Best opening drop: column {} row {}",
            square.col(),
            square.row()
        );
    }
    Ok(())
}
