//! Retrograde solver over the dense key space.
//!
//! The working buffer holds one [`Value`] per key. An initialization pass
//! marks every position that is already decided, then back-propagation
//! passes sweep the keys in ascending order and rewrite each undecided
//! entry from its children until a pass changes nothing. Sweeps update the
//! buffer in place, so a key may already see values written earlier in the
//! same pass.

use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use teeko_core::{
    negamax, Board, DecodeError, GameMode, PerfectPlayTable, Phase, StateEncoder, Value,
};
use thiserror::Error;

use crate::checkpoint::Checkpoint;
use crate::config::SolverConfig;
use crate::stats::{format_clock, SolverStats};

/// Keys swept between checks of the interrupt flag and the log timer.
const POLL_EVERY: usize = 1 << 16;

#[derive(Debug, Error)]
pub enum SolverError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("checkpoint I/O failed: {0}")]
    Checkpoint(#[from] io::Error),

    #[error("checkpoint was built for {found:?} rules, solver is configured for {expected:?}")]
    ModeMismatch { expected: GameMode, found: GameMode },

    #[error("checkpoint holds {found} entries, solver expects {expected}")]
    SizeMismatch { expected: u64, found: u64 },
}

/// How a call to [`Solver::solve`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveOutcome {
    /// The last pass changed nothing; the buffer is the final table.
    Converged { passes: u32 },
    /// The interrupt flag was cleared; a checkpoint has been written.
    Interrupted { passes: u32 },
    /// The configured pass limit was reached first.
    PassLimit { passes: u32 },
}

/// Initial value of a position: decided if either side already holds a
/// winning shape, a tie otherwise.
///
/// The mover's own shape only counts in the move phase; with fewer than
/// four markers it cannot have one.
pub fn classify(board: &Board, mode: GameMode) -> Value {
    let opponent_won = board.is_win(mode);
    let mover_won = board.phase() == Phase::Move && board.mover_has_won(mode);

    match (opponent_won, mover_won) {
        (true, true) => Value::Illegal,
        (true, false) => Value::Lose,
        (false, true) => Value::Win,
        (false, false) => Value::Tie,
    }
}

/// Value `table` should hold for `board` if it is solved.
///
/// Positions with a shape get their classification whatever is stored;
/// everything else gets the negamax of its children, or the stored value
/// when no child contributes.
pub fn rederive(table: &PerfectPlayTable, board: &Board, mode: GameMode) -> Value {
    let stored = table.evaluate(board);
    let decided = classify(board, mode);
    if decided.is_terminal() || stored.is_terminal() {
        return decided;
    }
    match negamax(board.successors().map(|(_, child)| table.evaluate(&child))) {
        Value::Unknown => stored,
        value => value,
    }
}

pub struct Solver {
    encoder: StateEncoder,
    mode: GameMode,
    /// One entry per solved key; keys past the end read as unknown.
    values: Vec<Value>,
    passes: u32,
    initialized: bool,
    max_passes: Option<u32>,
    checkpoint_interval_secs: u64,
    log_interval_secs: u64,
    /// Solver statistics
    pub stats: SolverStats,
}

impl Solver {
    /// Fresh solver with every key unknown.
    pub fn new(config: &SolverConfig) -> Self {
        let encoder = StateEncoder::new();
        let len = Self::key_count(&encoder, config);
        Self {
            encoder,
            mode: config.mode,
            values: vec![Value::Unknown; len as usize],
            passes: 0,
            initialized: false,
            max_passes: config.max_passes,
            checkpoint_interval_secs: config.checkpoint_interval_secs,
            log_interval_secs: config.log_interval_secs,
            stats: SolverStats::new(),
        }
    }

    /// Resume from a checkpoint taken by a solver with the same
    /// configuration.
    pub fn from_checkpoint(
        config: &SolverConfig,
        checkpoint: Checkpoint,
    ) -> Result<Self, SolverError> {
        let mut solver = Self::new(config);
        if checkpoint.mode != solver.mode {
            return Err(SolverError::ModeMismatch {
                expected: solver.mode,
                found: checkpoint.mode,
            });
        }
        if checkpoint.values.len() != solver.values.len() {
            return Err(SolverError::SizeMismatch {
                expected: solver.values.len() as u64,
                found: checkpoint.values.len() as u64,
            });
        }
        solver.values = checkpoint.values;
        solver.passes = checkpoint.passes;
        solver.stats.passes = checkpoint.passes;
        solver.initialized = true;
        Ok(solver)
    }

    fn key_count(encoder: &StateEncoder, config: &SolverConfig) -> u64 {
        config
            .key_limit
            .map_or(encoder.max_key(), |limit| limit.min(encoder.max_key()))
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Completed back-propagation passes.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn encoder(&self) -> &StateEncoder {
        &self.encoder
    }

    #[inline]
    pub fn get(&self, key: u64) -> Value {
        self.values.get(key as usize).copied().unwrap_or(Value::Unknown)
    }

    /// Overwrite one entry. Returns false if the key is outside the solved
    /// range.
    pub fn set_value(&mut self, key: u64, value: Value) -> bool {
        match self.values.get_mut(key as usize) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Classify every key from scratch.
    pub fn initialization_pass(&mut self) -> Result<(), SolverError> {
        for key in 0..self.values.len() {
            let board = self.encoder.decode(key as u64)?;
            let value = classify(&board, self.mode);
            self.stats.record_initial(value);
            self.values[key] = value;
        }
        self.initialized = true;
        Ok(())
    }

    /// Value of a position from the current buffer: the negamax of its
    /// children, or `Unknown` if none contributes.
    pub fn retrograde_evaluate(&self, board: &Board) -> Value {
        negamax(
            board
                .successors()
                .map(|(_, child)| self.get(self.encoder.encode(&child))),
        )
    }

    /// One full sweep. Returns the number of keys that changed.
    pub fn back_propagation_pass(&mut self) -> Result<u64, SolverError> {
        let running = AtomicBool::new(true);
        Ok(self.sweep(&running)?.unwrap_or(0))
    }

    /// Sweep all keys once, or until `running` is cleared (`None`).
    fn sweep(&mut self, running: &AtomicBool) -> Result<Option<u64>, SolverError> {
        let len = self.values.len();
        self.stats.pass_changes = 0;

        for key in 0..len {
            if key % POLL_EVERY == 0 {
                if !running.load(Ordering::SeqCst) {
                    return Ok(None);
                }
                if self.stats.should_log(self.log_interval_secs) {
                    self.stats.log_progress(key as u64, len as u64);
                }
            }

            let current = self.values[key];
            if current.is_terminal() {
                continue;
            }
            let board = self.encoder.decode(key as u64)?;
            let value = self.retrograde_evaluate(&board);
            self.stats.keys_evaluated += 1;

            if value != current && value != Value::Unknown {
                self.values[key] = value;
                self.stats.pass_changes += 1;
            }
        }

        let changes = self.stats.pass_changes;
        self.stats.finish_pass();
        self.passes += 1;
        Ok(Some(changes))
    }

    /// Run passes until convergence, interruption or the pass limit.
    ///
    /// A checkpoint is written to `checkpoint_path` every
    /// `checkpoint_interval_secs` (checked between passes) and on
    /// interruption.
    pub fn solve(
        &mut self,
        running: Arc<AtomicBool>,
        checkpoint_path: &Path,
    ) -> Result<SolveOutcome, SolverError> {
        if !self.initialized {
            info!("Initializing {} keys ({:?} rules)...", self.values.len(), self.mode);
            let start = Instant::now();
            self.initialization_pass()?;
            info!(
                "Initialized in {:.2}s: wins={} losses={} illegal={} ties={}",
                start.elapsed().as_secs_f64(),
                self.stats.wins,
                self.stats.losses,
                self.stats.illegal,
                self.stats.ties,
            );
        } else {
            info!("Resuming after {} completed passes", self.passes);
        }

        let mut last_checkpoint = Instant::now();

        loop {
            if let Some(limit) = self.max_passes {
                if self.passes >= limit {
                    info!("Pass limit {} reached", limit);
                    return Ok(SolveOutcome::PassLimit {
                        passes: self.passes,
                    });
                }
            }

            let pass_start = Instant::now();
            let Some(changes) = self.sweep(&running)? else {
                warn!("Interrupted during pass {}", self.passes + 1);
                self.save_checkpoint(checkpoint_path)?;
                return Ok(SolveOutcome::Interrupted {
                    passes: self.passes,
                });
            };

            info!(
                "[{}] pass {} complete: changes={} in {:.2}s",
                format_clock(self.stats.elapsed_secs()),
                self.passes,
                changes,
                pass_start.elapsed().as_secs_f64(),
            );

            if changes == 0 {
                return Ok(SolveOutcome::Converged {
                    passes: self.passes,
                });
            }

            // Periodic checkpoint
            if last_checkpoint.elapsed().as_secs() >= self.checkpoint_interval_secs {
                self.save_checkpoint(checkpoint_path)?;
                last_checkpoint = Instant::now();
            }
        }
    }

    /// Write the working buffer as a checkpoint.
    pub fn save_checkpoint(&self, path: &Path) -> io::Result<usize> {
        info!("Saving checkpoint to {:?}...", path);
        let start = Instant::now();
        let count = Checkpoint::save(path, self.mode, self.passes, &self.values)?;
        info!(
            "Saved {} entries in {:.2}s",
            count,
            start.elapsed().as_secs_f64()
        );
        Ok(count)
    }

    /// Freeze the buffer into a read-only table.
    pub fn into_table(self) -> PerfectPlayTable {
        PerfectPlayTable::from_values(self.values)
    }
}
