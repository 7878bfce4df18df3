//! Check a solved checkpoint for internal consistency.
//!
//! Usage: cargo run --release --bin verify [table.bin] [stride]
//!
//! Every key of the small buckets and every `stride`-th key beyond them is
//! re-derived: keys holding a shape, or stored as decided, must match their
//! classification; all others must equal the negamax of their children.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};

use teeko_core::PerfectPlayTable;
use teeko_solver::checkpoint::Checkpoint;
use teeko_solver::rederive;

/// Keys below this bound are always checked.
const EXHAUSTIVE_BELOW: u64 = 83_426;
const DEFAULT_STRIDE: u64 = 997;
const MAX_REPORTED: usize = 10;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let path = args
        .get(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/teeko.bin"));
    let stride = match args.get(2) {
        Some(s) => s.parse().with_context(|| format!("invalid stride {:?}", s))?,
        None => DEFAULT_STRIDE,
    };

    println!("Loading checkpoint from {:?}...", path);
    let start = Instant::now();
    let checkpoint = Checkpoint::load(&path).with_context(|| format!("loading {:?}", path))?;
    let mode = checkpoint.mode;
    println!(
        "Loaded {} entries ({:?} rules, {} passes) in {:.2}s",
        checkpoint.values.len(),
        mode,
        checkpoint.passes,
        start.elapsed().as_secs_f64()
    );
    let table: PerfectPlayTable = checkpoint.into_table();
    let encoder = *table.encoder();

    if !table.is_complete() {
        println!(
            "Note: table covers {} of {} keys; missing children read as unknown",
            table.len(),
            encoder.max_key()
        );
    }

    println!("\n--- Checking keys (stride {}) ---", stride);
    let start = Instant::now();
    let len = table.len() as u64;
    let sampled = (EXHAUSTIVE_BELOW..len).step_by(stride.max(1) as usize);
    let keys = (0..len.min(EXHAUSTIVE_BELOW)).chain(sampled);

    let mut checked = 0u64;
    let mut mismatches = Vec::new();

    for key in keys {
        let stored = table.get(key);
        let board = encoder.decode(key)?;

        let expected = rederive(&table, &board, mode);
        checked += 1;

        if expected != stored {
            mismatches.push((key, stored, expected));
        }
    }

    println!("Checked {} keys in {:.2}s", checked, start.elapsed().as_secs_f64());

    let initial = table.get(0);
    println!("Initial position: {}", initial);

    if mismatches.is_empty() {
        println!("Verification passed!");
        return Ok(());
    }

    println!("\n{} mismatches:", mismatches.len());
    for (key, stored, expected) in mismatches.iter().take(MAX_REPORTED) {
        println!("  key {}: stored {:?}, expected {:?}", key, stored, expected);
    }
    bail!("verification failed with {} mismatches", mismatches.len())
}
