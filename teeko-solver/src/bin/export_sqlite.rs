//! Export binary checkpoint to SQLite database.
//!
//! Usage: export_sqlite [input.bin] [output.db]
//!
//! Writes one row per key so a game front end can look values up on
//! demand without loading the whole table.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{ensure, Context, Result};
use rusqlite::{params, Connection};

use teeko_solver::checkpoint::Checkpoint;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    let input_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("data/teeko.bin")
    };

    let output_path = if args.len() > 2 {
        PathBuf::from(&args[2])
    } else {
        PathBuf::from("data/teeko.db")
    };

    println!("Binary to SQLite Exporter");
    println!("=========================");
    println!("Input:  {:?}", input_path);
    println!("Output: {:?}", output_path);
    println!();

    // Load binary checkpoint
    println!("Loading binary checkpoint...");
    let start = Instant::now();
    let checkpoint = Checkpoint::load(&input_path)
        .with_context(|| format!("Failed to load checkpoint {:?}", input_path))?;
    println!(
        "Loaded {} entries in {:.2}s",
        checkpoint.values.len(),
        start.elapsed().as_secs_f64()
    );

    // Remove existing output file if present
    if output_path.exists() {
        std::fs::remove_file(&output_path)
            .with_context(|| format!("Failed to remove {:?}", output_path))?;
    }

    // Create SQLite database
    println!("\nCreating SQLite database...");
    let start = Instant::now();

    let conn = Connection::open(&output_path).context("Failed to create database")?;

    conn.execute(
        "CREATE TABLE positions (
            key INTEGER PRIMARY KEY,
            value INTEGER NOT NULL
        )",
        [],
    )
    .context("Failed to create table")?;

    println!("Inserting {} entries...", checkpoint.values.len());

    let batch_size = 1_000_000;
    let total = checkpoint.values.len();

    // Use a transaction for much faster inserts
    let tx = conn
        .unchecked_transaction()
        .context("Failed to start transaction")?;

    {
        let mut stmt = tx
            .prepare("INSERT INTO positions (key, value) VALUES (?1, ?2)")
            .context("Failed to prepare statement")?;

        for (key, value) in checkpoint.values.iter().enumerate() {
            stmt.execute(params![key as i64, value.to_byte() as i32])
                .with_context(|| format!("Failed to insert key {}", key))?;

            if (key + 1) % batch_size == 0 {
                let inserted = key + 1;
                let pct = 100.0 * inserted as f64 / total as f64;
                let rate = inserted as f64 / start.elapsed().as_secs_f64();
                println!("  {:>3.0}% ({}/{}) - {:.0} rows/sec", pct, inserted, total, rate);
            }
        }
    }

    tx.commit().context("Failed to commit transaction")?;

    let insert_time = start.elapsed().as_secs_f64();
    println!(
        "Inserted {} entries in {:.2}s ({:.0} rows/sec)",
        total,
        insert_time,
        total as f64 / insert_time
    );

    // Spot-check a few lookups
    println!("\nVerifying database...");
    let step = (total / 5).max(1);
    for key in (0..total).step_by(step).take(5) {
        let stored: i32 = conn
            .query_row(
                "SELECT value FROM positions WHERE key = ?1",
                params![key as i64],
                |row| row.get(0),
            )
            .with_context(|| format!("Failed to query key {}", key))?;

        let expected = checkpoint.values[key].to_byte() as i32;
        ensure!(stored == expected, "Value mismatch for key {}: {} != {}", key, stored, expected);
    }
    println!("Verification passed!");

    // Report file sizes
    let input_size = std::fs::metadata(&input_path).map(|m| m.len()).unwrap_or(0);
    let output_size = std::fs::metadata(&output_path).map(|m| m.len()).unwrap_or(0);

    println!("\nFile sizes:");
    println!("  Binary: {:.1} MB", input_size as f64 / 1024.0 / 1024.0);
    println!("  SQLite: {:.1} MB", output_size as f64 / 1024.0 / 1024.0);

    println!("\nDone! Database created at {:?}", output_path);
    Ok(())
}
