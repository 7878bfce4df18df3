//! Compute statistics from a solved table.
//!
//! Usage: cargo run --release --bin stats [table.bin | book.txt]

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use teeko_core::{Board, PerfectPlayTable, Square, StateEncoder, Value};
use teeko_solver::book;
use teeko_solver::checkpoint::Checkpoint;

/// Load a table from a checkpoint or, for `.txt` files, a book.
fn load_table(path: &Path) -> Result<PerfectPlayTable> {
    println!("Loading table from {:?}...", path);
    let start = Instant::now();

    let table = if path.extension().is_some_and(|ext| ext == "txt") {
        book::load(path).with_context(|| format!("loading book {:?}", path))?
    } else {
        Checkpoint::load(path)
            .with_context(|| format!("loading checkpoint {:?}", path))?
            .into_table()
    };

    println!("Loaded {} entries in {:.2}s\n", table.len(), start.elapsed().as_secs_f64());
    Ok(table)
}

#[derive(Default)]
struct Tally {
    wins: u64,
    losses: u64,
    ties: u64,
    illegal: u64,
    unknown: u64,
    /// Longest forced win: (plies, key)
    longest_win: Option<(u8, u64)>,
}

impl Tally {
    fn add(&mut self, key: u64, value: Value) {
        match value {
            Value::Illegal => self.illegal += 1,
            Value::Unknown => self.unknown += 1,
            Value::Tie => self.ties += 1,
            v if v.is_winning() => {
                self.wins += 1;
                if let Some(plies) = v.plies() {
                    if self.longest_win.map_or(true, |(best, _)| plies > best) {
                        self.longest_win = Some((plies, key));
                    }
                }
            }
            v if v.is_losing() => self.losses += 1,
            _ => self.unknown += 1,
        }
    }

    fn total(&self) -> u64 {
        self.wins + self.losses + self.ties + self.illegal + self.unknown
    }
}

/// Value distribution per (opponent, mover) bucket
fn bucket_distribution(table: &PerfectPlayTable) -> Tally {
    println!("=== Value Distribution by Bucket ===");
    println!(
        "{:>6} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10}",
        "(o,p)", "keys", "wins", "losses", "ties", "illegal", "unknown"
    );

    let encoder = table.encoder();
    let mut overall = Tally::default();

    for bucket in encoder.buckets() {
        let mut tally = Tally::default();
        for key in bucket.base..bucket.base + bucket.len {
            let value = table.get(key);
            tally.add(key, value);
            overall.add(key, value);
        }
        println!(
            "{:>6} {:>12} {:>12} {:>12} {:>12} {:>10} {:>10}",
            format!("({},{})", bucket.opponent_count, bucket.mover_count),
            tally.total(),
            tally.wins,
            tally.losses,
            tally.ties,
            tally.illegal,
            tally.unknown,
        );
    }

    let total = overall.total().max(1) as f64;
    println!();
    println!("Wins:    {} ({:.2}%)", overall.wins, 100.0 * overall.wins as f64 / total);
    println!("Losses:  {} ({:.2}%)", overall.losses, 100.0 * overall.losses as f64 / total);
    println!("Ties:    {} ({:.2}%)", overall.ties, 100.0 * overall.ties as f64 / total);
    println!("Illegal: {}", overall.illegal);
    println!("Unknown: {}", overall.unknown);
    println!();
    overall
}

/// Board as a 5x5 grid, row 4 on top. `X` is the side to move.
fn render(board: &Board) -> String {
    let mut out = String::new();
    for row in (0..5u8).rev() {
        for col in 0..5u8 {
            let bit = Square::from_col_row(col, row).bit();
            let cell = if board.mover_positions() & bit != 0 {
                'X'
            } else if board.occupied_positions() & bit != 0 {
                'O'
            } else {
                '.'
            };
            out.push(cell);
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

fn opening_report(table: &PerfectPlayTable) {
    println!("=== Opening ===");
    let board = Board::new();
    println!("Initial position: {}", table.evaluate(&board));

    let encoder = StateEncoder::new();
    println!("Value of each first drop (for the side that dropped):");
    for row in (0..5u8).rev() {
        let line: Vec<String> = (0..5u8)
            .map(|col| {
                let mut child = board;
                child.drop_marker(Square::from_col_row(col, row).bit());
                match table.get(encoder.encode(&child)).score() {
                    Some(score) => format!("{:>5}", -(score as i16)),
                    None => format!("{:>5}", "?"),
                }
            })
            .collect();
        println!("  {}", line.join(""));
    }
    if let Some(square) = table.best_drop(&board).and_then(Square::from_bit) {
        println!("Best first drop: column {} row {}", square.col(), square.row());
    }
    println!();
}

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/teeko.bin"));

    let table = load_table(&path)?;
    if !table.is_complete() {
        println!("Warning: table covers {} of {} keys\n", table.len(), table.encoder().max_key());
    }

    let overall = bucket_distribution(&table);
    opening_report(&table);

    if let Some((plies, key)) = overall.longest_win {
        println!("=== Longest Forced Win ===");
        println!("Key {}: win in {} plies", key, plies);
        let board = table.encoder().decode(key)?;
        print!("{}", render(&board));
    }
    Ok(())
}
