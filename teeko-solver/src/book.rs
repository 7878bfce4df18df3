//! Plain-text book: one signed value byte per line, in key order.
//!
//! This is the interchange format of the finished table. It is slow and
//! about four times larger than a checkpoint, but trivially readable from
//! any language.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use teeko_core::PerfectPlayTable;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BookError {
    #[error("book I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("line {line}: cannot parse {text:?} as an integer")]
    Parse { line: usize, text: String },

    #[error("line {line}: value {value} outside the signed byte range")]
    OutOfRange { line: usize, value: i64 },

    #[error("book has {actual} entries, expected {expected}")]
    Length { expected: u64, actual: u64 },
}

/// Load a book. The entry count is not checked: keys past the end of a
/// short book read as unknown, extra lines are kept but never looked up.
pub fn load(path: &Path) -> Result<PerfectPlayTable, BookError> {
    let reader = BufReader::new(File::open(path)?);
    let mut bytes = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let text = line.trim();
        let value: i64 = text.parse().map_err(|_| BookError::Parse {
            line: idx + 1,
            text: text.to_string(),
        })?;
        let byte = i8::try_from(value).map_err(|_| BookError::OutOfRange {
            line: idx + 1,
            value,
        })?;
        bytes.push(byte);
    }
    Ok(PerfectPlayTable::from_bytes(&bytes))
}

/// Load a book that must have exactly `max_key` entries.
pub fn load_exact(path: &Path, max_key: u64) -> Result<PerfectPlayTable, BookError> {
    let table = load(path)?;
    let actual = table.len() as u64;
    if actual != max_key {
        return Err(BookError::Length {
            expected: max_key,
            actual,
        });
    }
    Ok(table)
}

/// Write every entry of `table`, one per line. Returns the entry count.
pub fn save(path: &Path, table: &PerfectPlayTable) -> Result<usize, BookError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for byte in table.bytes() {
        writeln!(writer, "{}", byte)?;
    }
    writer.flush()?;
    Ok(table.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use teeko_core::Value;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("teeko_book_{}_{}.txt", name, std::process::id()))
    }

    #[test]
    fn test_book_roundtrip() {
        let path = temp_path("roundtrip");
        let table = PerfectPlayTable::from_values(vec![
            Value::Tie,
            Value::Distance(-3),
            Value::Win,
            Value::Illegal,
            Value::Lose,
        ]);
        assert_eq!(save(&path, &table).unwrap(), 5);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "0\n-3\n126\n-128\n-126\n");

        let loaded = load(&path).unwrap();
        assert_eq!(loaded.values(), table.values());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_book_short_file_reads_unknown() {
        let path = temp_path("short");
        std::fs::write(&path, "0\n5\n").unwrap();

        let table = load(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(1), Value::Distance(5));
        assert_eq!(table.get(2), Value::Unknown);

        let err = load_exact(&path, 3).unwrap_err();
        assert!(matches!(err, BookError::Length { expected: 3, actual: 2 }));
        assert!(load_exact(&path, 2).is_ok());

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_book_parse_errors() {
        let path = temp_path("parse");

        std::fs::write(&path, "0\n12\nwin\n").unwrap();
        match load(&path).unwrap_err() {
            BookError::Parse { line, text } => {
                assert_eq!(line, 3);
                assert_eq!(text, "win");
            }
            other => panic!("unexpected error: {}", other),
        }

        std::fs::write(&path, "0\n300\n").unwrap();
        assert!(matches!(
            load(&path).unwrap_err(),
            BookError::OutOfRange { line: 2, value: 300 }
        ));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_book_save_into_directory_fails() {
        let dir = std::env::temp_dir().join(format!("teeko_book_dir_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let table = PerfectPlayTable::from_values(vec![Value::Tie; 3]);
        assert!(matches!(save(&dir, &table), Err(BookError::Io(_))));

        std::fs::remove_dir(&dir).ok();
    }

    #[test]
    fn test_book_missing_file() {
        let err = load(Path::new("/nonexistent/teeko/book.txt")).unwrap_err();
        assert!(matches!(err, BookError::Io(_)));
    }
}
