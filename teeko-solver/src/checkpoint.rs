//! Binary checkpoint format for solver state.
//!
//! Format:
//! - Header (32 bytes):
//!   - Magic: "TKO1" (4 bytes)
//!   - Version: u32 LE (4 bytes)
//!   - Entry count: u64 LE (8 bytes)
//!   - Checksum: u64 LE xxhash of data section (8 bytes)
//!   - Passes: u32 LE completed back-propagation passes (4 bytes)
//!   - Mode: u8, 0 = regular, 1 = advanced (1 byte)
//!   - Reserved: 3 bytes (zeros)
//! - Data section (entry_count × 1 byte):
//!   - Value byte of each key, in key order
//!
//! Keys are implicit, so a checkpoint of the full key space is just over
//! 92 MiB.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use teeko_core::{GameMode, PerfectPlayTable, Value};
use xxhash_rust::xxh64::xxh64;

const MAGIC: &[u8; 4] = b"TKO1";
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 32;

#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub mode: GameMode,
    /// Back-propagation passes completed when the checkpoint was taken.
    pub passes: u32,
    pub values: Vec<Value>,
}

fn le_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn le_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

fn invalid(message: impl Into<String>) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message.into())
}

impl Checkpoint {
    /// Save solver values to a binary checkpoint file.
    ///
    /// Writes to a sibling temporary file first and renames it into place,
    /// so an interrupted save never clobbers the previous checkpoint.
    pub fn save(path: &Path, mode: GameMode, passes: u32, values: &[Value]) -> io::Result<usize> {
        let count = values.len();

        // Build data section
        let data: Vec<u8> = values.iter().map(|v| v.to_byte() as u8).collect();

        // Compute checksum
        let checksum = xxh64(&data, 0);

        let tmp_path = path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);

            // Header
            writer.write_all(MAGIC)?;
            writer.write_all(&VERSION.to_le_bytes())?;
            writer.write_all(&(count as u64).to_le_bytes())?;
            writer.write_all(&checksum.to_le_bytes())?;
            writer.write_all(&passes.to_le_bytes())?;
            writer.write_all(&[mode.to_byte()])?;
            writer.write_all(&[0u8; 3])?; // Reserved

            // Data
            writer.write_all(&data)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;

        Ok(count)
    }

    /// Load checkpoint from binary file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        // Read header
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        // Validate magic
        if &header[0..4] != MAGIC {
            return Err(invalid("Invalid checkpoint magic"));
        }

        // Parse header
        let version = le_u32(&header[4..8]);
        if version != VERSION {
            return Err(invalid(format!("Unsupported checkpoint version: {}", version)));
        }

        let count = usize::try_from(le_u64(&header[8..16]))
            .map_err(|_| invalid("Checkpoint entry count does not fit in memory"))?;
        let stored_checksum = le_u64(&header[16..24]);
        let passes = le_u32(&header[24..28]);
        let mode = GameMode::from_byte(header[28])
            .ok_or_else(|| invalid(format!("Unknown game mode byte: {}", header[28])))?;

        // Read data section
        let mut data = vec![0u8; count];
        reader.read_exact(&mut data)?;

        // Verify checksum
        let computed_checksum = xxh64(&data, 0);
        if computed_checksum != stored_checksum {
            return Err(invalid("Checkpoint checksum mismatch"));
        }

        let values = data.iter().map(|&b| Value::from_byte(b as i8)).collect();

        Ok(Checkpoint {
            mode,
            passes,
            values,
        })
    }

    /// Read-only table of the stored values.
    pub fn into_table(self) -> PerfectPlayTable {
        PerfectPlayTable::from_values(self.values)
    }

    /// Get file size for a given number of entries.
    pub fn estimate_size(count: usize) -> usize {
        HEADER_SIZE + count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("teeko_{}_{}.bin", name, std::process::id()))
    }

    fn sample_values() -> Vec<Value> {
        vec![
            Value::Tie,
            Value::Win,
            Value::Lose,
            Value::Illegal,
            Value::Unknown,
            Value::Distance(-17),
            Value::Distance(99),
        ]
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let path = temp_path("roundtrip");
        let values = sample_values();

        let saved = Checkpoint::save(&path, GameMode::Regular, 12, &values).unwrap();
        assert_eq!(saved, values.len());
        assert_eq!(
            std::fs::metadata(&path).unwrap().len() as usize,
            Checkpoint::estimate_size(values.len())
        );

        let loaded = Checkpoint::load(&path).unwrap();
        assert_eq!(loaded.mode, GameMode::Regular);
        assert_eq!(loaded.passes, 12);
        assert_eq!(loaded.values, values);
        assert_eq!(loaded.into_table().get(5), Value::Distance(-17));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_checkpoint_rejects_corrupt_data() {
        let path = temp_path("corrupt");
        Checkpoint::save(&path, GameMode::Advanced, 3, &sample_values()).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x55;
        std::fs::write(&path, &bytes).unwrap();

        let err = Checkpoint::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert!(err.to_string().contains("checksum"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_checkpoint_rejects_bad_header() {
        let path = temp_path("header");
        Checkpoint::save(&path, GameMode::Advanced, 0, &sample_values()).unwrap();
        let good = std::fs::read(&path).unwrap();

        // Wrong magic
        let mut bytes = good.clone();
        bytes[0] = b'X';
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap_err().kind(), io::ErrorKind::InvalidData);

        // Unknown version
        let mut bytes = good.clone();
        bytes[4] = 9;
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap_err().kind(), io::ErrorKind::InvalidData);

        // Unknown mode
        let mut bytes = good;
        bytes[28] = 7;
        std::fs::write(&path, &bytes).unwrap();
        assert_eq!(Checkpoint::load(&path).unwrap_err().kind(), io::ErrorKind::InvalidData);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_checkpoint_truncated() {
        let path = temp_path("truncated");
        Checkpoint::save(&path, GameMode::Advanced, 0, &sample_values()).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 2]).unwrap();

        let err = Checkpoint::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        std::fs::remove_file(&path).ok();
    }
}
