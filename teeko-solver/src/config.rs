//! Solver configuration and command-line parsing.

use std::path::PathBuf;

use teeko_core::GameMode;
use thiserror::Error;

pub const USAGE: &str = "\
usage: solver [--regular | --advanced] [--limit N] [--max-passes N]
              [--checkpoint PATH] [--book PATH]
              [--checkpoint-interval SECS] [--log-interval SECS]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown argument: {0}")]
    UnknownFlag(String),

    #[error("{flag} expects a value")]
    MissingValue { flag: String },

    #[error("{flag}: invalid number {value:?}")]
    InvalidNumber { flag: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    pub mode: GameMode,
    /// Solve only keys below this bound; `None` for the whole key space.
    pub key_limit: Option<u64>,
    /// Stop after this many back-propagation passes even if not converged.
    pub max_passes: Option<u32>,
    pub checkpoint_path: PathBuf,
    pub book_path: PathBuf,
    pub checkpoint_interval_secs: u64,
    pub log_interval_secs: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            mode: GameMode::Advanced,
            key_limit: None,
            max_passes: None,
            checkpoint_path: PathBuf::from("data/teeko.bin"),
            book_path: PathBuf::from("data/book.txt"),
            checkpoint_interval_secs: 300,
            log_interval_secs: 5,
        }
    }
}

impl SolverConfig {
    /// Parse flags (without the program name) on top of the defaults.
    pub fn from_args<I, S>(args: I) -> Result<SolverConfig, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut config = SolverConfig::default();
        let mut args = args.into_iter().map(Into::into);

        while let Some(flag) = args.next() {
            match flag.as_str() {
                "--regular" => config.mode = GameMode::Regular,
                "--advanced" => config.mode = GameMode::Advanced,
                "--limit" => config.key_limit = Some(parse_number(&flag, &mut args)?),
                "--max-passes" => config.max_passes = Some(parse_number(&flag, &mut args)?),
                "--checkpoint" => config.checkpoint_path = next_value(&flag, &mut args)?.into(),
                "--book" => config.book_path = next_value(&flag, &mut args)?.into(),
                "--checkpoint-interval" => {
                    config.checkpoint_interval_secs = parse_number(&flag, &mut args)?
                }
                "--log-interval" => config.log_interval_secs = parse_number(&flag, &mut args)?,
                _ => return Err(ConfigError::UnknownFlag(flag)),
            }
        }
        Ok(config)
    }
}

fn next_value(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, ConfigError> {
    args.next().ok_or_else(|| ConfigError::MissingValue {
        flag: flag.to_string(),
    })
}

fn parse_number<T: std::str::FromStr>(
    flag: &str,
    args: &mut impl Iterator<Item = String>,
) -> Result<T, ConfigError> {
    let value = next_value(flag, args)?;
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        flag: flag.to_string(),
        value,
    })
}
