//! Retrograde solver for the Teeko perfect-play table.
//!
//! [`solver::Solver`] fills a working buffer over the dense key space of
//! `teeko-core`; [`checkpoint`] and [`book`] persist it, and
//! [`solver::Solver::into_table`] hands over the finished read-only table.

pub mod book;
pub mod checkpoint;
pub mod config;
pub mod solver;
pub mod stats;

pub use config::{ConfigError, SolverConfig};
pub use solver::{classify, rederive, SolveOutcome, Solver, SolverError};
