//! Error types for the index and the batch tooling built on it.

use thiserror::Error;

/// Errors surfaced by nearest-tz.
///
/// A point that simply is not in the tree is not an error: lookups and removals
/// report absence through `Option`/`bool` results.
#[derive(Debug, Error)]
pub enum TzError {
    /// A point or argument the operation cannot accept. Nothing was mutated.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A record line that could not be parsed into coordinates.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker {0} panicked while resolving its partition")]
    WorkerPanicked(usize),
}

pub type Result<T> = std::result::Result<T, TzError>;
