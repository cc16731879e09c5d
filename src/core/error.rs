//! Error types for the paged-graph runtime
//!
//! Failures of the paged structures themselves are [`MemoryError`]s from the
//! core crate; this type adds configuration, I/O and metrics failures on top.

use paged_graph_core::MemoryError;
use thiserror::Error;

/// Main result type of the root crate
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type of the root crate
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Failure reported by a paged structure or the memory layout
    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    /// I/O errors from std
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Prometheus metrics errors
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
