//! Type definitions shared across the paged structures

/// Error types for construction, merging and layout configuration
pub mod error;

pub use error::{MemoryError, Result};
