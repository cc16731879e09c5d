//! Error types for the paged memory structures
//!
//! Only faults that can be detected before touching storage are reported
//! through `Result`: capacity checks at construction, mismatched merges,
//! narrowing casts and layout configuration. Out-of-range element access is a
//! caller contract and panics instead.

use thiserror::Error;

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, MemoryError>;

/// Errors raised by the paged memory structures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryError {
    /// Requested size cannot be represented by the paging scheme
    #[error("Requested capacity {requested} exceeds the maximum of {max} for this structure")]
    CapacityExceeded {
        /// Requested number of elements
        requested: u64,
        /// Largest supported number of elements
        max: u64,
    },

    /// Two structures that must share a capacity do not
    #[error("Different Capacity: expected {expected}, got {actual}")]
    MismatchedCapacity {
        /// Capacity of the receiving structure
        expected: u64,
        /// Capacity of the argument
        actual: u64,
    },

    /// A count does not fit the narrower index type it is converted to
    #[error("Length {length} does not fit into a single array (max {max})")]
    IndexOverflow {
        /// Length that was requested
        length: u64,
        /// Largest length a single array can hold
        max: u64,
    },

    /// Memory layout configuration is invalid or was changed after first use
    #[error("Invalid memory layout: {0}")]
    InvalidLayout(String),
}

impl MemoryError {
    /// Create a capacity error
    pub fn capacity(requested: u64, max: u64) -> Self {
        Self::CapacityExceeded { requested, max }
    }

    /// Create a layout error
    pub fn layout(msg: impl Into<String>) -> Self {
        Self::InvalidLayout(msg.into())
    }
}
