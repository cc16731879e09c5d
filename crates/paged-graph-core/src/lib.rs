//! # Paged Graph Core
//!
//! Paged memory structures for graph analytics.
//!
//! Algorithms address collections far larger than a single flat allocation
//! through fixed-size pages, while every allocation is accounted against an
//! [`AllocationTracker`](memory::AllocationTracker). The crate is synchronous
//! and carries no runtime of its own.

#![warn(missing_docs)]

/// Logging macros
pub mod core;

/// Error types
pub mod types;

/// Page shifts and byte budgets
pub mod constants;

/// Bit and page arithmetic, memory layout estimation, allocation tracking
pub mod memory;

/// Growable paged structures built on a shared page container
pub mod paged;

/// Fixed-capacity arrays addressable beyond 31 bits
pub mod huge;

/// Paged byte store with varint delta records
pub mod bytes;

/// Union-find over huge and paged storage
pub mod dss;

// Re-export commonly used items
pub use types::error::{MemoryError, Result};
pub use memory::{AllocationTracker, MemoryLayout};
pub use huge::{HugeArray, HugeCursor, HugeArrayBuilder, HugeDoubleArray, HugeIntArray, HugeLongArray, HugeObjectArray};
pub use paged::{DoubleArray, IntArray, LongArray, PagedDataStructure, PagedLongLongDoubleMap, PagedLongLongMap};
pub use bytes::{ByteArray, DeltaCursor, LocalAllocator};
pub use dss::{HugeDisjointSetStruct, IdMapping, PagedDisjointSetStruct};
