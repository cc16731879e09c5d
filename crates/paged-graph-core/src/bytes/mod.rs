//! Paged byte store for variable-length records
//!
//! Adjacency-style integer sequences are stored as delta runs: a big-endian
//! element count followed by varint deltas (see [`varint`]). The store grows
//! on demand while workers write through their own [`LocalAllocator`].

/// Varint, zig-zag and delta-run encoding
pub mod varint;

/// The paged byte store
pub mod byte_array;

/// Bump allocation and sequential writers
pub mod allocator;

/// Delta-run decoding cursor
pub mod cursor;


pub use allocator::{BulkAdder, LocalAllocator};
pub use byte_array::ByteArray;
pub use cursor::DeltaCursor;
