//! Fixed-capacity huge arrays
//!
//! Capacity is fixed at construction; see [`HugeArray`] for the dual
//! representation. Bulk reads go through [`HugeCursor`], concurrent bulk
//! writes through [`HugeArrayBuilder`].

/// Element types and their byte widths
pub mod element;

/// Single-page and paged array representations
pub mod huge_array;

/// Slice-at-a-time traversal
pub mod cursor;

/// Disjoint range claims for parallel filling
pub mod builder;


pub use builder::{HugeArrayBuilder, HugeBulkAdder};
pub use cursor::HugeCursor;
pub use element::HugeElement;
pub use huge_array::{
    HugeArray, HugeDoubleArray, HugeIntArray, HugeLongArray, HugeObjectArray, HUGE_GEOMETRY,
};
