//! Growable paged structures
//!
//! Everything here is built on [`PagedDataStructure`]: a page array that can
//! grow while other threads read and write it. Elements live in atomic slots,
//! so all element operations take `&self`.

/// Atomic element slots
pub mod slot;

/// Page factories bound to allocation trackers
pub mod page_allocator;

/// Capacity-tracked page container with concurrent growth
pub mod paged_data_structure;

/// Growable int, long and double arrays
pub mod array;

/// Arrays with sequentially consistent element operations
pub mod atomic_array;

/// Sparse long array with lazily allocated pages
pub mod sparse;

/// Paged long stack
pub mod stack;

/// Paged bitset
pub mod bitset;

/// Paged map from dense ids to longs
pub mod long_map;

/// Paged map from dense ids to small long-to-double maps
pub mod long_long_double_map;

#[cfg(test)]
mod tests;

pub use array::{DoubleArray, IntArray, LongArray, PagedArray};
pub use atomic_array::{AtomicIntArray, PagedAtomicArray, PagedAtomicDoubleArray, PagedAtomicIntegerArray};
pub use bitset::PagedSimpleBitSet;
pub use long_long_double_map::PagedLongLongDoubleMap;
pub use long_map::PagedLongLongMap;
pub use page_allocator::{PageAllocator, PageAllocatorFactory};
pub use paged_data_structure::PagedDataStructure;
pub use slot::{AtomicF64, AtomicSlot, IntegerSlot};
pub use sparse::SparseLongArray;
pub use stack::PagedLongStack;
