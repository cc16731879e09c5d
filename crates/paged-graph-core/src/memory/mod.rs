//! Bit and page arithmetic, memory layout estimation and allocation tracking

/// Power-of-two helpers
pub mod bit_util;

/// Page index decomposition and page sizing
pub mod page_util;

/// Memory layout configuration and size estimators
pub mod layout;

/// Byte ledger passed through constructors
pub mod tracker;

#[cfg(test)]
mod tests;

pub use layout::MemoryLayout;
pub use page_util::PageGeometry;
pub use tracker::AllocationTracker;
