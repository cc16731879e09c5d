//! Element types of the huge array family

use crate::memory::MemoryLayout;

/// An element that can be stored in a [`HugeArray`](super::HugeArray)
///
/// `Default` is the value of a fresh slot and the value `copy_to` writes into
/// the tail of a destination.
pub trait HugeElement: Clone + Default + Send + Sync + 'static {
    /// Bytes one element occupies in a page under `layout`
    fn element_bytes(layout: &MemoryLayout) -> u64;
}

impl HugeElement for i32 {
    #[inline]
    fn element_bytes(_: &MemoryLayout) -> u64 {
        4
    }
}

impl HugeElement for i64 {
    #[inline]
    fn element_bytes(_: &MemoryLayout) -> u64 {
        8
    }
}

impl HugeElement for f64 {
    #[inline]
    fn element_bytes(_: &MemoryLayout) -> u64 {
        8
    }
}

/// Object slots hold a reference; the referenced values are not accounted
impl<T: Clone + Send + Sync + 'static> HugeElement for Option<T> {
    #[inline]
    fn element_bytes(layout: &MemoryLayout) -> u64 {
        layout.reference_bytes
    }
}
