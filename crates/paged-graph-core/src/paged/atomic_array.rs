//! Arrays with sequentially consistent per-element atomics
//!
//! These variants are fixed in size once created and are meant for parallel
//! algorithms that communicate through individual elements (scores, labels,
//! counters). Atomicity holds at single-element granularity only.

use std::fmt;
use std::sync::atomic::{AtomicI32, Ordering};

use crate::constants::MAX_ARRAY_LENGTH;
use crate::memory::layout::{size_of_instance, MemoryLayout};
use crate::memory::AllocationTracker;
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::paged::slot::{AtomicF64, AtomicSlot};
use crate::types::error::{MemoryError, Result};

/// Paged array of atomic 32-bit integers
pub type PagedAtomicIntegerArray = PagedAtomicArray<AtomicI32>;

/// Paged array of atomic 64-bit floats
pub type PagedAtomicDoubleArray = PagedAtomicArray<AtomicF64>;

/// Fixed-size paged array with sequentially consistent element operations
pub struct PagedAtomicArray<A: AtomicSlot> {
    inner: PagedDataStructure<Box<[A]>>,
}

impl<A: AtomicSlot> PagedAtomicArray<A> {
    fn factory() -> PageAllocatorFactory<Box<[A]>> {
        PageAllocatorFactory::of_array()
    }

    /// Estimated bytes of an array of `size` elements
    pub fn estimate_memory_usage(size: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(size)
    }

    /// Create an array of `size` zeroed elements
    pub fn new_array(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self { inner: PagedDataStructure::new(size, allocator)? })
    }

    /// Element at `index`
    #[inline]
    pub fn get(&self, index: usize) -> A::Value {
        debug_assert!(index < self.size());
        self.inner.with_page(index, |page, offset| page[offset].load(Ordering::SeqCst))
    }

    /// Store `value` at `index`
    #[inline]
    pub fn set(&self, index: usize, value: A::Value) {
        debug_assert!(index < self.size());
        self.inner.with_page(index, |page, offset| page[offset].store(value, Ordering::SeqCst))
    }

    /// Atomically add `delta` at `index`, returning the new element
    #[inline]
    pub fn add(&self, index: usize, delta: A::Value) -> A::Value {
        debug_assert!(index < self.size());
        self.inner.with_page(index, |page, offset| {
            A::add(page[offset].fetch_add(delta, Ordering::SeqCst), delta)
        })
    }

    /// Atomically store `update` at `index` if it holds `expected`
    #[inline]
    pub fn compare_and_set(&self, index: usize, expected: A::Value, update: A::Value) -> bool {
        debug_assert!(index < self.size());
        self.inner.with_page(index, |page, offset| {
            page[offset]
                .compare_exchange(expected, update, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        })
    }

    /// Atomically replace the element at `index` with `f(current)`, returning the new element
    pub fn update(&self, index: usize, f: impl Fn(A::Value) -> A::Value) -> A::Value {
        debug_assert!(index < self.size());
        self.inner.with_page(index, |page, offset| {
            let slot = &page[offset];
            let mut current = slot.load(Ordering::SeqCst);
            loop {
                let next = f(current);
                match slot.compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst) {
                    Ok(_) => return next,
                    Err(actual) => current = actual,
                }
            }
        })
    }

    /// Number of elements
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Drop the pages, returning the estimated bytes they held (0 on repeat)
    pub fn release(&self) -> u64 {
        self.inner.release()
    }
}

impl<A: AtomicSlot> fmt::Debug for PagedAtomicArray<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedAtomicArray").field("size", &self.size()).finish()
    }
}

/// Flat array of atomic 32-bit integers for sizes that fit one allocation
pub struct AtomicIntArray {
    data: Box<[AtomicI32]>,
}

impl AtomicIntArray {
    /// Estimated bytes of an array of `size` elements
    pub fn estimate_memory_usage(size: usize) -> u64 {
        size_of_instance::<Self>().saturating_add(MemoryLayout::global().size_of_int_array(size as u64))
    }

    /// Create an array of `size` zeroed elements
    pub fn new_array(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        if size > MAX_ARRAY_LENGTH {
            return Err(MemoryError::capacity(size as u64, MAX_ARRAY_LENGTH as u64));
        }
        tracker.add(Self::estimate_memory_usage(size));
        Ok(Self { data: (0..size).map(|_| AtomicI32::new(0)).collect() })
    }

    /// Element at `index`
    #[inline]
    pub fn get(&self, index: usize) -> i32 {
        self.data[index].load(Ordering::SeqCst)
    }

    /// Store `value` at `index`
    #[inline]
    pub fn set(&self, index: usize, value: i32) {
        self.data[index].store(value, Ordering::SeqCst)
    }

    /// Atomically add `delta` at `index`, returning the new element
    #[inline]
    pub fn add(&self, index: usize, delta: i32) -> i32 {
        self.data[index].fetch_add(delta, Ordering::SeqCst).wrapping_add(delta)
    }

    /// Atomically store `update` at `index` if it holds `expected`
    #[inline]
    pub fn compare_and_set(&self, index: usize, expected: i32, update: i32) -> bool {
        self.data[index]
            .compare_exchange(expected, update, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Set every element to 0
    pub fn clear(&self) {
        for slot in self.data.iter() {
            slot.store(0, Ordering::SeqCst);
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the array has no elements
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for AtomicIntArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.data.iter().map(|v| v.load(Ordering::Relaxed))).finish()
    }
}
