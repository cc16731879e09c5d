//! Growable arrays of primitive elements
//!
//! [`IntArray`], [`LongArray`] and [`DoubleArray`] are direct get/set wrappers
//! over a [`PagedDataStructure`] whose pages are slices of atomic slots. Each
//! element access is atomic with relaxed ordering, so concurrent writers to
//! the same index never tear, but no ordering between different elements is
//! implied. Use the atomic array variants when that is needed.

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicI64, Ordering};

use crate::constants::MAX_ARRAY_LENGTH;
use crate::memory::layout::size_of_instance;
use crate::memory::AllocationTracker;
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::paged::slot::{AtomicF64, AtomicSlot, IntegerSlot};
use crate::types::error::{MemoryError, Result};

/// Growable array of 32-bit integers
pub type IntArray = PagedArray<AtomicI32>;

/// Growable array of 64-bit integers
pub type LongArray = PagedArray<AtomicI64>;

/// Growable array of 64-bit floats
pub type DoubleArray = PagedArray<AtomicF64>;

/// Growable paged array over atomic slots of type `A`
pub struct PagedArray<A: AtomicSlot> {
    inner: PagedDataStructure<Box<[A]>>,
}

impl<A: AtomicSlot> PagedArray<A> {
    /// Page factory of this array type
    pub fn factory() -> PageAllocatorFactory<Box<[A]>> {
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
        debug_assert!(index < self.capacity(), "index {} out of capacity {}", index, self.capacity());
        self.inner.with_page(index, |page, offset| page[offset].load(Ordering::Relaxed))
    }

    /// Store `value` at `index`, returning the previous element
    #[inline]
    pub fn set(&self, index: usize, value: A::Value) -> A::Value {
        debug_assert!(index < self.capacity(), "index {} out of capacity {}", index, self.capacity());
        self.inner.with_page(index, |page, offset| page[offset].swap(value, Ordering::Relaxed))
    }

    /// Add `delta` to the element at `index`, returning the new element
    #[inline]
    pub fn add_to(&self, index: usize, delta: A::Value) -> A::Value {
        debug_assert!(index < self.capacity());
        self.inner.with_page(index, |page, offset| {
            A::add(page[offset].fetch_add(delta, Ordering::Relaxed), delta)
        })
    }

    /// Store `update` at `index` if it holds `expected`
    #[inline]
    pub fn compare_and_set(&self, index: usize, expected: A::Value, update: A::Value) -> bool {
        debug_assert!(index < self.capacity());
        self.inner.with_page(index, |page, offset| {
            page[offset]
                .compare_exchange(expected, update, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
        })
    }

    /// Set every element up to the capacity to `value`
    pub fn fill(&self, value: A::Value) {
        for page in self.inner.pages().iter() {
            for slot in page.iter() {
                slot.store(value, Ordering::Relaxed);
            }
        }
    }

    /// Set each element in `[from, to)` to `supplier(index)`
    pub fn fill_range(&self, from: usize, to: usize, supplier: impl Fn(usize) -> A::Value) {
        debug_assert!(from <= to && to <= self.capacity());
        let geometry = self.inner.geometry();
        let pages = self.inner.pages();
        let mut index = from;
        while index < to {
            let page = &pages[geometry.page_index(index)];
            let start = geometry.index_in_page(index);
            let end = (start + (to - index)).min(page.len());
            for slot in &page[start..end] {
                slot.store(supplier(index), Ordering::Relaxed);
                index += 1;
            }
        }
    }

    /// Logical number of elements
    #[inline]
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Writable number of elements
    #[inline]
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Grow the logical size to at least `new_size`
    pub fn grow(&self, new_size: usize) -> Result<()> {
        self.inner.grow(new_size)
    }

    /// Drop the pages, returning the estimated bytes they held (0 on repeat)
    pub fn release(&self) -> u64 {
        self.inner.release()
    }

    /// Copy the first `size()` elements into a flat vector
    pub fn to_vec(&self) -> Result<Vec<A::Value>> {
        let size = self.size();
        if size > MAX_ARRAY_LENGTH {
            return Err(MemoryError::IndexOverflow { length: size as u64, max: MAX_ARRAY_LENGTH as u64 });
        }
        let mut values = Vec::with_capacity(size);
        for page in self.inner.pages().iter() {
            let remaining = size - values.len();
            if remaining == 0 {
                break;
            }
            values.extend(page.iter().take(remaining).map(|slot| slot.load(Ordering::Relaxed)));
        }
        Ok(values)
    }

    pub(crate) fn inner(&self) -> &PagedDataStructure<Box<[A]>> {
        &self.inner
    }
}

impl<A: IntegerSlot> PagedArray<A> {
    /// Bitwise or `value` into the element at `index`, returning the new element
    #[inline]
    pub fn or(&self, index: usize, value: A::Value) -> A::Value {
        debug_assert!(index < self.capacity());
        self.inner.with_page(index, |page, offset| {
            A::or(page[offset].fetch_or(value, Ordering::Relaxed), value)
        })
    }

    /// Bitwise and `value` into the element at `index`, returning the new element
    #[inline]
    pub fn and(&self, index: usize, value: A::Value) -> A::Value {
        debug_assert!(index < self.capacity());
        self.inner.with_page(index, |page, offset| {
            A::and(page[offset].fetch_and(value, Ordering::Relaxed), value)
        })
    }
}

impl<A: AtomicSlot> fmt::Debug for PagedArray<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedArray")
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .field("page_size", &self.inner.geometry().size())
            .finish()
    }
}
