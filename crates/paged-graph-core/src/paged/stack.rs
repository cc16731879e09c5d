//! Growable stack of 64-bit integers over pages

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::memory::layout::size_of_instance;
use crate::memory::AllocationTracker;
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::types::error::Result;

/// LIFO stack of 64-bit integers that grows page by page
pub struct PagedLongStack {
    inner: PagedDataStructure<Box<[AtomicI64]>>,
    size: usize,
}

impl PagedLongStack {
    fn factory() -> PageAllocatorFactory<Box<[AtomicI64]>> {
        PageAllocatorFactory::of_array()
    }

    /// Estimated bytes of a stack pre-sized for `size` elements
    pub fn estimate_memory_usage(size: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(size)
    }

    /// Create an empty stack with room for `initial_size` elements
    pub fn new(initial_size: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self { inner: PagedDataStructure::new(initial_size, allocator)?, size: 0 })
    }

    /// Push `value`, growing by a page when full
    pub fn push(&mut self, value: i64) -> Result<()> {
        let index = self.size;
        if index >= self.inner.capacity() {
            self.inner.grow(index + 1)?;
        }
        self.inner.with_page(index, |page, offset| page[offset].store(value, Ordering::Relaxed));
        self.size += 1;
        Ok(())
    }

    /// Remove and return the top value
    pub fn pop(&mut self) -> Option<i64> {
        if self.size == 0 {
            return None;
        }
        self.size -= 1;
        Some(self.load(self.size))
    }

    /// The top value
    pub fn peek(&self) -> Option<i64> {
        if self.size == 0 {
            return None;
        }
        Some(self.load(self.size - 1))
    }

    #[inline]
    fn load(&self, index: usize) -> i64 {
        self.inner.with_page(index, |page, offset| page[offset].load(Ordering::Relaxed))
    }

    /// Number of values on the stack
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the stack holds no values
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Remove all values, keeping the pages
    pub fn clear(&mut self) {
        self.size = 0;
    }

    /// Drop the pages, returning the estimated bytes of the stack (0 on repeat)
    pub fn release(&mut self) -> u64 {
        self.size = 0;
        if self.inner.is_released() {
            return 0;
        }
        size_of_instance::<Self>() + self.inner.release()
    }
}

impl fmt::Debug for PagedLongStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedLongStack")
            .field("size", &self.size)
            .field("capacity", &self.inner.capacity())
            .finish()
    }
}
