//! Sparse array of 64-bit integers
//!
//! The capacity is fixed at creation but pages are only allocated when the
//! first value is written to them. Missing values, including indices beyond
//! the capacity, read as `-1`.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use once_cell::sync::OnceCell;

use crate::constants::NO_VALUE;
use crate::memory::layout::{size_of_instance, MemoryLayout};
use crate::memory::{AllocationTracker, PageGeometry};
use crate::paged::slot;
use crate::types::error::Result;

/// Fixed-capacity array of 64-bit integers with lazily allocated pages
pub struct SparseLongArray {
    pages: Box<[OnceCell<Box<[AtomicI64]>>]>,
    geometry: PageGeometry,
    bytes_per_page: u64,
    tracker: AllocationTracker,
}

impl SparseLongArray {
    fn geometry() -> PageGeometry {
        PageGeometry::for_element_bytes(8)
    }

    /// Estimated bytes of a fully populated array of `capacity` elements
    pub fn estimate_memory_usage(capacity: usize) -> u64 {
        let layout = MemoryLayout::global();
        let geometry = Self::geometry();
        let num_pages = geometry.num_pages(capacity) as u64;
        size_of_instance::<Self>()
            .saturating_add(layout.size_of_object_array(num_pages))
            .saturating_add(num_pages.saturating_mul(layout.size_of_long_array(geometry.size() as u64)))
    }

    /// Create an array of `capacity` missing values without allocating any page
    pub fn new_array(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        let layout = MemoryLayout::global();
        let geometry = Self::geometry();
        let num_pages = geometry.checked_num_pages(capacity)?;
        tracker.add(size_of_instance::<Self>() + layout.size_of_object_array(num_pages as u64));
        Ok(Self {
            pages: (0..num_pages).map(|_| OnceCell::new()).collect(),
            geometry,
            bytes_per_page: layout.size_of_long_array(geometry.size() as u64),
            tracker: tracker.clone(),
        })
    }

    /// Value at `index`, or -1 if it was never set
    #[inline]
    pub fn get(&self, index: usize) -> i64 {
        let page_index = self.geometry.page_index(index);
        match self.pages.get(page_index).and_then(OnceCell::get) {
            Some(page) => page[self.geometry.index_in_page(index)].load(Ordering::Relaxed),
            None => NO_VALUE,
        }
    }

    /// Store `value` at `index`, allocating its page on first use
    ///
    /// `index` must lie within the page-rounded capacity.
    pub fn set(&self, index: usize, value: i64) {
        let page_index = self.geometry.page_index(index);
        let page = self.pages[page_index].get_or_init(|| {
            self.tracker.add(self.bytes_per_page);
            slot::new_page_filled::<AtomicI64>(self.geometry.size(), NO_VALUE)
        });
        page[self.geometry.index_in_page(index)].store(value, Ordering::Relaxed);
    }

    /// Whether a value other than -1 is stored at `index`
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.get(index) != NO_VALUE
    }

    /// Number of addressable elements, rounded up to whole pages
    pub fn capacity(&self) -> usize {
        self.geometry.capacity_for(self.pages.len())
    }

    /// Number of pages that were allocated
    pub fn allocated_pages(&self) -> usize {
        self.pages.iter().filter(|page| page.get().is_some()).count()
    }

    /// Drop every page, returning the estimated bytes of the allocated ones
    pub fn release(&mut self) -> u64 {
        let freed = self.allocated_pages() as u64 * self.bytes_per_page;
        self.pages = Box::new([]);
        freed
    }
}

impl fmt::Debug for SparseLongArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SparseLongArray")
            .field("capacity", &self.capacity())
            .field("allocated_pages", &self.allocated_pages())
            .finish()
    }
}
