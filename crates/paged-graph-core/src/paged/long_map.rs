//! Paged map from dense ids to 64-bit values
//!
//! Every page is a small hash map covering one page-sized range of keys, so
//! pages fill independently and can be loaded in parallel. Pages are built
//! through a self-tracking [`PageAllocatorFactory`] and report the estimated
//! size of their hash table when created.

use std::fmt;

use ahash::AHashMap;
use parking_lot::Mutex;

use crate::memory::bit_util;
use crate::memory::layout::{size_of_instance, MemoryLayout};
use crate::memory::{AllocationTracker, PageGeometry};
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::types::error::Result;

const LOAD_FACTOR: f64 = 0.75;

type MapPage = Mutex<AHashMap<usize, i64>>;

fn page_bytes(page_size: usize) -> u64 {
    let layout = MemoryLayout::global();
    let buffer_length = bit_util::next_highest_power_of_two((page_size as f64 / LOAD_FACTOR).ceil() as u64);
    let buffer = layout.size_of_long_array(buffer_length);
    size_of_instance::<MapPage>() + buffer + buffer
}

fn new_map_page(page_size: usize, tracker: &AllocationTracker) -> MapPage {
    tracker.add(page_bytes(page_size));
    Mutex::new(AHashMap::new())
}

/// Map from ids below a fixed capacity to 64-bit values
pub struct PagedLongLongMap {
    inner: PagedDataStructure<MapPage>,
}

impl PagedLongLongMap {
    fn factory() -> PageAllocatorFactory<MapPage> {
        // Same page size as long pages so both can be filled page by page together.
        let page_size = PageGeometry::for_element_bytes(8).size();
        PageAllocatorFactory::self_tracking(page_size, page_bytes(page_size), new_map_page)
    }

    /// Estimated bytes of a map covering `capacity` ids
    pub fn estimate_memory_usage(capacity: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(capacity)
    }

    /// Estimated bytes of the pages alone
    pub fn estimate_memory_usage_of_pages(capacity: usize) -> u64 {
        Self::factory().estimate_memory_usage(capacity)
    }

    /// Create an empty map for ids in `[0, capacity)`
    pub fn new_map(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self { inner: PagedDataStructure::new(capacity, allocator)? })
    }

    /// Value stored for `key`, or `default`
    pub fn get_or_default(&self, key: usize, default: i64) -> i64 {
        debug_assert!(key < self.capacity());
        self.inner
            .with_page(key, |page, _| page.lock().get(&key).copied())
            .unwrap_or(default)
    }

    /// Store `value` for `key`, returning the previous value
    pub fn put(&self, key: usize, value: i64) -> Option<i64> {
        debug_assert!(key < self.capacity());
        self.inner.with_page(key, |page, _| page.lock().insert(key, value))
    }

    /// Whether a value is stored for `key`
    pub fn contains_key(&self, key: usize) -> bool {
        debug_assert!(key < self.capacity());
        self.inner.with_page(key, |page, _| page.lock().contains_key(&key))
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.inner.pages().iter().map(|page| page.lock().len()).sum()
    }

    /// Whether no entry is stored
    pub fn is_empty(&self) -> bool {
        self.inner.pages().iter().all(|page| page.lock().is_empty())
    }

    /// Largest key plus one that can be stored
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Iterate `(key, value)` entries page by page
    ///
    /// Each page is copied when the iterator reaches it, so concurrent writes
    /// to pages not yet visited are observed.
    pub fn iter(&self) -> PagedLongLongMapIter {
        let pages = self.inner.snapshot();
        PagedLongLongMapIter { pages, next_page: 0, current: Vec::new().into_iter() }
    }

    /// Drop the pages, returning the estimated bytes they held (0 on repeat)
    pub fn release(&self) -> u64 {
        self.inner.release()
    }
}

/// Iterator over the entries of a [`PagedLongLongMap`]
pub struct PagedLongLongMapIter {
    pages: crate::paged::paged_data_structure::Pages<MapPage>,
    next_page: usize,
    current: std::vec::IntoIter<(usize, i64)>,
}

impl Iterator for PagedLongLongMapIter {
    type Item = (usize, i64);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.current.next() {
                return Some(entry);
            }
            let page = self.pages.get(self.next_page)?;
            self.next_page += 1;
            let entries: Vec<(usize, i64)> = page.lock().iter().map(|(k, v)| (*k, *v)).collect();
            self.current = entries.into_iter();
        }
    }
}

impl<'a> IntoIterator for &'a PagedLongLongMap {
    type Item = (usize, i64);
    type IntoIter = PagedLongLongMapIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for PagedLongLongMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedLongLongMap")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
