//! Paged two-level map from a dense id and a 64-bit key to a double
//!
//! Each page holds one slot per dense id. The hash map behind a slot is only
//! created on the first `put` for that id, so ids that are never written cost
//! an empty slot. Nested maps credit the tracker when created and whenever
//! their table grows.

use std::fmt;

use ahash::AHashMap;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::memory::layout::{size_of_instance, MemoryLayout};
use crate::memory::{AllocationTracker, PageGeometry};
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::types::error::Result;

/// Entries assumed per id when estimating, as for a node of degree 16
const ESTIMATED_TABLE_SLOTS: u64 = 33;

type NestedMap = Mutex<AHashMap<i64, f64>>;

fn table_bytes(slots: usize) -> u64 {
    if slots == 0 {
        return 0;
    }
    let layout = MemoryLayout::global();
    layout.size_of_long_array(slots as u64) + layout.size_of_double_array(slots as u64)
}

fn estimated_nested_map_bytes() -> u64 {
    let layout = MemoryLayout::global();
    size_of_instance::<NestedMap>()
        + layout.size_of_long_array(ESTIMATED_TABLE_SLOTS)
        + layout.size_of_double_array(ESTIMATED_TABLE_SLOTS)
}

/// One page of lazily created nested maps
struct NestedMapPage {
    slots: Box<[OnceCell<NestedMap>]>,
    tracker: AllocationTracker,
}

impl NestedMapPage {
    fn new(page_size: usize, tracker: &AllocationTracker) -> Self {
        tracker.add(size_of_instance::<Self>() + MemoryLayout::global().size_of_object_array(page_size as u64));
        Self {
            slots: (0..page_size).map(|_| OnceCell::new()).collect(),
            tracker: tracker.clone(),
        }
    }

    fn get(&self, offset: usize, key: i64, default: f64) -> f64 {
        self.slots[offset]
            .get()
            .and_then(|map| map.lock().get(&key).copied())
            .unwrap_or(default)
    }

    fn put(&self, offset: usize, key: i64, value: f64) -> Option<f64> {
        let map = self.slots[offset].get_or_init(|| {
            self.tracker.add(size_of_instance::<NestedMap>());
            Mutex::new(AHashMap::new())
        });
        let mut map = map.lock();
        let before = map.capacity();
        let previous = map.insert(key, value);
        let after = map.capacity();
        if after > before {
            self.tracker.add(table_bytes(after) - table_bytes(before));
        }
        previous
    }

    fn len(&self, offset: usize) -> usize {
        self.slots[offset].get().map_or(0, |map| map.lock().len())
    }
}

/// Map from `(id, key)` pairs to doubles for ids below a fixed capacity
pub struct PagedLongLongDoubleMap {
    inner: PagedDataStructure<NestedMapPage>,
}

impl PagedLongLongDoubleMap {
    fn factory() -> PageAllocatorFactory<NestedMapPage> {
        let layout = MemoryLayout::global();
        let page_size = PageGeometry::for_element_bytes(layout.reference_bytes as usize).size();
        let bytes_per_page = size_of_instance::<NestedMapPage>()
            .saturating_add((page_size as u64).saturating_mul(estimated_nested_map_bytes()));
        PageAllocatorFactory::self_tracking(page_size, bytes_per_page, NestedMapPage::new)
    }

    /// Estimated bytes of a map over `size` ids, each with a small nested map
    pub fn estimate_memory_usage(size: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(size)
    }

    /// Create a map for ids in `[0, size)` with no nested map allocated
    pub fn new_map(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self { inner: PagedDataStructure::new(size, allocator)? })
    }

    /// Value stored for `(index1, index2)`, or `default`
    pub fn get_or_default(&self, index1: usize, index2: i64, default: f64) -> f64 {
        debug_assert!(index1 < self.capacity());
        self.inner.with_page(index1, |page, offset| page.get(offset, index2, default))
    }

    /// Store `value` for `(index1, index2)`, returning the previous value
    pub fn put(&self, index1: usize, index2: i64, value: f64) -> Option<f64> {
        debug_assert!(index1 < self.capacity());
        self.inner.with_page(index1, |page, offset| page.put(offset, index2, value))
    }

    /// Number of keys stored under `index1`
    pub fn len_of(&self, index1: usize) -> usize {
        debug_assert!(index1 < self.capacity());
        self.inner.with_page(index1, |page, offset| page.len(offset))
    }

    /// Number of ids the map can address
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Drop the pages, returning their estimated bytes (0 on repeat)
    pub fn release(&self) -> u64 {
        self.inner.release()
    }
}

impl fmt::Debug for PagedLongLongDoubleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedLongLongDoubleMap")
            .field("capacity", &self.capacity())
            .field("pages", &self.inner.page_count())
            .finish()
    }
}
