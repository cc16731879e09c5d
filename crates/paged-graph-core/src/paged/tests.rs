use std::sync::Arc;

use rand::Rng;

use super::*;
use crate::memory::layout::{size_of_instance, MemoryLayout};
use crate::memory::AllocationTracker;
use crate::types::error::MemoryError;

const LONG_PAGE: usize = 4_096;

fn long_page_bytes() -> u64 {
    MemoryLayout::global().size_of_long_array(LONG_PAGE as u64)
}

// ---------- page allocator ----------

#[test]
fn direct_allocator_does_not_track() {
    let factory = PageAllocatorFactory::<Box<[AtomicF64]>>::of_array();
    let allocator = factory.new_allocator(&AllocationTracker::empty());
    assert!(!allocator.is_tracking());
    let page = allocator.new_page();
    assert_eq!(page.len(), LONG_PAGE);
    assert_eq!(allocator.page_size(), LONG_PAGE);
}

#[test]
fn tracking_allocator_credits_every_page() {
    let tracker = AllocationTracker::new();
    let factory = PageAllocatorFactory::<Box<[std::sync::atomic::AtomicI32]>>::of_array();
    let allocator = factory.new_allocator(&tracker);
    assert!(allocator.is_tracking());
    let _a = allocator.new_page();
    let _b = allocator.new_page();
    assert_eq!(tracker.tracked() as u64, 2 * allocator.bytes_per_page());
    assert_eq!(allocator.page_size(), 8_192);
}

#[test]
fn allocator_estimates_whole_pages() {
    let factory = PageAllocatorFactory::<Box<[std::sync::atomic::AtomicI64]>>::of_array();
    assert_eq!(factory.estimate_memory_usage(0), 0);
    assert_eq!(factory.estimate_memory_usage(1), long_page_bytes());
    assert_eq!(factory.estimate_memory_usage(LONG_PAGE), long_page_bytes());
    assert_eq!(factory.estimate_memory_usage(LONG_PAGE + 1), 2 * long_page_bytes());
}

#[test]
fn container_over_prebuilt_pages_checks_their_capacity() {
    let factory = PageAllocatorFactory::<Box<[std::sync::atomic::AtomicI64]>>::of_array();
    let allocator = factory.new_allocator(&AllocationTracker::empty());
    let pages = vec![Arc::new(allocator.new_page()), Arc::new(allocator.new_page())];

    let too_small = PagedDataStructure::from_pages(2 * LONG_PAGE + 1, pages.clone(), factory.new_allocator(&AllocationTracker::empty()));
    assert!(matches!(
        too_small,
        Err(MemoryError::CapacityExceeded { requested, max })
            if requested == (2 * LONG_PAGE + 1) as u64 && max == (2 * LONG_PAGE) as u64
    ));

    let container = PagedDataStructure::from_pages(LONG_PAGE + 5, pages, allocator).unwrap();
    assert_eq!(container.size(), LONG_PAGE + 5);
    assert_eq!(container.capacity(), 2 * LONG_PAGE);
    container.grow(2 * LONG_PAGE + 1).unwrap();
    assert!(container.page_count() >= 3);
}

// ---------- growable arrays ----------

#[test]
fn long_array_get_set_add() {
    let array = LongArray::new_array(10, &AllocationTracker::empty()).unwrap();
    assert_eq!(array.size(), 10);
    assert_eq!(array.capacity(), LONG_PAGE);
    assert_eq!(array.set(3, 42), 0);
    assert_eq!(array.set(3, 43), 42);
    assert_eq!(array.get(3), 43);
    assert_eq!(array.add_to(3, 7), 50);
    assert!(array.compare_and_set(3, 50, 1));
    assert!(!array.compare_and_set(3, 50, 2));
    assert_eq!(array.get(3), 1);
}

#[test]
fn int_array_bitwise() {
    let array = IntArray::new_array(100, &AllocationTracker::empty()).unwrap();
    array.set(10, 0b1010);
    assert_eq!(array.or(10, 0b0101), 0b1111);
    assert_eq!(array.and(10, 0b0110), 0b0110);
    assert_eq!(array.get(10), 0b0110);
}

#[test]
fn double_array_add() {
    let array = DoubleArray::new_array(5, &AllocationTracker::empty()).unwrap();
    array.set(0, 1.5);
    assert_eq!(array.add_to(0, 2.25), 3.75);
    assert_eq!(array.get(0), 3.75);
    assert_eq!(array.get(1), 0.0);
}

#[test]
fn fill_and_fill_range() {
    let array = LongArray::new_array(LONG_PAGE + 10, &AllocationTracker::empty()).unwrap();
    array.fill(7);
    assert_eq!(array.get(0), 7);
    assert_eq!(array.get(LONG_PAGE + 9), 7);

    array.fill_range(LONG_PAGE - 5, LONG_PAGE + 5, |i| i as i64);
    assert_eq!(array.get(LONG_PAGE - 6), 7);
    for i in LONG_PAGE - 5..LONG_PAGE + 5 {
        assert_eq!(array.get(i), i as i64);
    }
    assert_eq!(array.get(LONG_PAGE + 5), 7);
}

#[test]
fn to_vec_returns_logical_size() {
    let array = IntArray::new_array(20_000, &AllocationTracker::empty()).unwrap();
    array.fill_range(0, 20_000, |i| i as i32 * 2);
    let values = array.to_vec().unwrap();
    assert_eq!(values.len(), 20_000);
    assert!(values.iter().enumerate().all(|(i, v)| *v == i as i32 * 2));
}

#[test]
fn grow_never_shrinks_and_keeps_values() {
    let array = LongArray::new_array(100, &AllocationTracker::empty()).unwrap();
    array.set(99, 99);
    array.grow(50).unwrap();
    assert_eq!(array.size(), 100);

    array.grow(LONG_PAGE * 3 + 1).unwrap();
    assert_eq!(array.size(), LONG_PAGE * 3 + 1);
    assert!(array.capacity() >= array.size());
    assert_eq!(array.capacity() % LONG_PAGE, 0);
    assert_eq!(array.get(99), 99);
    array.set(LONG_PAGE * 3, 5);
    assert_eq!(array.get(LONG_PAGE * 3), 5);
}

#[test]
fn grow_allocates_headroom_beyond_requested_pages() {
    let array = LongArray::new_array(LONG_PAGE, &AllocationTracker::empty()).unwrap();
    assert_eq!(array.capacity(), LONG_PAGE);
    array.grow(LONG_PAGE + 1).unwrap();
    assert!(array.capacity() > 2 * LONG_PAGE);

    // Growth within the headroom allocates nothing new.
    let capacity = array.capacity();
    array.grow(capacity).unwrap();
    assert_eq!(array.capacity(), capacity);
    assert_eq!(array.size(), capacity);
}

#[test]
fn grow_beyond_max_supported_size_fails() {
    let array = LongArray::new_array(0, &AllocationTracker::empty()).unwrap();
    let max = array.inner().max_supported_size();
    assert!(matches!(array.grow(max + 1), Err(MemoryError::CapacityExceeded { .. })));
}

#[test]
fn concurrent_growth_keeps_every_write() {
    let writers = 8usize;
    let total = 40_000usize;
    let array = Arc::new(LongArray::new_array(0, &AllocationTracker::empty()).unwrap());

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let array = Arc::clone(&array);
            std::thread::spawn(move || {
                for i in (w..total).step_by(writers) {
                    array.grow(i + 1).unwrap();
                    array.set(i, i as i64 + 1);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(array.size(), total);
    for i in 0..total {
        assert_eq!(array.get(i), i as i64 + 1, "missing write at {}", i);
    }
}

#[test]
fn tracker_accounts_instance_and_pages() {
    let tracker = AllocationTracker::new();
    let array = LongArray::new_array(LONG_PAGE * 2 + 1, &tracker).unwrap();
    let expected = size_of_instance::<LongArray>() + 3 * long_page_bytes();
    assert_eq!(tracker.tracked() as u64, expected);
    assert_eq!(LongArray::estimate_memory_usage(LONG_PAGE * 2 + 1), expected);
    drop(array);
}

#[test]
fn release_is_idempotent_and_keeps_ledger() {
    let tracker = AllocationTracker::new();
    let array = LongArray::new_array(LONG_PAGE + 1, &tracker).unwrap();
    let tracked = tracker.tracked();
    assert_eq!(array.release(), 2 * long_page_bytes());
    assert_eq!(array.release(), 0);
    assert_eq!(array.size(), 0);
    assert_eq!(array.capacity(), 0);
    assert_eq!(tracker.tracked(), tracked);
}

// ---------- atomic arrays ----------

#[test]
fn paged_atomic_integer_array_concurrent_adds() {
    let array = Arc::new(PagedAtomicIntegerArray::new_array(10_000, &AllocationTracker::empty()).unwrap());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let array = Arc::clone(&array);
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    array.add(5, 1);
                    array.add(9_999, 2);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(array.get(5), 8_000);
    assert_eq!(array.get(9_999), 16_000);
    assert_eq!(array.size(), 10_000);
}

#[test]
fn paged_atomic_double_array_cas_and_update() {
    let array = PagedAtomicDoubleArray::new_array(3, &AllocationTracker::empty()).unwrap();
    array.set(1, 0.5);
    assert!(array.compare_and_set(1, 0.5, 1.5));
    assert!(!array.compare_and_set(1, 0.5, 2.5));
    assert_eq!(array.update(1, |v| v * 2.0), 3.0);
    assert_eq!(array.add(1, 1.0), 4.0);
    assert_eq!(array.get(1), 4.0);
}

#[test]
fn atomic_int_array_operations() {
    let tracker = AllocationTracker::new();
    let array = AtomicIntArray::new_array(16, &tracker).unwrap();
    assert_eq!(tracker.tracked() as u64, AtomicIntArray::estimate_memory_usage(16));
    array.set(0, 3);
    assert_eq!(array.add(0, 4), 7);
    assert!(array.compare_and_set(0, 7, 8));
    assert_eq!(array.get(0), 8);
    array.clear();
    assert_eq!(array.get(0), 0);
    assert_eq!(array.len(), 16);
}

// ---------- sparse array ----------

#[test]
fn sparse_set_get_and_missing_values() {
    let mut rng = rand::rng();
    let array = SparseLongArray::new_array(10, &AllocationTracker::empty()).unwrap();
    let index = rng.random_range(2..9);
    let value = rng.random_range(42..1337);
    array.set(index, value);
    for i in 0..10 {
        if i == index {
            assert_eq!(array.get(i), value);
            assert!(array.contains(i));
        } else {
            assert_eq!(array.get(i), -1);
            assert!(!array.contains(i));
        }
    }
    assert_eq!(array.get(rng.random_range(100..200)), -1);
    assert_eq!(array.get(usize::MAX), -1);
}

#[test]
fn sparse_capacity_is_page_rounded() {
    let array = SparseLongArray::new_array(10, &AllocationTracker::empty()).unwrap();
    assert_eq!(array.capacity(), LONG_PAGE);
    array.set(LONG_PAGE - 1, 1337);
    assert_eq!(array.get(LONG_PAGE - 1), 1337);
}

#[test]
#[should_panic]
fn sparse_set_beyond_capacity_panics() {
    let array = SparseLongArray::new_array(10, &AllocationTracker::empty()).unwrap();
    array.set(LONG_PAGE, 1337);
}

#[test]
fn sparse_pages_are_created_and_tracked_on_demand() {
    let tracker = AllocationTracker::new();
    let array = SparseLongArray::new_array(2 * LONG_PAGE, &tracker).unwrap();
    let initial = tracker.tracked();
    assert!(initial < 200, "only the container is tracked, got {}", initial);
    assert_eq!(array.allocated_pages(), 0);

    array.set(LONG_PAGE + 17, 99);
    assert_eq!(array.allocated_pages(), 1);
    assert_eq!((tracker.tracked() - initial) as u64, long_page_bytes());
    assert_eq!(array.get(17), -1);

    // The same page is not tracked twice.
    array.set(LONG_PAGE + 18, 100);
    assert_eq!((tracker.tracked() - initial) as u64, long_page_bytes());
}

#[test]
fn sparse_concurrent_writers_share_pages() {
    let array = Arc::new(SparseLongArray::new_array(4 * LONG_PAGE, &AllocationTracker::new()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|w| {
            let array = Arc::clone(&array);
            std::thread::spawn(move || {
                for i in (w..4 * LONG_PAGE).step_by(4) {
                    array.set(i, i as i64);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(array.allocated_pages(), 4);
    assert!((0..4 * LONG_PAGE).all(|i| array.get(i) == i as i64));
}

#[test]
fn sparse_release_reports_allocated_pages() {
    let mut array = SparseLongArray::new_array(3 * LONG_PAGE, &AllocationTracker::empty()).unwrap();
    array.set(0, 1);
    array.set(2 * LONG_PAGE, 1);
    assert_eq!(array.release(), 2 * long_page_bytes());
    assert_eq!(array.get(0), -1);
    assert_eq!(array.release(), 0);
}

// ---------- stack ----------

#[test]
fn stack_starts_empty() {
    let mut stack = PagedLongStack::new(rand::rng().random_range(0..10), &AllocationTracker::empty()).unwrap();
    assert!(stack.is_empty());
    assert_eq!(stack.size(), 0);
    assert_eq!(stack.pop(), None);
    assert_eq!(stack.peek(), None);
}

#[test]
fn stack_pops_in_lifo_order() {
    let mut rng = rand::rng();
    let mut stack = PagedLongStack::new(rng.random_range(0..10), &AllocationTracker::empty()).unwrap();
    let values: Vec<i64> = (0..rng.random_range(1..42)).map(|_| rng.random_range(42..1337)).collect();
    for &v in &values {
        stack.push(v).unwrap();
        assert_eq!(stack.peek(), Some(v));
    }
    for &v in values.iter().rev() {
        assert_eq!(stack.pop(), Some(v));
    }
    assert!(stack.is_empty());
}

#[test]
fn stack_clear_empties() {
    let mut stack = PagedLongStack::new(4, &AllocationTracker::empty()).unwrap();
    for v in 0..30 {
        stack.push(v).unwrap();
    }
    stack.clear();
    assert!(stack.is_empty());
    assert_eq!(stack.pop(), None);
}

#[test]
fn stack_grows_across_pages() {
    let mut rng = rand::rng();
    let mut stack = PagedLongStack::new(0, &AllocationTracker::empty()).unwrap();
    let count = rng.random_range(10_000..20_000);
    let values: Vec<i64> = (0..count).map(|_| rng.random_range(42..1337)).collect();
    for &v in &values {
        stack.push(v).unwrap();
    }
    assert_eq!(stack.size(), count);
    for &v in values.iter().rev() {
        assert_eq!(stack.pop(), Some(v));
    }
}

#[test]
fn stack_release_returns_tracked_bytes() {
    let tracker = AllocationTracker::new();
    let mut stack = PagedLongStack::new(rand::rng().random_range(10_000..20_000), &tracker).unwrap();
    let tracked = tracker.tracked() as u64;
    assert_eq!(stack.release(), tracked);
    assert!(stack.is_empty());
    assert_eq!(stack.size(), 0);
    assert_eq!(stack.pop(), None);
    assert_eq!(stack.release(), 0);
}

// ---------- bitset ----------

#[test]
fn bitset_put_contains_clear() {
    let bits = PagedSimpleBitSet::new(1_000, &AllocationTracker::empty()).unwrap();
    assert!(bits.capacity() >= 1_000);
    bits.put(0);
    bits.put(63);
    bits.put(64);
    bits.put(999);
    assert!(bits.contains(63) && bits.contains(64) && bits.contains(999));
    assert!(!bits.contains(1));
    assert_eq!(bits.cardinality(), 4);
    bits.clear_bit(63);
    assert!(!bits.contains(63));
    assert_eq!(bits.cardinality(), 3);
    bits.clear_all();
    assert_eq!(bits.cardinality(), 0);
}

#[test]
fn bitset_grows() {
    let bits = PagedSimpleBitSet::new(64, &AllocationTracker::empty()).unwrap();
    let beyond = bits.capacity() + 5;
    bits.grow(beyond + 1).unwrap();
    bits.put(beyond);
    assert!(bits.contains(beyond));
}

#[test]
fn bitset_concurrent_puts() {
    let bits = Arc::new(PagedSimpleBitSet::new(100_000, &AllocationTracker::empty()).unwrap());
    let handles: Vec<_> = (0..4)
        .map(|w| {
            let bits = Arc::clone(&bits);
            std::thread::spawn(move || {
                for i in (w..100_000).step_by(4) {
                    if i % 3 == 0 {
                        bits.put(i);
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(bits.cardinality(), (0..100_000u64).filter(|i| i % 3 == 0).count() as u64);
}

// ---------- long map ----------

#[test]
fn long_map_put_get_contains() {
    let map = PagedLongLongMap::new_map(10_000, &AllocationTracker::empty()).unwrap();
    assert!(map.is_empty());
    assert_eq!(map.put(5, 50), None);
    assert_eq!(map.put(5, 55), Some(50));
    assert_eq!(map.put(9_000, 90), None);
    assert_eq!(map.get_or_default(5, -1), 55);
    assert_eq!(map.get_or_default(6, -1), -1);
    assert!(map.contains_key(9_000));
    assert!(!map.contains_key(8_999));
    assert_eq!(map.len(), 2);
}

#[test]
fn long_map_iterates_all_entries() {
    let map = PagedLongLongMap::new_map(20_000, &AllocationTracker::empty()).unwrap();
    for key in (0..20_000).step_by(7) {
        map.put(key, key as i64 * 10);
    }
    let mut entries: Vec<(usize, i64)> = map.iter().collect();
    entries.sort_unstable();
    let expected: Vec<(usize, i64)> = (0..20_000).step_by(7).map(|k| (k, k as i64 * 10)).collect();
    assert_eq!(entries, expected);
}

#[test]
fn long_map_pages_track_themselves() {
    let tracker = AllocationTracker::new();
    let map = PagedLongLongMap::new_map(2 * LONG_PAGE, &tracker).unwrap();
    let estimate = PagedLongLongMap::estimate_memory_usage(2 * LONG_PAGE);
    assert_eq!(tracker.tracked() as u64, estimate);
    assert_eq!(map.release(), PagedLongLongMap::estimate_memory_usage_of_pages(2 * LONG_PAGE));
}

// ---------- long-long-double map ----------

#[test]
fn nested_map_returns_default_until_written() {
    let map = PagedLongLongDoubleMap::new_map(10_000, &AllocationTracker::empty()).unwrap();
    assert_eq!(map.get_or_default(5, 7, -1.5), -1.5);
    assert_eq!(map.put(5, 7, 2.0), None);
    assert_eq!(map.put(5, 7, 2.5), Some(2.0));
    assert_eq!(map.get_or_default(5, 7, -1.5), 2.5);
    assert_eq!(map.get_or_default(5, 8, 0.0), 0.0);
    assert_eq!(map.get_or_default(6, 7, 0.0), 0.0);
    assert_eq!(map.get_or_default(9_999, -3, 4.0), 4.0);
}

#[test]
fn nested_maps_are_created_lazily_and_tracked() {
    let tracker = AllocationTracker::new();
    let map = PagedLongLongDoubleMap::new_map(2 * LONG_PAGE, &tracker).unwrap();
    let initial = tracker.tracked();

    for id in 0..2 * LONG_PAGE {
        map.get_or_default(id, 1, 0.0);
    }
    assert_eq!(tracker.tracked(), initial);
    assert_eq!(map.len_of(3), 0);

    map.put(3, 1, 1.0);
    let after_first = tracker.tracked();
    assert!(after_first > initial);

    for key in 2..100 {
        map.put(3, key, key as f64);
    }
    assert!(tracker.tracked() > after_first);
    assert_eq!(map.len_of(3), 99);
    assert_eq!(map.len_of(4), 0);
}

#[test]
fn nested_map_estimate_assumes_small_maps_per_id() {
    let layout = MemoryLayout::global();
    let empty = PagedLongLongDoubleMap::estimate_memory_usage(0);
    assert_eq!(empty, size_of_instance::<PagedLongLongDoubleMap>());

    let one_page = PagedLongLongDoubleMap::estimate_memory_usage(1) - empty;
    let page_size = layout.reference_bytes as usize;
    let page_size = crate::memory::PageGeometry::for_element_bytes(page_size).size() as u64;
    let per_id = layout.size_of_long_array(33) + layout.size_of_double_array(33);
    assert!(one_page >= page_size * per_id);
    assert_eq!(PagedLongLongDoubleMap::estimate_memory_usage(page_size as usize + 1) - empty, 2 * one_page);
}

#[test]
fn nested_map_concurrent_puts_to_one_id() {
    let map = PagedLongLongDoubleMap::new_map(100, &AllocationTracker::empty()).unwrap();
    std::thread::scope(|scope| {
        for worker in 0..8i64 {
            let map = &map;
            scope.spawn(move || {
                for key in 0..500 {
                    map.put(42, worker * 1_000 + key, key as f64);
                }
            });
        }
    });
    assert_eq!(map.len_of(42), 4_000);
    assert_eq!(map.get_or_default(42, 7_499, 0.0), 499.0);
    assert!(map.release() > 0);
    assert_eq!(map.release(), 0);
}
