use super::bit_util::*;
use super::layout::{human_readable, MemoryLayout};
use super::page_util::*;
use super::tracker::AllocationTracker;
use crate::constants::{HUGE_PAGE_SHIFT, HUGE_PAGE_SIZE, MAX_PAGE_COUNT};
use crate::types::error::MemoryError;

#[test]
fn power_of_two_checks() {
    assert!(!is_power_of_two(0));
    assert!(is_power_of_two(1));
    assert!(is_power_of_two(2));
    assert!(!is_power_of_two(3));
    assert!(is_power_of_two(1 << 40));
    assert!(!is_power_of_two((1 << 40) + 1));
}

#[test]
fn next_highest_power_of_two_rounds_up() {
    assert_eq!(next_highest_power_of_two(0), 0);
    assert_eq!(next_highest_power_of_two(1), 1);
    assert_eq!(next_highest_power_of_two(3), 4);
    assert_eq!(next_highest_power_of_two(4), 4);
    assert_eq!(next_highest_power_of_two(1025), 2048);
    assert_eq!(previous_power_of_two(1025), 1024);
    assert_eq!(previous_power_of_two(0), 0);
}

#[test]
fn align_and_ceil_div() {
    assert_eq!(align(0, 8), 0);
    assert_eq!(align(1, 8), 8);
    assert_eq!(align(16, 8), 16);
    assert_eq!(align(17, 8), 24);
    assert_eq!(ceil_div(10, 3), 4);
    assert_eq!(ceil_div(9, 3), 3);
}

#[test]
fn align_saturates_instead_of_wrapping() {
    assert_eq!(align(u64::MAX, 8), u64::MAX & !7);
    assert_eq!(align(u64::MAX - 3, 8), u64::MAX & !7);

    let layout = MemoryLayout::compressed_references();
    assert_eq!(layout.size_of_long_array(u64::MAX / 4), u64::MAX & !7);
    assert!(layout.size_of_long_array(u64::MAX / 4) > layout.size_of_long_array(1 << 40));
}

#[test]
fn page_size_follows_byte_budget() {
    assert_eq!(page_size_for(1), 32_768);
    assert_eq!(page_size_for(4), 8_192);
    assert_eq!(page_size_for(8), 4_096);
    let geometry = PageGeometry::for_element_bytes(8);
    assert_eq!(geometry.size(), 4_096);
    assert_eq!(geometry.shift(), 12);
    assert_eq!(geometry.mask(), 4_095);
}

#[test]
fn page_math_round_trip() {
    let geometry = PageGeometry::new(HUGE_PAGE_SHIFT);
    for &i in &[0usize, 1, 16_383, 16_384, 16_385, 1 << 20, (1 << 33) + 7] {
        assert_eq!(geometry.page_index(i) * HUGE_PAGE_SIZE + geometry.index_in_page(i), i);
    }
    assert_eq!(geometry.num_pages(0), 0);
    assert_eq!(geometry.num_pages(1), 1);
    assert_eq!(geometry.num_pages(HUGE_PAGE_SIZE), 1);
    assert_eq!(geometry.num_pages(HUGE_PAGE_SIZE + 1), 2);
}

#[test]
fn exclusive_index_trims_last_page() {
    let geometry = PageGeometry::new(4);
    assert_eq!(geometry.exclusive_index_of_page(16), 16);
    assert_eq!(geometry.exclusive_index_of_page(17), 1);
    assert_eq!(geometry.exclusive_index_of_page(31), 15);
    assert_eq!(geometry.exclusive_index_of_page(32), 16);
}

#[test]
fn checked_num_pages_rejects_too_many_pages() {
    let geometry = PageGeometry::new(0);
    assert_eq!(geometry.checked_num_pages(MAX_PAGE_COUNT), Ok(MAX_PAGE_COUNT));
    assert!(matches!(
        geometry.checked_num_pages(MAX_PAGE_COUNT + 1),
        Err(MemoryError::CapacityExceeded { .. })
    ));
}

#[test]
fn layout_estimates_include_header_and_padding() {
    let layout = MemoryLayout::compressed_references();
    assert_eq!(layout.size_of_long_array(0), 16);
    assert_eq!(layout.size_of_long_array(1), 24);
    assert_eq!(layout.size_of_int_array(3), 32);
    assert_eq!(layout.size_of_byte_array(1), 24);
    assert_eq!(layout.size_of_object_array(3), 32);
    assert_eq!(layout.size_of_object_array_elements(3), 12);

    let full = MemoryLayout::full_references();
    assert_eq!(full.size_of_object_array(3), 48);
}

#[test]
fn layout_validation() {
    assert!(MemoryLayout::native().validate().is_ok());
    let bad_alignment = MemoryLayout { alignment: 12, ..MemoryLayout::native() };
    assert!(matches!(bad_alignment.validate(), Err(MemoryError::InvalidLayout(_))));
    let bad_reference = MemoryLayout { reference_bytes: 2, ..MemoryLayout::native() };
    assert!(bad_reference.validate().is_err());
}

#[test]
fn global_layout_resolves_once() {
    let global = *MemoryLayout::global();
    // Re-installing the resolved layout is accepted, a different one is not.
    assert!(MemoryLayout::install(global).is_ok());
    let other = if global == MemoryLayout::full_references() {
        MemoryLayout::compressed_references()
    } else {
        MemoryLayout::full_references()
    };
    assert!(MemoryLayout::install(other).is_err());
    assert_eq!(*MemoryLayout::global(), global);
}

#[test]
fn tracker_ledger() {
    let tracker = AllocationTracker::new();
    assert!(AllocationTracker::is_tracking(&tracker));
    assert_eq!(tracker.tracked(), 0);
    tracker.add(100);
    tracker.add(28);
    tracker.remove(8);
    assert_eq!(tracker.tracked(), 120);

    let shared = tracker.clone();
    shared.add(5);
    assert_eq!(tracker.tracked(), 125);
    assert!(tracker.same_ledger(&shared));
}

#[test]
fn empty_tracker_is_inert() {
    let tracker = AllocationTracker::empty();
    assert!(!AllocationTracker::is_tracking(&tracker));
    tracker.add(1_000);
    tracker.remove(10);
    assert_eq!(tracker.tracked(), 0);
    assert_eq!(format!("{:?}", tracker), "AllocationTracker::EMPTY");
}

#[test]
fn tracker_accumulates_across_threads() {
    let tracker = AllocationTracker::new();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let t = tracker.clone();
            std::thread::spawn(move || {
                for _ in 0..1_000 {
                    t.add(3);
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(tracker.tracked(), 24_000);
}

#[test]
fn human_readable_units() {
    assert_eq!(human_readable(512), "512 B");
    assert_eq!(human_readable(1536), "1.5 KiB");
    assert_eq!(human_readable(3 * 1024 * 1024), "3.0 MiB");
}
