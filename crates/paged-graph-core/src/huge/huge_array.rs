//! Fixed-capacity arrays addressable beyond 31 bits
//!
//! A [`HugeArray`] picks its representation once, at construction: a single
//! flat page when the requested size fits [`MAX_ARRAY_LENGTH`], otherwise an
//! array of pages of [`HUGE_PAGE_SIZE`] elements where only the last page may
//! be shorter. Every operation matches on the representation, so the single
//! page case is a plain slice access without shift or mask. Both
//! representations behave identically for every caller.
//!
//! Writes take `&mut self`. Concurrent filling goes through
//! [`HugeArrayBuilder`](super::HugeArrayBuilder), which hands out disjoint
//! ranges.

use std::fmt;
use std::ops::{AddAssign, BitAndAssign, BitOrAssign};

use crate::constants::{HUGE_PAGE_SHIFT, HUGE_PAGE_SIZE, MAX_ARRAY_LENGTH};
use crate::huge::cursor::{CursorSource, HugeCursor};
use crate::huge::element::HugeElement;
use crate::memory::layout::{human_readable, MemoryLayout};
use crate::memory::{AllocationTracker, PageGeometry};
use crate::types::error::{MemoryError, Result};
use crate::{log_debug, log_trace};

/// Page geometry of the huge array family
pub const HUGE_GEOMETRY: PageGeometry = PageGeometry::new(HUGE_PAGE_SHIFT);

/// Huge array of 64-bit integers
pub type HugeLongArray = HugeArray<i64>;

/// Huge array of 32-bit integers
pub type HugeIntArray = HugeArray<i32>;

/// Huge array of 64-bit floats
pub type HugeDoubleArray = HugeArray<f64>;

/// Huge array of optional objects; `None` is the absent value
pub type HugeObjectArray<T> = HugeArray<Option<T>>;

/// Fixed-capacity array in single-page or paged representation
pub enum HugeArray<T: HugeElement> {
    /// One flat page holding every element
    Single(SingleHugeArray<T>),
    /// Pages of `HUGE_PAGE_SIZE` elements, the last one trimmed to the size
    Paged(PagedHugeArray<T>),
}

/// Storage of the single-page representation
pub struct SingleHugeArray<T> {
    page: Box<[T]>,
    memory_used: u64,
}

/// Storage of the paged representation
pub struct PagedHugeArray<T> {
    size: usize,
    pages: Box<[Box<[T]>]>,
    memory_used: u64,
}

fn new_page<T: HugeElement>(len: usize) -> Box<[T]> {
    vec![T::default(); len].into_boxed_slice()
}

fn single_memory<T: HugeElement>(layout: &MemoryLayout, size: usize) -> u64 {
    layout.size_of_array(size as u64, T::element_bytes(layout))
}

fn paged_memory<T: HugeElement>(layout: &MemoryLayout, size: usize) -> u64 {
    let num_pages = HUGE_GEOMETRY.num_pages(size);
    let mut bytes = layout.size_of_object_array(num_pages as u64);
    if num_pages > 0 {
        let element_bytes = T::element_bytes(layout);
        let last_page = HUGE_GEOMETRY.exclusive_index_of_page(size) as u64;
        let page_bytes = layout.size_of_array(HUGE_PAGE_SIZE as u64, element_bytes);
        let full_pages = (num_pages as u64 - 1).saturating_mul(page_bytes);
        bytes = bytes
            .saturating_add(full_pages)
            .saturating_add(layout.size_of_array(last_page, element_bytes));
    }
    bytes
}

impl<T: HugeElement> HugeArray<T> {
    /// Create an array of `size` default elements in the fitting representation
    pub fn new_array(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        if size <= MAX_ARRAY_LENGTH {
            Self::new_single(size, tracker)
        } else {
            Self::new_paged(size, tracker)
        }
    }

    /// Create an array in the single-page representation
    pub fn new_single(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        if size > MAX_ARRAY_LENGTH {
            return Err(MemoryError::capacity(size as u64, MAX_ARRAY_LENGTH as u64));
        }
        let layout = MemoryLayout::global();
        let memory_used = single_memory::<T>(layout, size);
        tracker.add(layout.size_of_instance::<Self>() + memory_used);
        log_trace!(size, "Huge array uses a single page");
        Ok(HugeArray::Single(SingleHugeArray { page: new_page(size), memory_used }))
    }

    /// Create an array in the paged representation
    pub fn new_paged(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        let num_pages = HUGE_GEOMETRY.checked_num_pages(size)?;
        let layout = MemoryLayout::global();
        let memory_used = paged_memory::<T>(layout, size);
        tracker.add(layout.size_of_instance::<Self>() + memory_used);

        let last_page_size = HUGE_GEOMETRY.exclusive_index_of_page(size);
        let pages: Box<[Box<[T]>]> = (0..num_pages)
            .map(|page| if page + 1 == num_pages { new_page(last_page_size) } else { new_page(HUGE_PAGE_SIZE) })
            .collect();
        log_trace!(size, num_pages, "Huge array uses pages");
        Ok(HugeArray::Paged(PagedHugeArray { size, pages, memory_used }))
    }

    /// Create an untracked array holding a copy of `values`
    pub fn of(values: &[T]) -> Result<Self> {
        let mut array = Self::new_array(values.len(), &AllocationTracker::empty())?;
        array.write_slice(0, values);
        Ok(array)
    }

    /// Estimated bytes of an array of `size` elements, including the container
    ///
    /// Saturates at `u64::MAX` for sizes no allocation could hold.
    pub fn estimate_memory_usage(size: usize) -> u64 {
        let layout = MemoryLayout::global();
        let storage = if size <= MAX_ARRAY_LENGTH {
            single_memory::<T>(layout, size)
        } else {
            paged_memory::<T>(layout, size)
        };
        layout.size_of_instance::<Self>().saturating_add(storage)
    }

    /// Number of elements
    #[inline]
    pub fn size(&self) -> usize {
        match self {
            HugeArray::Single(a) => a.page.len(),
            HugeArray::Paged(a) => a.size,
        }
    }

    /// Estimated bytes of the element storage
    pub fn memory_used(&self) -> u64 {
        match self {
            HugeArray::Single(a) => a.memory_used,
            HugeArray::Paged(a) => a.memory_used,
        }
    }

    /// Whether the paged representation was chosen
    pub fn is_paged(&self) -> bool {
        matches!(self, HugeArray::Paged(_))
    }

    /// Reference to the element at `index`
    #[inline]
    pub fn get_ref(&self, index: usize) -> &T {
        debug_assert!(index < self.size(), "index {} out of bounds for size {}", index, self.size());
        match self {
            HugeArray::Single(a) => &a.page[index],
            HugeArray::Paged(a) => {
                &a.pages[HUGE_GEOMETRY.page_index(index)][HUGE_GEOMETRY.index_in_page(index)]
            }
        }
    }

    #[inline]
    fn slot_mut(&mut self, index: usize) -> &mut T {
        debug_assert!(index < self.size(), "index {} out of bounds for size {}", index, self.size());
        match self {
            HugeArray::Single(a) => &mut a.page[index],
            HugeArray::Paged(a) => {
                &mut a.pages[HUGE_GEOMETRY.page_index(index)][HUGE_GEOMETRY.index_in_page(index)]
            }
        }
    }

    /// Store `value` at `index`
    #[inline]
    pub fn set(&mut self, index: usize, value: T) {
        *self.slot_mut(index) = value;
    }

    /// Set each element to `generator(index)`
    pub fn set_all(&mut self, generator: impl Fn(usize) -> T) {
        let size = self.size();
        self.for_each_slice_mut(0, size, |base, slice| {
            for (i, slot) in slice.iter_mut().enumerate() {
                *slot = generator(base + i);
            }
        });
    }

    /// Set every element to `value`
    pub fn fill(&mut self, value: T) {
        let size = self.size();
        self.fill_range(0, size, value);
    }

    fn fill_range(&mut self, start: usize, end: usize, value: T) {
        self.for_each_slice_mut(start, end, |_, slice| slice.fill(value.clone()));
    }

    fn write_slice(&mut self, at: usize, values: &[T]) {
        self.for_each_slice_mut(at, at + values.len(), |base, slice| {
            let from = base - at;
            slice.clone_from_slice(&values[from..from + slice.len()]);
        });
    }

    /// Call `f(base, slice)` for each contiguous run of `[start, end)`
    fn for_each_slice_mut(&mut self, start: usize, end: usize, mut f: impl FnMut(usize, &mut [T])) {
        if start >= end {
            return;
        }
        match self {
            HugeArray::Single(a) => f(start, &mut a.page[start..end]),
            HugeArray::Paged(a) => {
                let first = HUGE_GEOMETRY.page_index(start);
                let last = HUGE_GEOMETRY.page_index(end - 1);
                for page_index in first..=last {
                    let page = &mut a.pages[page_index];
                    let from = if page_index == first { HUGE_GEOMETRY.index_in_page(start) } else { 0 };
                    let to = if page_index == last { HUGE_GEOMETRY.exclusive_index_of_page(end) } else { page.len() };
                    f(HUGE_GEOMETRY.capacity_for(page_index) + from, &mut page[from..to]);
                }
            }
        }
    }

    /// Copy the first `length` elements into `dest`, resetting the rest of `dest`
    ///
    /// `length` is capped at both sizes. Elements of `dest` from the copied
    /// length onwards are set to the default value.
    pub fn copy_to(&self, dest: &mut HugeArray<T>, length: usize) {
        let length = length.min(self.size()).min(dest.size());
        let mut cursor = self.cursor_range(0, length);
        let mut at = 0;
        while cursor.next() {
            let chunk = cursor.slice();
            dest.write_slice(at, chunk);
            at += chunk.len();
        }
        cursor.close();
        let dest_size = dest.size();
        dest.fill_range(length, dest_size, T::default());
    }

    /// An unpositioned cursor over this array
    pub fn new_cursor(&self) -> HugeCursor<'_, T> {
        HugeCursor::new(self.cursor_source())
    }

    /// A cursor positioned over every element
    pub fn cursor(&self) -> HugeCursor<'_, T> {
        self.cursor_range(0, self.size())
    }

    /// A cursor positioned over `[start, end)`
    pub fn cursor_range(&self, start: usize, end: usize) -> HugeCursor<'_, T> {
        let mut cursor = self.new_cursor();
        cursor.set_range(start, end);
        cursor
    }

    pub(crate) fn cursor_source(&self) -> CursorSource<'_, T> {
        match self {
            HugeArray::Single(a) => CursorSource::Single(&a.page),
            HugeArray::Paged(a) => CursorSource::Paged { pages: &a.pages, size: a.size },
        }
    }

    /// Mutable access to every page, in order
    pub(crate) fn pages_mut(&mut self) -> Vec<&mut [T]> {
        match self {
            HugeArray::Single(a) => vec![&mut a.page[..]],
            HugeArray::Paged(a) => a.pages.iter_mut().map(|page| &mut page[..]).collect(),
        }
    }

    /// Copy every element into a flat vector
    pub fn to_vec(&self) -> Result<Vec<T>> {
        let size = self.size();
        if size > MAX_ARRAY_LENGTH {
            return Err(MemoryError::IndexOverflow { length: size as u64, max: MAX_ARRAY_LENGTH as u64 });
        }
        let mut values = Vec::with_capacity(size);
        let mut cursor = self.cursor();
        while cursor.next() {
            values.extend_from_slice(cursor.slice());
        }
        Ok(values)
    }

    /// Drop the element storage, returning its estimated bytes (0 on repeat)
    ///
    /// The tracker is not debited. Access after release panics.
    pub fn release(&mut self) -> u64 {
        let freed = match self {
            HugeArray::Single(a) => {
                a.page = Box::new([]);
                std::mem::take(&mut a.memory_used)
            }
            HugeArray::Paged(a) => {
                a.size = 0;
                a.pages = Box::new([]);
                std::mem::take(&mut a.memory_used)
            }
        };
        if freed > 0 {
            log_debug!(freed = %human_readable(freed), "Huge array released");
        }
        freed
    }
}

impl<T: HugeElement + Copy> HugeArray<T> {
    /// Element at `index`
    #[inline]
    pub fn get(&self, index: usize) -> T {
        *self.get_ref(index)
    }
}

impl<T: HugeElement + Copy + AddAssign> HugeArray<T> {
    /// Add `delta` to the element at `index`
    #[inline]
    pub fn add_to(&mut self, index: usize, delta: T) {
        *self.slot_mut(index) += delta;
    }
}

impl<T: HugeElement + Copy + BitOrAssign + BitAndAssign> HugeArray<T> {
    /// Bitwise or `value` into the element at `index`
    #[inline]
    pub fn or(&mut self, index: usize, value: T) {
        *self.slot_mut(index) |= value;
    }

    /// Bitwise and `value` into the element at `index`, returning the new element
    #[inline]
    pub fn and(&mut self, index: usize, value: T) -> T {
        let slot = self.slot_mut(index);
        *slot &= value;
        *slot
    }
}

impl<T: Clone + Send + Sync + 'static> HugeArray<Option<T>> {
    /// Store `supplier()` at `index` if the slot is empty, returning the stored value
    ///
    /// A supplier returning `None` leaves the slot empty. Exclusive access
    /// makes this exactly-once for the caller; sharing the array across threads
    /// requires external synchronisation.
    pub fn put_if_absent(&mut self, index: usize, supplier: impl FnOnce() -> Option<T>) -> Option<&T> {
        let slot = self.slot_mut(index);
        if slot.is_none() {
            *slot = supplier();
        }
        slot.as_ref()
    }
}

impl<T: HugeElement> fmt::Debug for HugeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HugeArray::Single(a) => f.debug_struct("HugeArray::Single").field("size", &a.page.len()).finish(),
            HugeArray::Paged(a) => f
                .debug_struct("HugeArray::Paged")
                .field("size", &a.size)
                .field("pages", &a.pages.len())
                .finish(),
        }
    }
}

impl<T: HugeElement + fmt::Display> fmt::Display for HugeArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        let mut first = true;
        let mut cursor = self.cursor();
        while cursor.next() {
            for value in cursor.slice() {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{}", value)?;
            }
        }
        f.write_str("]")
    }
}
