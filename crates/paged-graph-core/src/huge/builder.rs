//! Concurrent bulk filling of a pre-sized huge array
//!
//! The builder borrows the array mutably for its whole lifetime and hands out
//! disjoint index ranges through an atomic bump pointer. Each claim becomes a
//! [`HugeBulkAdder`] that exposes the claimed range one backing buffer at a
//! time, so callers on different threads fill their ranges with no further
//! synchronisation.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam::utils::CachePadded;

use crate::huge::element::HugeElement;
use crate::huge::huge_array::{HugeArray, HUGE_GEOMETRY};

/// Raw view of one backing page
struct PagePtr<T> {
    ptr: *mut T,
    len: usize,
}

/// Hands out disjoint ranges of a huge array to concurrent writers
pub struct HugeArrayBuilder<'a, T> {
    pages: Box<[PagePtr<T>]>,
    paged: bool,
    length: usize,
    allocation_index: CachePadded<AtomicUsize>,
    _array: PhantomData<&'a mut [T]>,
}

// SAFETY: the builder holds the only access to the array's pages for `'a`.
// Ranges handed out by `allocate` never overlap, so each element is written
// through at most one adder. Sharing requires `T: Send` since values written
// on one thread are dropped or read on another.
unsafe impl<T: Send> Send for HugeArrayBuilder<'_, T> {}
unsafe impl<T: Send> Sync for HugeArrayBuilder<'_, T> {}

impl<'a, T: HugeElement> HugeArrayBuilder<'a, T> {
    /// Wrap `array`; claims start at index 0
    pub fn new(array: &'a mut HugeArray<T>) -> Self {
        let paged = array.is_paged();
        let length = array.size();
        let pages = array
            .pages_mut()
            .into_iter()
            .map(|page| PagePtr { ptr: page.as_mut_ptr(), len: page.len() })
            .collect();
        Self {
            pages,
            paged,
            length,
            allocation_index: CachePadded::new(AtomicUsize::new(0)),
            _array: PhantomData,
        }
    }

    /// Claim the next `[start, min(length, start + n))`
    ///
    /// Returns `None` once every index has been claimed, or when `n` is 0.
    pub fn allocate(&self, n: usize) -> Option<HugeBulkAdder<'_, T>> {
        if n == 0 {
            return None;
        }
        let mut start = self.allocation_index.load(Ordering::Relaxed);
        loop {
            if start >= self.length {
                return None;
            }
            let end = start.saturating_add(n).min(self.length);
            match self.allocation_index.compare_exchange_weak(
                start,
                end,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Some(HugeBulkAdder::new(self, start, end)),
                Err(actual) => start = actual,
            }
        }
    }

    /// Indices claimed so far
    pub fn allocated(&self) -> usize {
        self.allocation_index.load(Ordering::Acquire)
    }

    /// Length of the underlying array
    pub fn length(&self) -> usize {
        self.length
    }

    fn page_of(&self, index: usize) -> (usize, usize) {
        if self.paged {
            (HUGE_GEOMETRY.page_index(index), HUGE_GEOMETRY.index_in_page(index))
        } else {
            (0, index)
        }
    }
}

/// Writer over one claimed range of a [`HugeArrayBuilder`]
pub struct HugeBulkAdder<'b, T> {
    builder: &'b HugeArrayBuilder<'b, T>,
    start: usize,
    end: usize,
    position: usize,
    base: usize,
    offset: usize,
    limit: usize,
}

impl<'b, T: HugeElement> HugeBulkAdder<'b, T> {
    fn new(builder: &'b HugeArrayBuilder<'b, T>, start: usize, end: usize) -> Self {
        Self { builder, start, end, position: start, base: 0, offset: 0, limit: 0 }
    }

    /// First claimed index
    pub fn start(&self) -> usize {
        self.start
    }

    /// Exclusive end of the claim
    pub fn end(&self) -> usize {
        self.end
    }

    /// Array index of the page holding the current buffer
    pub fn base(&self) -> usize {
        self.base
    }

    /// In-page index of the current buffer's first element
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// In-page exclusive end of the current buffer
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Next backing buffer of the claim, or `None` once the claim is covered
    ///
    /// The buffer holds array indices `base() + offset()` up to
    /// `base() + limit()`.
    pub fn next_buffer(&mut self) -> Option<&mut [T]> {
        if self.position >= self.end {
            return None;
        }
        let (page_index, offset) = self.builder.page_of(self.position);
        let page = &self.builder.pages[page_index];
        let limit = (offset + (self.end - self.position)).min(page.len);
        self.base = self.position - offset;
        self.offset = offset;
        self.limit = limit;
        self.position += limit - offset;
        // SAFETY: `[offset, limit)` lies inside the page and maps to array
        // indices inside this adder's claim, which no other adder can hold.
        // `&mut self` keeps this adder from handing out two live buffers.
        let buffer = unsafe { std::slice::from_raw_parts_mut(page.ptr.add(offset), limit - offset) };
        Some(buffer)
    }

    /// Fill the whole claim with `generator(index)`
    pub fn fill_with(&mut self, generator: impl Fn(usize) -> T) {
        loop {
            let first = self.position;
            let Some(buffer) = self.next_buffer() else { break };
            for (i, slot) in buffer.iter_mut().enumerate() {
                *slot = generator(first + i);
            }
        }
    }
}
