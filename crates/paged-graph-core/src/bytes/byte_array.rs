//! Growable paged byte store
//!
//! [`ByteArray`] holds variable-length records in 32 KiB byte pages. Writers
//! claim byte ranges through a shared bump pointer, usually via a
//! [`LocalAllocator`] that claims many pages at a time, and fill them through
//! a [`BulkAdder`]. Records written by [`LocalAllocator::write_delta_run`] are
//! read back with a [`DeltaCursor`]. Values and varints may straddle a page
//! boundary.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam::queue::SegQueue;
use crossbeam::utils::CachePadded;

use crate::bytes::allocator::{BulkAdder, LocalAllocator};
use crate::bytes::cursor::DeltaCursor;
use crate::memory::{AllocationTracker, PageGeometry};
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::memory::layout::size_of_instance;
use crate::types::error::{MemoryError, Result};
use crate::log_debug;

/// One page of the byte store
pub type BytePage = Box<[AtomicU8]>;

/// Copy `bytes` into the pages from `index` on, returning how many fit
pub(crate) fn write_bytes(pages: &[Arc<BytePage>], geometry: PageGeometry, mut index: usize, bytes: &[u8]) -> usize {
    let mut written = 0;
    while written < bytes.len() {
        let Some(page) = pages.get(geometry.page_index(index)) else { break };
        let offset = geometry.index_in_page(index);
        let n = (page.len() - offset).min(bytes.len() - written);
        for (slot, &byte) in page[offset..offset + n].iter().zip(&bytes[written..written + n]) {
            slot.store(byte, Ordering::Relaxed);
        }
        written += n;
        index += n;
    }
    written
}

/// Fill `out` from the pages starting at `index`, returning how many bytes were available
pub(crate) fn read_bytes(pages: &[Arc<BytePage>], geometry: PageGeometry, mut index: usize, out: &mut [u8]) -> usize {
    let mut read = 0;
    while read < out.len() {
        let Some(page) = pages.get(geometry.page_index(index)) else { break };
        let offset = geometry.index_in_page(index);
        let n = (page.len() - offset).min(out.len() - read);
        for (slot, byte) in page[offset..offset + n].iter().zip(&mut out[read..read + n]) {
            *byte = slot.load(Ordering::Relaxed);
        }
        read += n;
        index += n;
    }
    read
}

/// Paged byte store with a concurrent bump allocator
pub struct ByteArray {
    inner: PagedDataStructure<BytePage>,
    alloc_idx: CachePadded<AtomicUsize>,
    cursors: SegQueue<DeltaCursor>,
}

impl ByteArray {
    /// Page factory of the byte store
    pub fn factory() -> PageAllocatorFactory<BytePage> {
        PageAllocatorFactory::of_array()
    }

    /// Estimated bytes of a store of `size` bytes
    pub fn estimate_memory_usage(size: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(size)
    }

    /// Create a store with `size` zeroed bytes
    pub fn new_array(size: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self {
            inner: PagedDataStructure::new(size, allocator)?,
            alloc_idx: CachePadded::new(AtomicUsize::new(0)),
            cursors: SegQueue::new(),
        })
    }

    /// Byte at `index`
    #[inline]
    pub fn get(&self, index: usize) -> u8 {
        debug_assert!(index < self.capacity(), "index {} out of capacity {}", index, self.capacity());
        self.inner.with_page(index, |page, offset| page[offset].load(Ordering::Relaxed))
    }

    /// Store `value` at `index`, returning the previous byte
    #[inline]
    pub fn set(&self, index: usize, value: u8) -> u8 {
        debug_assert!(index < self.capacity(), "index {} out of capacity {}", index, self.capacity());
        self.inner.with_page(index, |page, offset| page[offset].swap(value, Ordering::Relaxed))
    }

    /// Big-endian 32-bit integer at `index`, possibly spanning two pages
    ///
    /// Returns -1 when the integer would run past the last page.
    pub fn get_int(&self, index: usize) -> i32 {
        debug_assert!(index < self.capacity());
        let mut bytes = [0u8; 4];
        if read_bytes(&self.inner.pages(), self.inner.geometry(), index, &mut bytes) < bytes.len() {
            return -1;
        }
        i32::from_be_bytes(bytes)
    }

    /// Store `value` big-endian at `index`, possibly spanning two pages
    pub fn set_int(&self, index: usize, value: i32) {
        debug_assert!(index + 4 <= self.capacity());
        write_bytes(&self.inner.pages(), self.inner.geometry(), index, &value.to_be_bytes());
    }

    /// A per-worker allocator claiming prefetched regions of this store
    pub fn new_allocator(&self) -> LocalAllocator<'_> {
        LocalAllocator::new(self)
    }

    /// An adder over the current pages, positioned nowhere
    pub fn new_bulk_adder(&self) -> BulkAdder {
        BulkAdder::new(self.inner.snapshot(), self.inner.geometry())
    }

    /// Claim `n` bytes, grow to cover them and point `into` at the claim
    ///
    /// Returns the first index of the claim. A claim ending past the largest
    /// supported size fails without moving the allocation offset.
    pub fn allocate(&self, n: usize, into: &mut BulkAdder) -> Result<usize> {
        let max = self.inner.max_supported_size();
        let index = self
            .alloc_idx
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                current.checked_add(n).filter(|&end| end <= max)
            })
            .map_err(|current| match current.checked_add(n) {
                None => MemoryError::IndexOverflow { length: n as u64, max: (usize::MAX - current) as u64 },
                Some(end) => MemoryError::capacity(end as u64, max as u64),
            })?;
        let end = index + n;
        self.inner.grow(end)?;
        into.grow(self.inner.snapshot());
        into.init(index, n);
        Ok(index)
    }

    /// Skip `n` bytes that will never be allocated
    pub fn skip_allocation_region(&self, n: usize) {
        let _ = self
            .alloc_idx
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| Some(current.saturating_add(n)));
    }

    /// Bytes claimed or skipped so far
    pub fn allocated(&self) -> usize {
        self.alloc_idx.load(Ordering::Acquire)
    }

    /// An unpositioned delta cursor
    pub fn new_cursor(&self) -> DeltaCursor {
        DeltaCursor::new(self.inner.geometry())
    }

    /// A pooled delta cursor positioned on the run at `offset`
    pub fn delta_cursor(&self, offset: usize) -> DeltaCursor {
        let mut cursor = self.cursors.pop().unwrap_or_else(|| self.new_cursor());
        cursor.init(self.inner.snapshot(), offset);
        cursor
    }

    /// Reposition `reuse` on the run at `offset`
    pub fn delta_cursor_reuse<'c>(&self, reuse: &'c mut DeltaCursor, offset: usize) -> &'c mut DeltaCursor {
        reuse.init(self.inner.snapshot(), offset);
        reuse
    }

    /// Close `cursor` and keep it for a later [`delta_cursor`](Self::delta_cursor)
    pub fn return_cursor(&self, mut cursor: DeltaCursor) {
        cursor.close();
        self.cursors.push(cursor);
    }

    /// Closed cursors waiting for reuse
    pub fn pooled_cursors(&self) -> usize {
        self.cursors.len()
    }

    /// Logical number of bytes
    pub fn size(&self) -> usize {
        self.inner.size()
    }

    /// Bytes that can be written without growing
    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    /// Grow the logical size to at least `new_size`
    pub fn grow(&self, new_size: usize) -> Result<()> {
        self.inner.grow(new_size)
    }

    /// Drop the pages and pooled cursors, returning the estimated bytes freed (0 on repeat)
    pub fn release(&self) -> u64 {
        let mut dropped = 0;
        while self.cursors.pop().is_some() {
            dropped += 1;
        }
        if dropped > 0 {
            log_debug!(cursors = dropped, "Dropped pooled delta cursors");
        }
        self.inner.release()
    }
}

impl fmt::Debug for ByteArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteArray")
            .field("size", &self.size())
            .field("capacity", &self.capacity())
            .field("allocated", &self.allocated())
            .finish()
    }
}
