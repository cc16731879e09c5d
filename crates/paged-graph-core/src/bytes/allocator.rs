//! Writers for the byte store
//!
//! A [`BulkAdder`] writes sequentially through one claimed region of a
//! [`ByteArray`] using its own snapshot of the page array. A
//! [`LocalAllocator`] is the per-worker allocation context: it claims a
//! prefetch window of several pages from the shared bump pointer and carves
//! small records out of that window without touching shared state.

use std::fmt;

use crate::bytes::byte_array::{write_bytes, ByteArray, BytePage};
use crate::bytes::varint::{self, MAX_VLONG_BYTES};
use crate::constants::DEFAULT_PREFETCH_PAGES;
use crate::memory::PageGeometry;
use crate::paged::paged_data_structure::Pages;
use crate::types::error::Result;

/// Sequential writer over a claimed byte range
pub struct BulkAdder {
    pages: Pages<BytePage>,
    geometry: PageGeometry,
    position: usize,
    end: usize,
}

impl BulkAdder {
    pub(crate) fn new(pages: Pages<BytePage>, geometry: PageGeometry) -> Self {
        Self { pages, geometry, position: 0, end: 0 }
    }

    /// Adopt a newer page array snapshot
    pub(crate) fn grow(&mut self, pages: Pages<BytePage>) {
        self.pages = pages;
    }

    /// Point the adder at `[from, from + length)`
    pub(crate) fn init(&mut self, from: usize, length: usize) {
        debug_assert!(from + length <= self.geometry.capacity_for(self.pages.len()));
        self.position = from;
        self.end = from + length;
    }

    /// Index the next byte goes to
    pub fn position(&self) -> usize {
        self.position
    }

    /// Bytes left in the claimed range
    pub fn remaining(&self) -> usize {
        self.end - self.position
    }

    fn put(&mut self, bytes: &[u8]) {
        debug_assert!(bytes.len() <= self.remaining(), "write of {} bytes overruns claim", bytes.len());
        let n = bytes.len().min(self.remaining());
        self.position += write_bytes(&self.pages, self.geometry, self.position, &bytes[..n]);
    }

    /// Append one byte
    pub fn add_byte(&mut self, value: u8) {
        self.put(&[value]);
    }

    /// Append `value` as 4 big-endian bytes
    pub fn add_unsigned_int(&mut self, value: u32) {
        self.put(&value.to_be_bytes());
    }

    /// Append `value` as a varint
    pub fn add_vlong(&mut self, value: u64) {
        let mut buf = [0u8; MAX_VLONG_BYTES];
        let n = varint::encode_vlong(value, &mut buf);
        self.put(&buf[..n]);
    }
}

impl fmt::Debug for BulkAdder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BulkAdder")
            .field("position", &self.position)
            .field("end", &self.end)
            .field("pages", &self.pages.len())
            .finish()
    }
}

/// Per-worker allocation context over a shared [`ByteArray`]
///
/// The window `[top, limit)` is refilled from the shared bump pointer only
/// when a request does not fit, so most allocations are local arithmetic.
pub struct LocalAllocator<'a> {
    array: &'a ByteArray,
    adder: BulkAdder,
    prefetch_size: usize,
    top: usize,
    limit: usize,
}

impl<'a> LocalAllocator<'a> {
    pub(crate) fn new(array: &'a ByteArray) -> Self {
        Self::with_prefetch_pages(array, DEFAULT_PREFETCH_PAGES)
    }

    /// Allocator claiming `pages` pages per refill
    pub fn with_prefetch_pages(array: &'a ByteArray, pages: usize) -> Self {
        let adder = array.new_bulk_adder();
        let prefetch_size = adder.geometry.capacity_for(pages.max(1));
        Self { array, adder, prefetch_size, top: 0, limit: 0 }
    }

    /// Reserve `size` bytes and point the adder at them, returning their first index
    pub fn allocate(&mut self, size: usize) -> Result<usize> {
        let address = self.top;
        if address + size <= self.limit {
            self.top += size;
            self.adder.init(address, size);
            return Ok(address);
        }
        self.major_allocate(size)
    }

    fn major_allocate(&mut self, size: usize) -> Result<usize> {
        let claim = size.max(self.prefetch_size);
        let address = self.array.allocate(claim, &mut self.adder)?;
        self.top = address + size;
        self.limit = address + claim;
        self.adder.init(address, size);
        Ok(address)
    }

    /// Writer over the most recent allocation
    pub fn adder(&mut self) -> &mut BulkAdder {
        &mut self.adder
    }

    /// Bytes per refill of the local window
    pub fn prefetch_size(&self) -> usize {
        self.prefetch_size
    }

    /// Write `values` as a delta run, returning the index of its count prefix
    ///
    /// Ascending values encode shortest.
    pub fn write_delta_run(&mut self, values: &[u64]) -> Result<usize> {
        let count = varint::run_count(values.len())?;
        let address = self.allocate(varint::delta_run_size(values))?;
        self.adder.add_unsigned_int(count);
        for delta in varint::deltas(values) {
            self.adder.add_vlong(delta);
        }
        Ok(address)
    }
}

impl fmt::Debug for LocalAllocator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalAllocator")
            .field("top", &self.top)
            .field("limit", &self.limit)
            .field("prefetch_size", &self.prefetch_size)
            .finish()
    }
}
