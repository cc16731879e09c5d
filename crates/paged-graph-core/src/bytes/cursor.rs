//! Decoding cursor for delta runs

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::bytes::byte_array::{read_bytes, BytePage};
use crate::bytes::varint::{MAX_VLONG_BYTES, RUN_HEADER_BYTES};
use crate::memory::PageGeometry;
use crate::paged::paged_data_structure::Pages;

/// Reads one delta run, yielding absolute values as a running sum
///
/// Obtain one from [`ByteArray::delta_cursor`](super::ByteArray::delta_cursor)
/// and hand it back with
/// [`ByteArray::return_cursor`](super::ByteArray::return_cursor) to reuse it.
pub struct DeltaCursor {
    pages: Pages<BytePage>,
    geometry: PageGeometry,
    position: usize,
    length: usize,
    remaining: usize,
    current: u64,
}

impl DeltaCursor {
    pub(crate) fn new(geometry: PageGeometry) -> Self {
        Self {
            pages: Arc::new(Vec::new()),
            geometry,
            position: 0,
            length: 0,
            remaining: 0,
            current: 0,
        }
    }

    /// Position on the run whose count prefix starts at `offset`
    ///
    /// A run whose prefix lies past the last page reads as empty.
    pub(crate) fn init(&mut self, pages: Pages<BytePage>, offset: usize) {
        self.pages = pages;
        self.current = 0;
        let mut header = [0u8; RUN_HEADER_BYTES];
        if read_bytes(&self.pages, self.geometry, offset, &mut header) == RUN_HEADER_BYTES {
            self.length = u32::from_be_bytes(header) as usize;
            self.position = offset + RUN_HEADER_BYTES;
        } else {
            self.length = 0;
            self.position = offset;
        }
        self.remaining = self.length;
    }

    /// Number of values in the run
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the run holds no values
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Values not yet decoded
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Decode the next value, or `None` once the run is exhausted
    ///
    /// Data truncated by the end of the pages also ends the run.
    pub fn next_vlong(&mut self) -> Option<u64> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        match self.read_vlong() {
            Some(delta) => {
                self.current = self.current.wrapping_add(delta);
                Some(self.current)
            }
            None => {
                self.remaining = 0;
                None
            }
        }
    }

    fn read_vlong(&mut self) -> Option<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        let mut read = 0;
        loop {
            let page = self.pages.get(self.geometry.page_index(self.position))?;
            let mut offset = self.geometry.index_in_page(self.position);
            while offset < page.len() {
                let byte = page[offset].load(Ordering::Relaxed);
                offset += 1;
                self.position += 1;
                read += 1;
                if read > MAX_VLONG_BYTES {
                    return None;
                }
                value |= u64::from(byte & 0x7F) << shift;
                if byte & 0x80 == 0 {
                    return Some(value);
                }
                shift += 7;
            }
        }
    }

    /// Drop the page snapshot; the cursor yields nothing until repositioned
    pub fn close(&mut self) {
        self.pages = Arc::new(Vec::new());
        self.length = 0;
        self.remaining = 0;
    }
}

impl Iterator for DeltaCursor {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        self.next_vlong()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl fmt::Debug for DeltaCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeltaCursor")
            .field("position", &self.position)
            .field("length", &self.length)
            .field("remaining", &self.remaining)
            .finish()
    }
}
