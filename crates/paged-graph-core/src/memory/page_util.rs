//! Page index decomposition and page sizing
//!
//! Every paged structure addresses an element by splitting its index into a
//! page index (`index >> shift`) and an offset inside that page (`index & mask`).

use crate::constants::{MAX_PAGE_COUNT, PAGE_SIZE_IN_BYTES};
use crate::memory::bit_util;
use crate::types::error::{MemoryError, Result};

/// Number of elements of `bytes_per_element` that fit the per-page byte budget
#[inline]
pub const fn page_size_for(bytes_per_element: usize) -> usize {
    debug_assert!(bit_util::is_power_of_two(bytes_per_element as u64));
    PAGE_SIZE_IN_BYTES / bytes_per_element
}

/// Number of pages needed to hold `capacity` elements
#[inline]
pub const fn num_pages_for(capacity: usize, page_shift: u32, page_mask: usize) -> usize {
    (capacity >> page_shift) + ((capacity & page_mask) != 0) as usize
}

/// Page holding `index`
#[inline(always)]
pub const fn page_index(index: usize, page_shift: u32) -> usize {
    index >> page_shift
}

/// Offset of `index` inside its page
#[inline(always)]
pub const fn index_in_page(index: usize, page_mask: usize) -> usize {
    index & page_mask
}

/// Exclusive end offset inside the page that holds `index - 1`
///
/// Used to trim the last page of a half-open range `[.., index)`: a range
/// ending exactly on a page boundary yields a full page rather than 0.
#[inline(always)]
pub const fn exclusive_index_of_page(index: usize, page_mask: usize) -> usize {
    1 + (index.wrapping_sub(1) & page_mask)
}

/// Fixed page geometry: shift, size and mask of one page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    shift: u32,
    size: usize,
    mask: usize,
}

impl PageGeometry {
    /// Geometry for pages of `1 << shift` elements
    pub const fn new(shift: u32) -> Self {
        let size = 1usize << shift;
        Self { shift, size, mask: size - 1 }
    }

    /// Geometry filling the per-page byte budget with elements of the given width
    pub const fn for_element_bytes(bytes_per_element: usize) -> Self {
        Self::new(page_size_for(bytes_per_element).trailing_zeros())
    }

    /// Page shift
    #[inline(always)]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    /// Elements per page
    #[inline(always)]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// In-page offset mask
    #[inline(always)]
    pub const fn mask(&self) -> usize {
        self.mask
    }

    /// Page holding `index`
    #[inline(always)]
    pub const fn page_index(&self, index: usize) -> usize {
        page_index(index, self.shift)
    }

    /// Offset of `index` inside its page
    #[inline(always)]
    pub const fn index_in_page(&self, index: usize) -> usize {
        index_in_page(index, self.mask)
    }

    /// Exclusive end offset of the page holding `index - 1`
    #[inline(always)]
    pub const fn exclusive_index_of_page(&self, index: usize) -> usize {
        exclusive_index_of_page(index, self.mask)
    }

    /// Pages needed to hold `capacity` elements
    #[inline]
    pub const fn num_pages(&self, capacity: usize) -> usize {
        num_pages_for(capacity, self.shift, self.mask)
    }

    /// Pages needed to hold `capacity` elements, failing beyond the page count limit
    pub fn checked_num_pages(&self, capacity: usize) -> Result<usize> {
        let pages = self.num_pages(capacity);
        if pages > MAX_PAGE_COUNT {
            return Err(MemoryError::capacity(
                capacity as u64,
                self.max_supported_size() as u64,
            ));
        }
        Ok(pages)
    }

    /// Element capacity of `pages` full pages
    #[inline]
    pub const fn capacity_for(&self, pages: usize) -> usize {
        pages << self.shift
    }

    /// Largest element count addressable with this geometry
    pub const fn max_supported_size(&self) -> usize {
        MAX_PAGE_COUNT.saturating_mul(self.size)
    }
}
