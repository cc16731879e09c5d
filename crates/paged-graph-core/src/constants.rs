//! Global constants used throughout the paged structures
//!
//! Page geometry is fixed at compile time so that index decomposition is a
//! shift and a mask on every access.

/// Page shift of the huge array family (16384 elements per page)
///
/// A page of 8-byte elements is 128 KiB, small enough to allocate without
/// fragmenting the heap and large enough that the page-pointer array of a
/// multi-billion element array stays tiny.
pub const HUGE_PAGE_SHIFT: u32 = 14;

/// Number of elements per page of the huge array family
pub const HUGE_PAGE_SIZE: usize = 1 << HUGE_PAGE_SHIFT;

/// Mask extracting the in-page offset of the huge array family
pub const HUGE_PAGE_MASK: usize = HUGE_PAGE_SIZE - 1;

/// Largest element count stored in a single flat page
///
/// Requests up to this size use the single-page representation of a huge array.
/// It is also the largest length a flat `Vec` export (`to_vec`) accepts.
pub const MAX_ARRAY_LENGTH: usize = 1 << 28;

/// Byte budget of one page of the growable family (32 KiB)
///
/// The element count per page is derived from this budget and the element width.
pub const PAGE_SIZE_IN_BYTES: usize = 1 << 15;

/// Largest number of pages any paged structure may hold
pub const MAX_PAGE_COUNT: usize = i32::MAX as usize;

/// Pages claimed ahead by a byte store allocator on each shared bump
pub const DEFAULT_PREFETCH_PAGES: usize = 16;

/// Value returned for absent entries of sparse arrays and maps
pub const NO_VALUE: i64 = -1;
