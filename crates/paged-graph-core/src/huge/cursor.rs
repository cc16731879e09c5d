//! Bulk traversal over huge arrays
//!
//! A cursor walks a half-open range one contiguous backing slice at a time.
//! It is an explicit state machine:
//!
//! ```text
//! Unpositioned --set_range--> Positioned --next()==false--> Exhausted
//!       \                         |                            |
//!        +--------close()---------+------------close()---------+--> Closed
//! ```
//!
//! The exposed slice borrows the cursor, so it cannot outlive the following
//! `next()` or `close()`. The cursor itself borrows the array, which keeps the
//! array from being released while the cursor is open.

use crate::huge::huge_array::HUGE_GEOMETRY;

/// Backing storage a cursor walks over
pub(crate) enum CursorSource<'a, T> {
    Single(&'a [T]),
    Paged { pages: &'a [Box<[T]>], size: usize },
}

impl<T> Clone for CursorSource<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for CursorSource<'_, T> {}

impl<T> CursorSource<'_, T> {
    fn size(&self) -> usize {
        match self {
            CursorSource::Single(page) => page.len(),
            CursorSource::Paged { size, .. } => *size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    Unpositioned,
    Positioned,
    Exhausted,
    Closed,
}

/// Zero-copy view over one contiguous run of a huge array at a time
///
/// ```ignore
/// let mut cursor = array.cursor_range(10, 100_000);
/// while cursor.next() {
///     for (i, value) in cursor.slice().iter().enumerate() {
///         let index = cursor.base() + cursor.offset() + i;
///     }
/// }
/// cursor.close();
/// ```
pub struct HugeCursor<'a, T> {
    source: CursorSource<'a, T>,
    state: CursorState,
    array: &'a [T],
    base: usize,
    offset: usize,
    limit: usize,
    start: usize,
    end: usize,
    next_page: usize,
    max_page: usize,
}

impl<'a, T> HugeCursor<'a, T> {
    pub(crate) fn new(source: CursorSource<'a, T>) -> Self {
        Self {
            source,
            state: CursorState::Unpositioned,
            array: &[],
            base: 0,
            offset: 0,
            limit: 0,
            start: 0,
            end: 0,
            next_page: 1,
            max_page: 0,
        }
    }

    /// Position the cursor over `[start, end)`
    ///
    /// An empty range (`start >= end`) is valid and yields no slices. A closed
    /// cursor stays closed.
    pub fn set_range(&mut self, start: usize, end: usize) {
        debug_assert!(end <= self.source.size(), "range end {} beyond size {}", end, self.source.size());
        if self.state == CursorState::Closed {
            return;
        }
        self.state = CursorState::Positioned;
        self.array = &[];
        self.base = 0;
        self.offset = 0;
        self.limit = 0;
        self.start = start;
        self.end = end;
        if start >= end {
            self.next_page = 1;
            self.max_page = 0;
            return;
        }
        match self.source {
            CursorSource::Single(_) => {
                self.next_page = 0;
                self.max_page = 0;
            }
            CursorSource::Paged { .. } => {
                self.next_page = HUGE_GEOMETRY.page_index(start);
                self.max_page = HUGE_GEOMETRY.page_index(end - 1);
            }
        }
    }

    /// Advance to the next slice, returning false once the range is exhausted
    pub fn next(&mut self) -> bool {
        if self.state != CursorState::Positioned {
            return false;
        }
        if self.next_page > self.max_page {
            self.state = CursorState::Exhausted;
            self.array = &[];
            self.offset = 0;
            self.limit = 0;
            return false;
        }

        let page_index = self.next_page;
        self.next_page += 1;
        match self.source {
            CursorSource::Single(page) => {
                self.array = page;
                self.base = 0;
                self.offset = self.start;
                self.limit = self.end;
            }
            CursorSource::Paged { pages, .. } => {
                let first_page = HUGE_GEOMETRY.page_index(self.start);
                self.array = &pages[page_index];
                self.base = HUGE_GEOMETRY.capacity_for(page_index);
                self.offset = if page_index == first_page { HUGE_GEOMETRY.index_in_page(self.start) } else { 0 };
                self.limit = if page_index == self.max_page {
                    HUGE_GEOMETRY.exclusive_index_of_page(self.end)
                } else {
                    self.array.len()
                };
            }
        }
        true
    }

    /// The whole backing page of the current slice
    #[inline]
    pub fn array(&self) -> &[T] {
        self.array
    }

    /// Index into `array()` of the first element of the current slice
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Exclusive index into `array()` ending the current slice
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Array index of `array()[0]`
    #[inline]
    pub fn base(&self) -> usize {
        self.base
    }

    /// The current slice, `array()[offset()..limit()]`
    #[inline]
    pub fn slice(&self) -> &[T] {
        &self.array[self.offset..self.limit]
    }

    /// Whether the cursor has been closed
    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    /// Drop the page reference; the cursor yields nothing afterwards
    pub fn close(&mut self) {
        self.state = CursorState::Closed;
        self.array = &[];
        self.base = 0;
        self.offset = 0;
        self.limit = 0;
    }
}
