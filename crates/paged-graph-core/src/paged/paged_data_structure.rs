//! Growable paged container
//!
//! [`PagedDataStructure`] owns an array of page references together with a
//! logical `size` and a `capacity` rounded up to whole pages. Both counters are
//! read without locking. Growth takes a fair lock only when the capacity is
//! insufficient, allocates the missing pages plus some headroom, and publishes
//! the enlarged page array atomically. Readers therefore see either the old or
//! the new page array, never a partially filled one.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use crossbeam::utils::CachePadded;
use parking_lot::{Mutex, MutexGuard};

use crate::constants::MAX_PAGE_COUNT;
use crate::memory::layout::human_readable;
use crate::memory::PageGeometry;
use crate::paged::page_allocator::PageAllocator;
use crate::types::error::{MemoryError, Result};
use crate::log_debug;

/// Snapshot of the page array
pub type Pages<P> = Arc<Vec<Arc<P>>>;

/// Capacity-tracked array of pages supporting concurrent growth
pub struct PagedDataStructure<P> {
    pages: ArcSwap<Vec<Arc<P>>>,
    size: CachePadded<AtomicUsize>,
    capacity: CachePadded<AtomicUsize>,
    grow_lock: Mutex<()>,
    released: AtomicBool,
    geometry: PageGeometry,
    allocator: PageAllocator<P>,
}

impl<P: Send + Sync + 'static> PagedDataStructure<P> {
    /// Create a container with `size` logical elements, allocating every page up front
    pub fn new(size: usize, allocator: PageAllocator<P>) -> Result<Self> {
        let geometry = PageGeometry::new(allocator.page_size().trailing_zeros());
        let num_pages = geometry.checked_num_pages(size)?;
        let pages: Vec<Arc<P>> = (0..num_pages).map(|_| Arc::new(allocator.new_page())).collect();
        Ok(Self {
            pages: ArcSwap::from_pointee(pages),
            size: CachePadded::new(AtomicUsize::new(size)),
            capacity: CachePadded::new(AtomicUsize::new(geometry.capacity_for(num_pages))),
            grow_lock: Mutex::new(()),
            released: AtomicBool::new(false),
            geometry,
            allocator,
        })
    }

    /// Create a container over pages built elsewhere
    ///
    /// Fails when `pages` cannot hold `size` elements.
    pub fn from_pages(size: usize, pages: Vec<Arc<P>>, allocator: PageAllocator<P>) -> Result<Self> {
        let geometry = PageGeometry::new(allocator.page_size().trailing_zeros());
        let capacity = geometry.capacity_for(pages.len());
        if size > capacity {
            return Err(MemoryError::capacity(size as u64, capacity as u64));
        }
        Ok(Self {
            pages: ArcSwap::from_pointee(pages),
            size: CachePadded::new(AtomicUsize::new(size)),
            capacity: CachePadded::new(AtomicUsize::new(capacity)),
            grow_lock: Mutex::new(()),
            released: AtomicBool::new(false),
            geometry,
            allocator,
        })
    }

    /// Logical number of elements
    #[inline]
    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    /// Number of elements that can be written without growing
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity.load(Ordering::Acquire)
    }

    /// Largest size this container can grow to
    pub fn max_supported_size(&self) -> usize {
        self.geometry.max_supported_size()
    }

    /// Page geometry of the container
    #[inline(always)]
    pub fn geometry(&self) -> PageGeometry {
        self.geometry
    }

    /// Number of allocated pages
    pub fn page_count(&self) -> usize {
        self.pages.load().len()
    }

    /// The allocator new pages come from
    pub fn allocator(&self) -> &PageAllocator<P> {
        &self.allocator
    }

    /// Borrow the current page array for a short read or write
    #[inline(always)]
    pub fn pages(&self) -> Guard<Pages<P>> {
        self.pages.load()
    }

    /// Owned snapshot of the current page array, for cursors and adders
    #[inline]
    pub fn snapshot(&self) -> Pages<P> {
        self.pages.load_full()
    }

    /// Run `f` on the page holding `index`
    #[inline(always)]
    pub fn with_page<R>(&self, index: usize, f: impl FnOnce(&P, usize) -> R) -> R {
        let pages = self.pages.load();
        f(&pages[self.geometry.page_index(index)], self.geometry.index_in_page(index))
    }

    /// Grow the logical size to at least `new_size`
    ///
    /// The size never decreases. Pages are only allocated when the capacity
    /// does not already cover `new_size`; concurrent growers allocate once.
    pub fn grow(&self, new_size: usize) -> Result<()> {
        if new_size > self.max_supported_size() {
            return Err(MemoryError::capacity(new_size as u64, self.max_supported_size() as u64));
        }
        if self.capacity() >= new_size {
            self.grow_size(new_size);
            return Ok(());
        }
        let guard = self.grow_lock.lock();
        let outcome = if self.capacity() >= new_size {
            Ok(())
        } else {
            self.set_pages(new_size)
        };
        if outcome.is_ok() {
            self.grow_size(new_size);
        }
        MutexGuard::unlock_fair(guard);
        outcome
    }

    fn grow_size(&self, new_size: usize) {
        let mut size = self.size.load(Ordering::Acquire);
        while size < new_size {
            match self.size.compare_exchange_weak(size, new_size, Ordering::AcqRel, Ordering::Acquire) {
                Ok(_) => break,
                Err(actual) => size = actual,
            }
        }
    }

    // Caller holds the grow lock.
    fn set_pages(&self, new_size: usize) -> Result<()> {
        let current = self.pages.load_full();
        let needed = self.geometry.checked_num_pages(new_size)?;
        let target = needed.saturating_add((needed >> 3).max(1)).min(MAX_PAGE_COUNT);

        let mut pages = Vec::with_capacity(target);
        pages.extend(current.iter().cloned());
        for _ in current.len()..target {
            pages.push(Arc::new(self.allocator.new_page()));
        }

        let new_capacity = self.geometry.capacity_for(target);
        self.pages.store(Arc::new(pages));
        self.capacity.store(new_capacity, Ordering::Release);

        log_debug!(
            old_pages = current.len(),
            new_pages = target,
            capacity = new_capacity,
            "Paged structure grown"
        );
        Ok(())
    }

    /// Drop the page array and return the estimated bytes it held
    ///
    /// The tracker is not debited. A second call returns 0.
    pub fn release(&self) -> u64 {
        if self.released.swap(true, Ordering::AcqRel) {
            return 0;
        }
        let _guard = self.grow_lock.lock();
        let capacity = self.capacity.swap(0, Ordering::AcqRel);
        self.size.store(0, Ordering::Release);
        self.pages.store(Arc::new(Vec::new()));
        let freed = self.allocator.estimate_memory_usage(capacity);
        log_debug!(freed = %human_readable(freed), "Paged structure released");
        freed
    }

    /// Whether `release` was called
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }
}
