//! Page allocation
//!
//! A [`PageAllocatorFactory`] describes pages of one kind: their element count,
//! their estimated byte size and how to build one. Binding a factory to a
//! tracker yields a [`PageAllocator`], either direct (no accounting) or
//! tracking (every page credits the tracker), without the structure using it
//! having to know which.

use std::fmt;

use crate::memory::layout::MemoryLayout;
use crate::memory::{bit_util, AllocationTracker, PageGeometry};
use crate::paged::slot::{self, AtomicSlot};

/// How a page is built
pub enum PageFactory<P> {
    /// Pages with a fixed byte size; the allocator credits `bytes_per_page`
    Sized(fn(usize) -> P),
    /// Pages that account their own internal allocations into the tracker
    SelfTracking(fn(usize, &AllocationTracker) -> P),
}

impl<P> Clone for PageFactory<P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P> Copy for PageFactory<P> {}

/// Description of one kind of page
pub struct PageAllocatorFactory<P> {
    page_size: usize,
    bytes_per_page: u64,
    new_page: PageFactory<P>,
}

impl<P> Clone for PageAllocatorFactory<P> {
    fn clone(&self) -> Self {
        Self { page_size: self.page_size, bytes_per_page: self.bytes_per_page, new_page: self.new_page }
    }
}

impl<P> fmt::Debug for PageAllocatorFactory<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageAllocatorFactory")
            .field("page_size", &self.page_size)
            .field("bytes_per_page", &self.bytes_per_page)
            .finish()
    }
}

impl<P> PageAllocatorFactory<P> {
    /// Pages of `page_size` elements costing `bytes_per_page` each
    pub fn of(page_size: usize, bytes_per_page: u64, new_page: fn(usize) -> P) -> Self {
        Self::with_factory(page_size, bytes_per_page, PageFactory::Sized(new_page))
    }

    /// Pages that report their own allocations to the tracker
    ///
    /// `bytes_per_page` is still used by the estimators.
    pub fn self_tracking(
        page_size: usize,
        bytes_per_page: u64,
        new_page: fn(usize, &AllocationTracker) -> P,
    ) -> Self {
        Self::with_factory(page_size, bytes_per_page, PageFactory::SelfTracking(new_page))
    }

    fn with_factory(page_size: usize, bytes_per_page: u64, new_page: PageFactory<P>) -> Self {
        debug_assert!(bit_util::is_power_of_two(page_size as u64));
        Self { page_size, bytes_per_page, new_page }
    }

    /// Elements per page
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Estimated bytes of one page
    pub fn bytes_per_page(&self) -> u64 {
        self.bytes_per_page
    }

    /// Page geometry matching the page size
    pub fn geometry(&self) -> PageGeometry {
        PageGeometry::new(self.page_size.trailing_zeros())
    }

    /// Estimated bytes of the pages needed for `size` elements
    ///
    /// Saturates at `u64::MAX` rather than wrapping.
    pub fn estimate_memory_usage(&self, size: usize) -> u64 {
        (self.geometry().num_pages(size) as u64).saturating_mul(self.bytes_per_page)
    }

    /// Estimated bytes of the pages plus the inline size of the container `C`
    pub fn estimate_memory_usage_with<C>(&self, size: usize) -> u64 {
        MemoryLayout::global()
            .size_of_instance::<C>()
            .saturating_add(self.estimate_memory_usage(size))
    }

    /// Bind the factory to a tracker
    pub fn new_allocator(&self, tracker: &AllocationTracker) -> PageAllocator<P> {
        let kind = if AllocationTracker::is_tracking(tracker) {
            AllocatorKind::Tracking(tracker.clone())
        } else {
            AllocatorKind::Direct
        };
        PageAllocator { factory: self.clone(), kind }
    }
}

impl<A: AtomicSlot> PageAllocatorFactory<Box<[A]>> {
    /// Pages of atomic slots sized to the per-page byte budget
    pub fn of_array() -> Self {
        let geometry = PageGeometry::for_element_bytes(A::BYTES);
        Self::of_array_with_page_size(geometry.size())
    }

    /// Pages of atomic slots with an explicit element count
    pub fn of_array_with_page_size(page_size: usize) -> Self {
        let bytes_per_page = MemoryLayout::global().size_of_array(page_size as u64, A::BYTES as u64);
        Self::of(page_size, bytes_per_page, slot::new_page::<A>)
    }
}

enum AllocatorKind {
    Direct,
    Tracking(AllocationTracker),
}

/// A page factory bound to a tracker
pub struct PageAllocator<P> {
    factory: PageAllocatorFactory<P>,
    kind: AllocatorKind,
}

impl<P> PageAllocator<P> {
    /// Build a fully initialised page, crediting the tracker if tracking
    pub fn new_page(&self) -> P {
        match (&self.kind, self.factory.new_page) {
            (AllocatorKind::Direct, PageFactory::Sized(new_page)) => new_page(self.factory.page_size),
            (AllocatorKind::Direct, PageFactory::SelfTracking(new_page)) => {
                new_page(self.factory.page_size, &AllocationTracker::empty())
            }
            (AllocatorKind::Tracking(tracker), PageFactory::Sized(new_page)) => {
                tracker.add(self.factory.bytes_per_page);
                new_page(self.factory.page_size)
            }
            (AllocatorKind::Tracking(tracker), PageFactory::SelfTracking(new_page)) => {
                new_page(self.factory.page_size, tracker)
            }
        }
    }

    /// Elements per page
    pub fn page_size(&self) -> usize {
        self.factory.page_size
    }

    /// Estimated bytes of one page
    pub fn bytes_per_page(&self) -> u64 {
        self.factory.bytes_per_page
    }

    /// Estimated bytes of the pages needed for `size` elements
    pub fn estimate_memory_usage(&self, size: usize) -> u64 {
        self.factory.estimate_memory_usage(size)
    }

    /// Whether pages are accounted
    pub fn is_tracking(&self) -> bool {
        matches!(self.kind, AllocatorKind::Tracking(_))
    }

    /// The tracker pages are accounted into, or the no-op tracker
    pub fn tracker(&self) -> AllocationTracker {
        match &self.kind {
            AllocatorKind::Tracking(tracker) => tracker.clone(),
            AllocatorKind::Direct => AllocationTracker::empty(),
        }
    }
}
