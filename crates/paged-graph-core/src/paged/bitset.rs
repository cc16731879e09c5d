//! Growable bitset over pages of atomic words

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::memory::layout::size_of_instance;
use crate::memory::AllocationTracker;
use crate::paged::page_allocator::PageAllocatorFactory;
use crate::paged::paged_data_structure::PagedDataStructure;
use crate::types::error::Result;

const WORD_SHIFT: u32 = 6;
const WORD_MASK: usize = 63;

#[inline(always)]
const fn words_for(bits: usize) -> usize {
    (bits >> WORD_SHIFT) + ((bits & WORD_MASK) != 0) as usize
}

/// Bitset whose bits can be set and cleared concurrently
pub struct PagedSimpleBitSet {
    inner: PagedDataStructure<Box<[AtomicU64]>>,
}

impl PagedSimpleBitSet {
    fn factory() -> PageAllocatorFactory<Box<[AtomicU64]>> {
        PageAllocatorFactory::of_array()
    }

    /// Estimated bytes of a bitset of `bits` bits
    pub fn estimate_memory_usage(bits: usize) -> u64 {
        Self::factory().estimate_memory_usage_with::<Self>(words_for(bits))
    }

    /// Create a bitset of at least `bits` cleared bits
    pub fn new(bits: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let allocator = Self::factory().new_allocator(tracker);
        Ok(Self { inner: PagedDataStructure::new(words_for(bits), allocator)? })
    }

    #[inline(always)]
    fn word<R>(&self, index: usize, f: impl FnOnce(&AtomicU64, u64) -> R) -> R {
        debug_assert!(index < self.capacity());
        self.inner.with_page(index >> WORD_SHIFT, |page, offset| {
            f(&page[offset], 1u64 << (index & WORD_MASK))
        })
    }

    /// Set the bit at `index`
    #[inline]
    pub fn put(&self, index: usize) {
        self.word(index, |word, mask| word.fetch_or(mask, Ordering::Relaxed));
    }

    /// Whether the bit at `index` is set
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        self.word(index, |word, mask| word.load(Ordering::Relaxed) & mask != 0)
    }

    /// Clear the bit at `index`
    #[inline]
    pub fn clear_bit(&self, index: usize) {
        self.word(index, |word, mask| word.fetch_and(!mask, Ordering::Relaxed));
    }

    /// Number of set bits
    pub fn cardinality(&self) -> u64 {
        self.inner
            .pages()
            .iter()
            .flat_map(|page| page.iter())
            .map(|word| u64::from(word.load(Ordering::Relaxed).count_ones()))
            .sum()
    }

    /// Clear every bit
    pub fn clear_all(&self) {
        for page in self.inner.pages().iter() {
            for word in page.iter() {
                word.store(0, Ordering::Relaxed);
            }
        }
    }

    /// Make at least `bits` bits addressable
    pub fn grow(&self, bits: usize) -> Result<()> {
        self.inner.grow(words_for(bits))
    }

    /// Number of addressable bits
    pub fn capacity(&self) -> usize {
        self.inner.capacity() << WORD_SHIFT
    }

    /// Drop the pages, returning the estimated bytes they held (0 on repeat)
    pub fn release(&self) -> u64 {
        self.inner.release()
    }
}

impl fmt::Debug for PagedSimpleBitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagedSimpleBitSet")
            .field("capacity", &self.capacity())
            .field("cardinality", &self.cardinality())
            .finish()
    }
}
