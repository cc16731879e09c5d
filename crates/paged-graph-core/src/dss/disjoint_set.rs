//! Weighted union-find with path compression
//!
//! [`DisjointSetStruct`] keeps two parallel long stores: `parent`, where -1
//! marks a root, and `depth`, the tie-break weight of each root. The store is
//! either a fixed [`HugeLongArray`] or a growable [`LongArray`].
//!
//! Nothing here is synchronised. Parallel algorithms build one structure per
//! worker and combine them with [`DisjointSetStruct::merge`].

use std::fmt;
use std::iter::FusedIterator;

use ahash::{AHashMap, AHashSet};

use crate::constants::NO_VALUE;
use crate::dss::id_mapping::IdMapping;
use crate::huge::HugeLongArray;
use crate::memory::layout::size_of_instance;
use crate::memory::AllocationTracker;
use crate::paged::LongArray;
use crate::types::error::{MemoryError, Result};
use crate::log_debug;

/// Long storage a [`DisjointSetStruct`] can run on
pub trait LongStore: Sized {
    /// Store of `capacity` zeroed longs
    fn new_store(capacity: usize, tracker: &AllocationTracker) -> Result<Self>;

    /// Estimated bytes of a store of `capacity` longs
    fn estimate_store(capacity: usize) -> u64;

    /// Long at `index`
    fn get(&self, index: usize) -> i64;

    /// Store `value` at `index`
    fn set(&mut self, index: usize, value: i64);

    /// Set every long to `value`
    fn fill(&mut self, value: i64);

    /// Drop the storage, returning the estimated bytes freed
    fn release(&mut self) -> u64;
}

impl LongStore for HugeLongArray {
    fn new_store(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        HugeLongArray::new_array(capacity, tracker)
    }

    fn estimate_store(capacity: usize) -> u64 {
        HugeLongArray::estimate_memory_usage(capacity)
    }

    #[inline]
    fn get(&self, index: usize) -> i64 {
        HugeLongArray::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: usize, value: i64) {
        HugeLongArray::set(self, index, value);
    }

    fn fill(&mut self, value: i64) {
        HugeLongArray::fill(self, value);
    }

    fn release(&mut self) -> u64 {
        HugeLongArray::release(self)
    }
}

impl LongStore for LongArray {
    fn new_store(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        LongArray::new_array(capacity, tracker)
    }

    fn estimate_store(capacity: usize) -> u64 {
        LongArray::estimate_memory_usage(capacity)
    }

    #[inline]
    fn get(&self, index: usize) -> i64 {
        LongArray::get(self, index)
    }

    #[inline]
    fn set(&mut self, index: usize, value: i64) {
        LongArray::set(self, index, value);
    }

    fn fill(&mut self, value: i64) {
        LongArray::fill(self, value);
    }

    fn release(&mut self) -> u64 {
        LongArray::release(self)
    }
}

/// Union-find over fixed huge arrays
pub type HugeDisjointSetStruct = DisjointSetStruct<HugeLongArray>;

/// Union-find over growable paged arrays
pub type PagedDisjointSetStruct = DisjointSetStruct<LongArray>;

/// Partition of `0..capacity` into disjoint sets
pub struct DisjointSetStruct<S: LongStore> {
    parent: S,
    depth: S,
    capacity: usize,
}

impl<S: LongStore> DisjointSetStruct<S> {
    /// Estimated bytes of a structure over `capacity` ids
    pub fn estimate_memory_usage(capacity: usize) -> u64 {
        size_of_instance::<Self>().saturating_add(S::estimate_store(capacity).saturating_mul(2))
    }

    /// Structure over `capacity` ids, each in its own set
    pub fn new(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        tracker.add(size_of_instance::<Self>());
        let mut dss = Self {
            parent: S::new_store(capacity, tracker)?,
            depth: S::new_store(capacity, tracker)?,
            capacity,
        };
        dss.reset();
        Ok(dss)
    }

    /// Put every id back into its own set
    pub fn reset(&mut self) -> &mut Self {
        self.parent.fill(NO_VALUE);
        self.depth.fill(0);
        self
    }

    /// Number of ids
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Set id of `p`, compressing the path so every visited id points at the root
    pub fn find(&mut self, p: usize) -> usize {
        let root = self.find_no_opt(p);
        let mut node = p;
        while node != root {
            let next = self.parent.get(node) as usize;
            self.parent.set(node, root as i64);
            node = next;
        }
        root
    }

    /// Set id of `p` without modifying the forest
    pub fn find_no_opt(&self, p: usize) -> usize {
        let mut node = p;
        loop {
            let parent = self.parent.get(node);
            if parent == NO_VALUE {
                return node;
            }
            node = parent as usize;
        }
    }

    /// Tie-break weight stored for `root`
    pub fn depth(&self, root: usize) -> i64 {
        self.depth.get(root)
    }

    /// Whether `p` and `q` are in the same set
    pub fn connected(&mut self, p: usize, q: usize) -> bool {
        self.find(p) == self.find(q)
    }

    /// Join the sets of `p` and `q`
    ///
    /// The shallower root goes under the deeper one. On a tie the root of `q`
    /// goes under the root of `p`, whose depth grows by the depth of `q`'s
    /// root plus one.
    pub fn union(&mut self, p: usize, q: usize) {
        let p_set = self.find(p);
        let q_set = self.find(q);
        if p_set == q_set {
            return;
        }
        let dq = self.depth.get(q_set);
        let dp = self.depth.get(p_set);
        if dp < dq {
            self.parent.set(p_set, q_set as i64);
        } else if dp > dq {
            self.parent.set(q_set, p_set as i64);
        } else {
            self.parent.set(q_set, p_set as i64);
            self.depth.set(p_set, dp + dq + 1);
        }
    }

    /// Replay every non-root id of `other` as a union on this structure
    ///
    /// Fails without modifying anything when the capacities differ.
    pub fn merge<T: LongStore>(&mut self, other: &DisjointSetStruct<T>) -> Result<&mut Self> {
        if other.capacity != self.capacity {
            return Err(MemoryError::MismatchedCapacity { expected: self.capacity as u64, actual: other.capacity as u64 });
        }
        let mut replayed = 0usize;
        for i in (0..other.capacity).rev() {
            if other.parent.get(i) == NO_VALUE {
                continue;
            }
            self.union(i, other.find_no_opt(i));
            replayed += 1;
        }
        log_debug!(capacity = self.capacity, replayed, "Merged disjoint sets");
        Ok(self)
    }

    /// Call `consumer(id, set_id)` for every id, from the highest down, until it returns false
    pub fn for_each(&mut self, mut consumer: impl FnMut(usize, usize) -> bool) {
        for i in (0..self.capacity).rev() {
            let set_id = self.find(i);
            if !consumer(i, set_id) {
                break;
            }
        }
    }

    /// Number of distinct sets
    pub fn get_set_count(&mut self) -> usize {
        let mut roots = AHashSet::new();
        self.for_each(|_, set_id| {
            roots.insert(set_id);
            true
        });
        roots.len()
    }

    /// Number of ids per set id
    pub fn set_sizes(&mut self) -> AHashMap<usize, usize> {
        let mut sizes = AHashMap::new();
        self.for_each(|_, set_id| {
            *sizes.entry(set_id).or_insert(0) += 1;
            true
        });
        sizes
    }

    /// `(id, set_id)` pairs for `start..start + length`, clamped to the capacity
    ///
    /// Uses [`find_no_opt`](Self::find_no_opt), so shared borrows can read in parallel.
    pub fn iter_range(&self, start: usize, length: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
        let end = start.saturating_add(length).min(self.capacity);
        (start.min(end)..end).map(move |id| (id, self.find_no_opt(id)))
    }

    /// Lazy `(original id, set id)` results for every id of `mapping`
    pub fn result_stream<'a, M: IdMapping>(&'a mut self, mapping: &'a M) -> DisjointSetResults<'a, S, M> {
        DisjointSetResults { dss: self, mapping, next: M::START_NODE_ID, end: mapping.node_count() }
    }

    /// Drop both stores, returning the estimated bytes freed
    pub fn release(&mut self) -> u64 {
        let freed = self.parent.release() + self.depth.release();
        self.capacity = 0;
        freed
    }
}

impl<S: LongStore> fmt::Debug for DisjointSetStruct<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisjointSetStruct").field("capacity", &self.capacity).finish()
    }
}

impl<S: LongStore> fmt::Display for DisjointSetStruct<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in 0..self.capacity {
            write!(f, " {} ", id)?;
        }
        writeln!(f)?;
        for id in 0..self.capacity {
            write!(f, "[{}]", self.find_no_opt(id))?;
        }
        Ok(())
    }
}

/// One result of [`DisjointSetStruct::result_stream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisjointSetResult {
    /// Original id of the node
    pub node_id: i64,
    /// Set the node belongs to
    pub set_id: i64,
}

/// Iterator returned by [`DisjointSetStruct::result_stream`]
pub struct DisjointSetResults<'a, S: LongStore, M> {
    dss: &'a mut DisjointSetStruct<S>,
    mapping: &'a M,
    next: usize,
    end: usize,
}

impl<S: LongStore, M: IdMapping> Iterator for DisjointSetResults<'_, S, M> {
    type Item = DisjointSetResult;

    fn next(&mut self) -> Option<DisjointSetResult> {
        if self.next >= self.end {
            return None;
        }
        let id = self.next;
        self.next += 1;
        Some(DisjointSetResult {
            node_id: self.mapping.to_original_node_id(id),
            set_id: self.dss.find(id) as i64,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.end.saturating_sub(self.next);
        (remaining, Some(remaining))
    }
}

impl<S: LongStore, M: IdMapping> ExactSizeIterator for DisjointSetResults<'_, S, M> {}

impl<S: LongStore, M: IdMapping> FusedIterator for DisjointSetResults<'_, S, M> {}
