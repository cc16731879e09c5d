//! Mapping between dense internal ids and original ids

use std::fmt;

use crate::constants::NO_VALUE;
use crate::memory::AllocationTracker;
use crate::paged::{LongArray, PagedLongLongMap};
use crate::types::error::Result;

/// Read-only view from dense node ids to the ids they were loaded from
pub trait IdMapping {
    /// First dense id
    const START_NODE_ID: usize = 0;

    /// Number of mapped ids; dense ids are `START_NODE_ID..node_count()`
    fn node_count(&self) -> usize;

    /// Original id of dense id `node_id`
    fn to_original_node_id(&self, node_id: usize) -> i64;
}

/// Identity mapping over `0..node_count`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectIdMapping {
    node_count: usize,
}

impl DirectIdMapping {
    /// Identity mapping of `node_count` ids
    pub const fn new(node_count: usize) -> Self {
        Self { node_count }
    }
}

impl IdMapping for DirectIdMapping {
    fn node_count(&self) -> usize {
        self.node_count
    }

    fn to_original_node_id(&self, node_id: usize) -> i64 {
        node_id as i64
    }
}

/// Assigns dense ids to original ids in first-seen order
///
/// Original ids must be below the capacity given at construction. The
/// reverse direction is available after [`build_mapped_ids`](Self::build_mapped_ids).
pub struct HugeIdMap {
    next_graph_id: usize,
    node_to_graph_ids: PagedLongLongMap,
    graph_ids: Option<LongArray>,
    tracker: AllocationTracker,
}

impl HugeIdMap {
    /// Empty map accepting original ids in `[0, capacity)`
    pub fn new(capacity: usize, tracker: &AllocationTracker) -> Result<Self> {
        Ok(Self {
            next_graph_id: 0,
            node_to_graph_ids: PagedLongLongMap::new_map(capacity, tracker)?,
            graph_ids: None,
            tracker: tracker.clone(),
        })
    }

    /// Dense id of `original_id`, assigning the next one if it is new
    pub fn map_or_get(&mut self, original_id: usize) -> usize {
        let existing = self.node_to_graph_ids.get_or_default(original_id, NO_VALUE);
        if existing != NO_VALUE {
            return existing as usize;
        }
        self.add(original_id)
    }

    /// Assign the next dense id to `original_id`, returning it
    ///
    /// Once the dense-to-original direction is built it is extended as well.
    pub fn add(&mut self, original_id: usize) -> usize {
        let graph_id = self.next_graph_id;
        self.next_graph_id += 1;
        self.node_to_graph_ids.put(original_id, graph_id as i64);
        let reverse_in_step = match &self.graph_ids {
            Some(graph_ids) => graph_ids
                .grow(self.next_graph_id)
                .map(|()| graph_ids.set(graph_id, original_id as i64))
                .is_ok(),
            None => true,
        };
        if !reverse_in_step {
            // Lookups report NO_VALUE until the next build.
            self.graph_ids = None;
        }
        graph_id
    }

    /// Dense id of `original_id`, or [`NO_VALUE`]
    pub fn get(&self, original_id: usize) -> i64 {
        self.node_to_graph_ids.get_or_default(original_id, NO_VALUE)
    }

    /// Whether `original_id` has a dense id
    pub fn contains(&self, original_id: usize) -> bool {
        self.node_to_graph_ids.contains_key(original_id)
    }

    /// Build the dense-to-original direction from the current entries
    pub fn build_mapped_ids(&mut self) -> Result<()> {
        let graph_ids = LongArray::new_array(self.next_graph_id, &self.tracker)?;
        for (original_id, graph_id) in &self.node_to_graph_ids {
            graph_ids.set(graph_id as usize, original_id as i64);
        }
        self.graph_ids = Some(graph_ids);
        Ok(())
    }

    /// Drop both directions, returning the estimated bytes freed
    pub fn release(&mut self) -> u64 {
        let reverse = self.graph_ids.take().map_or(0, |ids| ids.release());
        self.node_to_graph_ids.release() + reverse
    }
}

impl IdMapping for HugeIdMap {
    fn node_count(&self) -> usize {
        self.next_graph_id
    }

    /// [`NO_VALUE`] until [`HugeIdMap::build_mapped_ids`] ran
    fn to_original_node_id(&self, node_id: usize) -> i64 {
        self.graph_ids.as_ref().map_or(NO_VALUE, |ids| ids.get(node_id))
    }
}

impl fmt::Debug for HugeIdMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HugeIdMap")
            .field("node_count", &self.next_graph_id)
            .field("capacity", &self.node_to_graph_ids.capacity())
            .field("mapped_ids_built", &self.graph_ids.is_some())
            .finish()
    }
}
