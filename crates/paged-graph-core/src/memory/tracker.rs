//! Allocation tracker
//!
//! A tracker is a ledger of bytes allocated on behalf of one operation. It is
//! handed to every constructor explicitly; there is no global tracker. Cloning
//! a tracker yields a handle onto the same ledger so that structures created by
//! worker threads all account into it.
//!
//! The ledger is monotonic in practice: structures credit it when they allocate
//! and do not debit it when they are released.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Byte ledger shared by the structures of one operation
#[derive(Clone, Default)]
pub struct AllocationTracker {
    /// `None` for the no-op tracker
    count: Option<Arc<AtomicI64>>,
}

impl AllocationTracker {
    /// A live tracker starting at zero
    pub fn new() -> Self {
        Self { count: Some(Arc::new(AtomicI64::new(0))) }
    }

    /// The no-op tracker: `tracked()` is always 0 and mutators do nothing
    pub const fn empty() -> Self {
        Self { count: None }
    }

    /// Whether `tracker` records anything, so callers can skip estimation work
    #[inline]
    pub fn is_tracking(tracker: &AllocationTracker) -> bool {
        tracker.count.is_some()
    }

    /// Credit `delta` bytes
    #[inline]
    pub fn add(&self, delta: u64) {
        if let Some(count) = &self.count {
            count.fetch_add(delta as i64, Ordering::Relaxed);
        }
    }

    /// Debit `delta` bytes
    #[inline]
    pub fn remove(&self, delta: u64) {
        if let Some(count) = &self.count {
            count.fetch_sub(delta as i64, Ordering::Relaxed);
        }
    }

    /// Bytes currently on the ledger
    #[inline]
    pub fn tracked(&self) -> i64 {
        self.count
            .as_ref()
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Whether two handles point at the same ledger
    pub fn same_ledger(&self, other: &AllocationTracker) -> bool {
        match (&self.count, &other.count) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for AllocationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.count {
            Some(_) => f
                .debug_struct("AllocationTracker")
                .field("tracked", &self.tracked())
                .finish(),
            None => f.write_str("AllocationTracker::EMPTY"),
        }
    }
}

impl fmt::Display for AllocationTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.count {
            Some(_) => write!(f, "Total: {}", super::layout::human_readable(self.tracked().max(0) as u64)),
            None => f.write_str("<untracked>"),
        }
    }
}
