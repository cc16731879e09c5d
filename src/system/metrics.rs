//! Prometheus metrics over allocation trackers
//!
//! Gauges mirror what the trackers already count. Nothing here sits on a hot
//! path: callers publish a tracker after building or releasing a structure.

use once_cell::sync::OnceCell;
use paged_graph_core::AllocationTracker;
use prometheus::{IntCounter, IntGauge, Opts, Registry, TextEncoder};

use crate::core::Result;

static GLOBAL: OnceCell<MemoryMetrics> = OnceCell::new();

/// Memory accounting metrics backed by their own registry
pub struct MemoryMetrics {
    registry: Registry,
    /// Bytes currently reported by the observed tracker
    pub tracked_bytes: IntGauge,
    /// Bytes handed back through `release`
    pub released_bytes: IntCounter,
    /// Structures built and not yet released
    pub structures_live: IntGauge,
}

impl MemoryMetrics {
    /// Create and register the metrics under `prefix`
    pub fn new(prefix: &str) -> Result<Self> {
        let registry = Registry::new();

        let tracked_bytes = IntGauge::with_opts(Opts::new(
            format!("{}_tracked_bytes", prefix),
            "Bytes currently accounted by the allocation tracker",
        ))?;
        let released_bytes = IntCounter::with_opts(Opts::new(
            format!("{}_released_bytes_total", prefix),
            "Bytes returned by released structures",
        ))?;
        let structures_live = IntGauge::with_opts(Opts::new(
            format!("{}_structures_live", prefix),
            "Paged structures built and not yet released",
        ))?;

        registry.register(Box::new(tracked_bytes.clone()))?;
        registry.register(Box::new(released_bytes.clone()))?;
        registry.register(Box::new(structures_live.clone()))?;

        Ok(Self { registry, tracked_bytes, released_bytes, structures_live })
    }

    /// Process-wide metrics, created with `prefix` on first use
    ///
    /// Later calls return the existing instance whatever prefix they pass.
    pub fn global(prefix: &str) -> Result<&'static MemoryMetrics> {
        GLOBAL.get_or_try_init(|| MemoryMetrics::new(prefix))
    }

    /// Publish the current value of a tracker
    pub fn observe_tracker(&self, tracker: &AllocationTracker) {
        self.tracked_bytes.set(tracker.tracked());
    }

    /// Count a newly built structure
    pub fn record_allocation(&self) {
        self.structures_live.inc();
    }

    /// Count a released structure and the bytes it returned
    pub fn record_release(&self, bytes: u64) {
        self.structures_live.dec();
        self.released_bytes.inc_by(bytes);
    }

    /// Collect all metrics in Prometheus text format
    pub fn collect_metrics(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

impl std::fmt::Debug for MemoryMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryMetrics")
            .field("tracked_bytes", &self.tracked_bytes.get())
            .field("released_bytes", &self.released_bytes.get())
            .field("structures_live", &self.structures_live.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use paged_graph_core::HugeLongArray;

    use super::*;

    #[test]
    fn tracker_and_release_show_up_in_text_output() {
        let metrics = MemoryMetrics::new("unit").unwrap();
        let tracker = AllocationTracker::new();

        let mut array = HugeLongArray::new_array(1000, &tracker).unwrap();
        metrics.record_allocation();
        metrics.observe_tracker(&tracker);
        assert_eq!(metrics.tracked_bytes.get(), tracker.tracked());
        assert!(metrics.tracked_bytes.get() >= 8000);

        let freed = array.release();
        metrics.record_release(freed);
        assert_eq!(metrics.structures_live.get(), 0);

        let text = metrics.collect_metrics().unwrap();
        assert!(text.contains("unit_tracked_bytes"));
        assert!(text.contains(&format!("unit_released_bytes_total {}", freed)));
    }

    #[test]
    fn invalid_prefix_is_rejected() {
        assert!(MemoryMetrics::new("bad prefix").is_err());
    }

    #[test]
    fn global_is_created_once() {
        let first = MemoryMetrics::global("global_test").unwrap();
        let second = MemoryMetrics::global("ignored").unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
