//! Paged Graph - paged memory structures for graph analytics
//!
//! The structures live in [`paged_graph_core`]. This crate wires them to a
//! process: configuration loading, the memory layout, logging and
//! Prometheus metrics over allocation trackers.
#![warn(missing_docs)]

pub mod core;
pub mod system;

pub use crate::core::{Config, Error, Result};
pub use paged_graph_core;
pub use paged_graph_core::{
    AllocationTracker, ByteArray, DeltaCursor, HugeArray, HugeArrayBuilder, HugeCursor, HugeDisjointSetStruct,
    HugeDoubleArray, HugeIntArray, HugeLongArray, HugeObjectArray, IdMapping, LocalAllocator, MemoryError,
    MemoryLayout, PagedDisjointSetStruct,
};

use paged_graph_core::log_info;
use tracing_subscriber::EnvFilter;

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging, the memory layout and metrics from `config`
///
/// `RUST_LOG` takes precedence over the configured level. Calling this again
/// keeps the first subscriber and fails only if the layout differs.
pub fn init(config: &Config) -> Result<()> {
    config.validate()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    // An already installed subscriber is kept.
    let _ = if config.logging.format == "json" {
        builder.json().try_init()
    } else {
        builder.pretty().try_init()
    };

    let layout = config.install_layout()?;
    if config.metrics.enable_prometheus {
        system::MemoryMetrics::global(&config.metrics.prefix)?;
    }

    log_info!(
        name = NAME,
        version = VERSION,
        reference_bytes = layout.reference_bytes,
        "Initialized"
    );
    Ok(())
}
