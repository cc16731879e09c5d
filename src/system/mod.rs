//! Runtime monitoring

pub mod metrics;

pub use metrics::MemoryMetrics;
