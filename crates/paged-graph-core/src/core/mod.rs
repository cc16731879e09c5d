//! Cross-cutting utilities shared by every structure

/// Logging macros over `tracing`
pub mod logging;
