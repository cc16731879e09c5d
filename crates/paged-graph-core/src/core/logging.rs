//! Logging utilities
//!
//! Thin macros over the tracing crate so call sites read the same across the
//! workspace. Hot paths (element access, cursor advance, varint decode) never log.

/// Info level logging - general information messages
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {{
        tracing::info!($($arg)*);
    }};
}

/// Warning level logging - potentially problematic situations
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {{
        tracing::warn!($($arg)*);
    }};
}

/// Error level logging - error conditions
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {{
        tracing::error!($($arg)*);
    }};
}

/// Debug level logging - growth, release and merge events
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {{
        tracing::debug!($($arg)*);
    }};
}

/// Trace level logging - representation choices and other per-structure detail
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => {{
        tracing::trace!($($arg)*);
    }};
}
