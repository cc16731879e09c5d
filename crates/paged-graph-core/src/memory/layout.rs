//! Memory layout configuration and size estimators
//!
//! A [`MemoryLayout`] describes how an allocation is laid out: a fixed header,
//! an alignment quantum every allocation is padded to, and the width of a
//! reference to another allocation. Estimators are pure functions of a layout,
//! so capacity planning can run before anything is allocated.
//!
//! The process-wide layout is resolved once, either explicitly through
//! [`MemoryLayout::install`] at start-up or implicitly as
//! [`MemoryLayout::native`] on first read, and never changes afterwards.

use std::mem;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::log_info;
use crate::memory::bit_util;
use crate::types::error::{MemoryError, Result};

static GLOBAL_LAYOUT: OnceCell<MemoryLayout> = OnceCell::new();

/// Allocation layout rules used by every size estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLayout {
    /// Fixed bytes charged to every array allocation
    pub header_bytes: u64,
    /// Quantum every allocation size is rounded up to
    pub alignment: u64,
    /// Width of a reference to another allocation
    pub reference_bytes: u64,
}

impl Default for MemoryLayout {
    fn default() -> Self {
        Self::native()
    }
}

impl MemoryLayout {
    /// Layout of this process: boxed-slice handle as header, pointer-width references
    pub const fn native() -> Self {
        Self {
            header_bytes: mem::size_of::<Box<[u8]>>() as u64,
            alignment: 8,
            reference_bytes: mem::size_of::<usize>() as u64,
        }
    }

    /// 64-bit managed-runtime layout with 4-byte compressed references
    pub const fn compressed_references() -> Self {
        Self { header_bytes: 16, alignment: 8, reference_bytes: 4 }
    }

    /// 64-bit managed-runtime layout with full 8-byte references
    pub const fn full_references() -> Self {
        Self { header_bytes: 24, alignment: 8, reference_bytes: 8 }
    }

    /// Check that the layout can be used by the estimators
    pub fn validate(&self) -> Result<()> {
        if !bit_util::is_power_of_two(self.alignment) {
            return Err(MemoryError::layout(format!(
                "alignment must be a power of two, got {}",
                self.alignment
            )));
        }
        if self.reference_bytes != 4 && self.reference_bytes != 8 {
            return Err(MemoryError::layout(format!(
                "reference width must be 4 or 8 bytes, got {}",
                self.reference_bytes
            )));
        }
        if self.header_bytes > 1024 {
            return Err(MemoryError::layout(format!(
                "header of {} bytes is not plausible",
                self.header_bytes
            )));
        }
        Ok(())
    }

    /// The process-wide layout, resolving the native layout on first use
    pub fn global() -> &'static MemoryLayout {
        GLOBAL_LAYOUT.get_or_init(MemoryLayout::native)
    }

    /// Resolve the process-wide layout
    ///
    /// Installing the layout that is already in effect is a no-op. Installing a
    /// different one after the layout was resolved fails.
    pub fn install(layout: MemoryLayout) -> Result<&'static MemoryLayout> {
        layout.validate()?;
        let mut installed_now = false;
        let current = GLOBAL_LAYOUT.get_or_init(|| {
            installed_now = true;
            layout
        });
        if *current != layout {
            return Err(MemoryError::layout(format!(
                "layout already resolved as {:?}",
                current
            )));
        }
        if installed_now {
            log_info!(
                header_bytes = layout.header_bytes,
                alignment = layout.alignment,
                reference_bytes = layout.reference_bytes,
                "Memory layout installed"
            );
        }
        Ok(current)
    }

    /// Round `bytes` up to the alignment quantum
    #[inline]
    pub const fn align(&self, bytes: u64) -> u64 {
        bit_util::align(bytes, self.alignment)
    }

    /// Bytes of an array of `length` elements of `bytes_per_element` each
    #[inline]
    pub const fn size_of_array(&self, length: u64, bytes_per_element: u64) -> u64 {
        self.align(
            self.header_bytes
                .saturating_add(length.saturating_mul(bytes_per_element)),
        )
    }

    /// Bytes of a byte array
    #[inline]
    pub const fn size_of_byte_array(&self, length: u64) -> u64 {
        self.size_of_array(length, 1)
    }

    /// Bytes of a 32-bit integer array
    #[inline]
    pub const fn size_of_int_array(&self, length: u64) -> u64 {
        self.size_of_array(length, 4)
    }

    /// Bytes of a 64-bit integer array
    #[inline]
    pub const fn size_of_long_array(&self, length: u64) -> u64 {
        self.size_of_array(length, 8)
    }

    /// Bytes of a 64-bit float array
    #[inline]
    pub const fn size_of_double_array(&self, length: u64) -> u64 {
        self.size_of_array(length, 8)
    }

    /// Bytes of an array of references (the referenced objects are not included)
    #[inline]
    pub const fn size_of_object_array(&self, length: u64) -> u64 {
        self.size_of_array(length, self.reference_bytes)
    }

    /// Bytes of the reference slots alone, without header or padding
    #[inline]
    pub const fn size_of_object_array_elements(&self, length: u64) -> u64 {
        length.saturating_mul(self.reference_bytes)
    }

    /// Aligned inline size of a value of type `T`, excluding anything it points to
    #[inline]
    pub const fn size_of_instance<T>(&self) -> u64 {
        self.align(mem::size_of::<T>() as u64)
    }
}

/// Bytes of a byte array under the process-wide layout
pub fn size_of_byte_array(length: u64) -> u64 {
    MemoryLayout::global().size_of_byte_array(length)
}

/// Bytes of a 32-bit integer array under the process-wide layout
pub fn size_of_int_array(length: u64) -> u64 {
    MemoryLayout::global().size_of_int_array(length)
}

/// Bytes of a 64-bit integer array under the process-wide layout
pub fn size_of_long_array(length: u64) -> u64 {
    MemoryLayout::global().size_of_long_array(length)
}

/// Bytes of a 64-bit float array under the process-wide layout
pub fn size_of_double_array(length: u64) -> u64 {
    MemoryLayout::global().size_of_double_array(length)
}

/// Bytes of a reference array under the process-wide layout
pub fn size_of_object_array(length: u64) -> u64 {
    MemoryLayout::global().size_of_object_array(length)
}

/// Aligned inline size of `T` under the process-wide layout
pub fn size_of_instance<T>() -> u64 {
    MemoryLayout::global().size_of_instance::<T>()
}

const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

/// Format a byte count for log messages, e.g. `1.5 MiB`
pub fn human_readable(bytes: u64) -> String {
    let mut unit = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
