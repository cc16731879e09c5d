//! Atomic element slots
//!
//! Pages of the growable family are boxed slices of atomic slots so that every
//! structure can be written through a shared reference while another thread
//! grows it. [`AtomicSlot`] abstracts over the element width; the ordering is
//! chosen by the structure using the slot.

use std::fmt;
use std::sync::atomic::{AtomicI32, AtomicI64, AtomicU64, AtomicU8, Ordering};

/// An atomic cell holding one element of a paged structure
pub trait AtomicSlot: Send + Sync + Sized + 'static {
    /// Element value type
    type Value: Copy + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Bytes per element, a power of two
    const BYTES: usize;

    /// Value of a freshly allocated slot
    const ZERO: Self::Value;

    /// Create a slot holding `value`
    fn new(value: Self::Value) -> Self;

    /// Load the value
    fn load(&self, order: Ordering) -> Self::Value;

    /// Store a value
    fn store(&self, value: Self::Value, order: Ordering);

    /// Store a value, returning the previous one
    fn swap(&self, value: Self::Value, order: Ordering) -> Self::Value;

    /// Add `delta`, returning the previous value (integers wrap)
    fn fetch_add(&self, delta: Self::Value, order: Ordering) -> Self::Value;

    /// Store `new` if the slot holds `current`
    fn compare_exchange(
        &self,
        current: Self::Value,
        new: Self::Value,
        success: Ordering,
        failure: Ordering,
    ) -> Result<Self::Value, Self::Value>;

    /// `a + b` with the same semantics as `fetch_add`
    fn add(a: Self::Value, b: Self::Value) -> Self::Value;
}

/// Integer slots additionally support bitwise combination
pub trait IntegerSlot: AtomicSlot {
    /// Bitwise or, returning the previous value
    fn fetch_or(&self, value: Self::Value, order: Ordering) -> Self::Value;

    /// Bitwise and, returning the previous value
    fn fetch_and(&self, value: Self::Value, order: Ordering) -> Self::Value;

    /// `a | b`
    fn or(a: Self::Value, b: Self::Value) -> Self::Value;

    /// `a & b`
    fn and(a: Self::Value, b: Self::Value) -> Self::Value;
}

macro_rules! integer_slot {
    ($atomic:ty, $value:ty) => {
        impl AtomicSlot for $atomic {
            type Value = $value;
            const BYTES: usize = std::mem::size_of::<$value>();
            const ZERO: $value = 0;

            #[inline(always)]
            fn new(value: $value) -> Self {
                <$atomic>::new(value)
            }

            #[inline(always)]
            fn load(&self, order: Ordering) -> $value {
                <$atomic>::load(self, order)
            }

            #[inline(always)]
            fn store(&self, value: $value, order: Ordering) {
                <$atomic>::store(self, value, order)
            }

            #[inline(always)]
            fn swap(&self, value: $value, order: Ordering) -> $value {
                <$atomic>::swap(self, value, order)
            }

            #[inline(always)]
            fn fetch_add(&self, delta: $value, order: Ordering) -> $value {
                <$atomic>::fetch_add(self, delta, order)
            }

            #[inline(always)]
            fn compare_exchange(
                &self,
                current: $value,
                new: $value,
                success: Ordering,
                failure: Ordering,
            ) -> Result<$value, $value> {
                <$atomic>::compare_exchange(self, current, new, success, failure)
            }

            #[inline(always)]
            fn add(a: $value, b: $value) -> $value {
                a.wrapping_add(b)
            }
        }

        impl IntegerSlot for $atomic {
            #[inline(always)]
            fn fetch_or(&self, value: $value, order: Ordering) -> $value {
                <$atomic>::fetch_or(self, value, order)
            }

            #[inline(always)]
            fn fetch_and(&self, value: $value, order: Ordering) -> $value {
                <$atomic>::fetch_and(self, value, order)
            }

            #[inline(always)]
            fn or(a: $value, b: $value) -> $value {
                a | b
            }

            #[inline(always)]
            fn and(a: $value, b: $value) -> $value {
                a & b
            }
        }
    };
}

integer_slot!(AtomicU8, u8);
integer_slot!(AtomicI32, i32);
integer_slot!(AtomicI64, i64);
integer_slot!(AtomicU64, u64);

/// A 64-bit float stored as its bit pattern in an `AtomicU64`
///
/// Compare-and-set compares bit patterns, so `-0.0` and `0.0` differ and a
/// stored NaN matches itself.
#[derive(Default)]
#[repr(transparent)]
pub struct AtomicF64(AtomicU64);

impl AtomicF64 {
    /// Create a slot holding `value`
    pub fn new(value: f64) -> Self {
        Self(AtomicU64::new(value.to_bits()))
    }
}

impl fmt::Debug for AtomicF64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&f64::from_bits(self.0.load(Ordering::Relaxed)), f)
    }
}

impl AtomicSlot for AtomicF64 {
    type Value = f64;
    const BYTES: usize = 8;
    const ZERO: f64 = 0.0;

    #[inline(always)]
    fn new(value: f64) -> Self {
        AtomicF64::new(value)
    }

    #[inline(always)]
    fn load(&self, order: Ordering) -> f64 {
        f64::from_bits(self.0.load(order))
    }

    #[inline(always)]
    fn store(&self, value: f64, order: Ordering) {
        self.0.store(value.to_bits(), order)
    }

    #[inline(always)]
    fn swap(&self, value: f64, order: Ordering) -> f64 {
        f64::from_bits(self.0.swap(value.to_bits(), order))
    }

    #[inline]
    fn fetch_add(&self, delta: f64, order: Ordering) -> f64 {
        let load_order = match order {
            Ordering::Release | Ordering::Relaxed => Ordering::Relaxed,
            _ => Ordering::Acquire,
        };
        let mut current = self.0.load(load_order);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self.0.compare_exchange_weak(current, next, order, load_order) {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    #[inline(always)]
    fn compare_exchange(
        &self,
        current: f64,
        new: f64,
        success: Ordering,
        failure: Ordering,
    ) -> Result<f64, f64> {
        self.0
            .compare_exchange(current.to_bits(), new.to_bits(), success, failure)
            .map(f64::from_bits)
            .map_err(f64::from_bits)
    }

    #[inline(always)]
    fn add(a: f64, b: f64) -> f64 {
        a + b
    }
}

/// Allocate a page of `page_size` zeroed slots
pub fn new_page<A: AtomicSlot>(page_size: usize) -> Box<[A]> {
    (0..page_size).map(|_| A::new(A::ZERO)).collect()
}

/// Allocate a page of `page_size` slots holding `value`
pub fn new_page_filled<A: AtomicSlot>(page_size: usize, value: A::Value) -> Box<[A]> {
    (0..page_size).map(|_| A::new(value)).collect()
}
