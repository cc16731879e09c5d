//! Power-of-two helpers used by page sizing and layout alignment

/// Whether `value` is a positive power of two
#[inline]
pub const fn is_power_of_two(value: u64) -> bool {
    value != 0 && value & (value - 1) == 0
}

/// Smallest power of two greater than or equal to `value`
///
/// Returns 0 for 0 and wraps to 0 when the result does not fit.
#[inline]
pub const fn next_highest_power_of_two(value: u64) -> u64 {
    let mut v = value.wrapping_sub(1);
    v |= v >> 1;
    v |= v >> 2;
    v |= v >> 4;
    v |= v >> 8;
    v |= v >> 16;
    v |= v >> 32;
    v.wrapping_add(1)
}

/// Largest power of two less than or equal to `value`, or 0 for 0
#[inline]
pub const fn previous_power_of_two(value: u64) -> u64 {
    if value == 0 {
        0
    } else {
        1 << (63 - value.leading_zeros())
    }
}

/// Round `value` up to the next multiple of `alignment` (a power of two)
///
/// Saturates to the largest aligned value instead of wrapping.
#[inline]
pub const fn align(value: u64, alignment: u64) -> u64 {
    let mask = alignment - 1;
    value.saturating_add(mask) & !mask
}

/// Integer division rounding up
#[inline]
pub const fn ceil_div(dividend: u64, divisor: u64) -> u64 {
    dividend / divisor + (dividend % divisor != 0) as u64
}
