//! Unsigned varint and delta-run encoding
//!
//! A varint stores 7 payload bits per byte, least significant group first.
//! The high bit of a byte is set when another byte follows. A `u64` takes at
//! most [`MAX_VLONG_BYTES`] bytes.
//!
//! A delta run is a 4-byte big-endian element count followed by one varint
//! per element holding the difference to the previous element, the first one
//! taken against 0.

use crate::types::error::{MemoryError, Result};

/// Longest encoding of a `u64`
pub const MAX_VLONG_BYTES: usize = 10;

/// Bytes of the element count prefix of a delta run
pub const RUN_HEADER_BYTES: usize = 4;

/// Number of bytes `value` takes as a varint
#[inline]
pub const fn encoded_vlong_size(value: u64) -> usize {
    let bits = 64 - (value | 1).leading_zeros() as usize;
    (bits + 6) / 7
}

/// Encode `value` into `buf`, returning the number of bytes written
///
/// Panics if `buf` is shorter than `encoded_vlong_size(value)`.
#[inline]
pub fn encode_vlong(mut value: u64, buf: &mut [u8]) -> usize {
    let mut written = 0;
    while value & !0x7F != 0 {
        buf[written] = (value & 0x7F) as u8 | 0x80;
        value >>= 7;
        written += 1;
    }
    buf[written] = value as u8;
    written + 1
}

/// Decode a varint from the front of `bytes`, returning the value and bytes read
///
/// Returns `None` if `bytes` ends inside the varint or the varint is longer
/// than [`MAX_VLONG_BYTES`].
#[inline]
pub fn decode_vlong(bytes: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut shift = 0u32;
    for (i, &byte) in bytes.iter().take(MAX_VLONG_BYTES).enumerate() {
        value |= u64::from(byte & 0x7F) << shift;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        shift += 7;
    }
    None
}

/// Map signed to unsigned so that small magnitudes encode short
#[inline]
pub const fn zig_zag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zig_zag`]
#[inline]
pub const fn un_zig_zag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Differences between successive values, the first taken against 0
///
/// Ascending input yields small deltas. Other input still round-trips
/// through wrapping arithmetic but encodes long.
pub fn deltas(values: &[u64]) -> impl Iterator<Item = u64> + '_ {
    let mut previous = 0u64;
    values.iter().map(move |&value| {
        let delta = value.wrapping_sub(previous);
        previous = value;
        delta
    })
}

/// Bytes a delta run of `values` takes, including the count prefix
pub fn delta_run_size(values: &[u64]) -> usize {
    RUN_HEADER_BYTES + deltas(values).map(encoded_vlong_size).sum::<usize>()
}

/// Encode `values` as a standalone delta run
pub fn encode_delta_run(values: &[u64]) -> Result<Vec<u8>> {
    let count = run_count(values.len())?;
    let mut out = Vec::with_capacity(delta_run_size(values));
    out.extend_from_slice(&count.to_be_bytes());
    let mut buf = [0u8; MAX_VLONG_BYTES];
    for delta in deltas(values) {
        let n = encode_vlong(delta, &mut buf);
        out.extend_from_slice(&buf[..n]);
    }
    Ok(out)
}

/// Element count prefix for a run of `len` values
pub(crate) fn run_count(len: usize) -> Result<u32> {
    u32::try_from(len).map_err(|_| MemoryError::IndexOverflow { length: len as u64, max: u64::from(u32::MAX) })
}

/// Decode a standalone delta run produced by [`encode_delta_run`]
///
/// Returns `None` if `bytes` is truncated.
pub fn decode_delta_run(bytes: &[u8]) -> Option<Vec<u64>> {
    let header: [u8; RUN_HEADER_BYTES] = bytes.get(..RUN_HEADER_BYTES)?.try_into().ok()?;
    let count = u32::from_be_bytes(header) as usize;
    let mut values = Vec::with_capacity(count.min(bytes.len()));
    let mut position = RUN_HEADER_BYTES;
    let mut current = 0u64;
    for _ in 0..count {
        let (delta, read) = decode_vlong(&bytes[position..])?;
        position += read;
        current = current.wrapping_add(delta);
        values.push(current);
    }
    Some(values)
}
