//! Low-level byte read utilities for whole-byte primitives.
//!
//! Callers hand in a slice that is exactly as wide as the primitive being read.

use crate::descriptor::ByteOrder;

/// Reads `bytes` (at most 8) as an unsigned integer in the given byte order.
pub fn read_uint(bytes: &[u8], order: ByteOrder) -> u64 {
    debug_assert!(bytes.len() <= 8);

    match order {
        ByteOrder::Little => bytes
            .iter()
            .rev()
            .fold(0u64, |acc, &b| (acc << 8) | b as u64),
        ByteOrder::Big => bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64),
    }
}

/// Sign-extends the low `bits` of `value` to a full `i64`.
pub fn sign_extend(value: u64, bits: usize) -> i64 {
    if bits == 0 || bits >= 64 {
        return value as i64;
    }

    let shift = 64 - bits;
    ((value << shift) as i64) >> shift
}

/// Rounds `offset` up to the next multiple of `align` (`align` must be non-zero).
pub fn align_up(offset: usize, align: usize) -> usize {
    let rem = offset % align;
    if rem == 0 { offset } else { offset + (align - rem) }
}

/// [align_up] that returns `None` instead of overflowing.
pub fn checked_align_up(offset: usize, align: usize) -> Option<usize> {
    offset.checked_next_multiple_of(align)
}
