/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Bit arithmetic shared by readers, writers and records.
//!
//! Many records store a group of values in bit fields of a common width,
//! which is written once before the group. The functions in this module
//! compute the minimum widths: for example, a rectangle with coordinates
//! `xmin`, `xmax`, `ymin` and `ymax` is stored using
//! [`max_size`]`(&[xmin, xmax, ymin, ymax])` bits per coordinate.

/// Number of bits in a byte.
pub const BITS_PER_BYTE: usize = 8;

/// Maximum width of a bit field.
pub const MAX_FIELD_BITS: usize = 32;

/// Return a mask with the lowest `n` bits set. `n` must be at most 32.
#[must_use]
#[inline(always)]
pub const fn low_mask(n: usize) -> u32 {
    debug_assert!(n <= MAX_FIELD_BITS);
    if n == 0 { 0 } else { u32::MAX >> (32 - n) }
}

/// Return the minimum number of bits needed to store `value` as an
/// unsigned bit field. Zero needs zero bits.
#[must_use]
#[inline(always)]
pub const fn unsigned_size(value: u32) -> usize {
    (u32::BITS - value.leading_zeros()) as usize
}

/// Return the minimum number of bits needed to store `value` as a signed
/// (two's complement) bit field, sign bit included.
///
/// Note that zero and minus one need one bit.
#[must_use]
#[inline(always)]
pub const fn size(value: i32) -> usize {
    let magnitude = if value < 0 { !value } else { value };
    unsigned_size(magnitude as u32) + 1
}

/// Return the maximum [`size`] of `values`, that is, the width of a group
/// of signed bit fields able to store all of them. An empty group needs zero
/// bits.
#[must_use]
pub fn max_size(values: &[i32]) -> usize {
    values.iter().map(|&value| size(value)).max().unwrap_or(0)
}

/// Return the maximum [`unsigned_size`] of `values`.
#[must_use]
pub fn max_unsigned_size(values: &[u32]) -> usize {
    values
        .iter()
        .map(|&value| unsigned_size(value))
        .max()
        .unwrap_or(0)
}

/// Return the number of bytes needed to store `bits` bits.
#[must_use]
#[inline(always)]
pub const fn bytes_for_bits(bits: u64) -> u64 {
    bits.div_ceil(BITS_PER_BYTE as u64)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_unsigned_size() {
        assert_eq!(unsigned_size(0), 0);
        assert_eq!(unsigned_size(1), 1);
        assert_eq!(unsigned_size(2), 2);
        assert_eq!(unsigned_size(255), 8);
        assert_eq!(unsigned_size(256), 9);
        assert_eq!(unsigned_size(u32::MAX), 32);
        for n in 1..32 {
            assert_eq!(unsigned_size(1 << n), n + 1);
            assert_eq!(unsigned_size((1 << n) - 1), n);
        }
    }

    #[test]
    fn test_size() {
        assert_eq!(size(0), 1);
        assert_eq!(size(-1), 1);
        assert_eq!(size(1), 2);
        assert_eq!(size(127), 8);
        assert_eq!(size(128), 9);
        assert_eq!(size(-128), 8);
        assert_eq!(size(-129), 9);
        assert_eq!(size(i32::MAX), 32);
        assert_eq!(size(i32::MIN), 32);
    }

    #[test]
    fn test_max_size() {
        assert_eq!(max_size(&[3, -5, 127]), size(127));
        assert_eq!(max_size(&[-200, 3]), 9);
        assert_eq!(max_size(&[]), 0);
        assert_eq!(max_unsigned_size(&[1, 255, 3]), 8);
        assert_eq!(max_unsigned_size(&[]), 0);
    }

    #[test]
    fn test_masks() {
        assert_eq!(low_mask(0), 0);
        assert_eq!(low_mask(1), 1);
        assert_eq!(low_mask(7), 0x7F);
        assert_eq!(low_mask(32), u32::MAX);
        assert_eq!(bytes_for_bits(0), 0);
        assert_eq!(bytes_for_bits(1), 1);
        assert_eq!(bytes_for_bits(8), 1);
        assert_eq!(bytes_for_bits(37), 5);
    }

    #[test]
    fn test_sizes_fit() {
        for value in -70_000..70_000 {
            let n = size(value);
            let shift = 32 - n as u32;
            // the value survives a truncation to n bits and a sign extension
            assert_eq!(((value as u32) << shift) as i32 >> shift, value);
            if n > 1 {
                let shift = shift + 1;
                assert_ne!(((value as u32) << shift) as i32 >> shift, value);
            }
        }
    }
}
