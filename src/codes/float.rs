/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Floating-point and fixed-point numbers.
//!
//! Half-precision numbers are IEEE 754 binary16 values stored as a 16-bit
//! integer in the byte order of the stream; [`half_to_f32`] and
//! [`f32_to_half`] convert bit patterns exactly, rounding to nearest-even
//! when narrowing and saturating to infinity on overflow.
//!
//! Fixed-point numbers are signed integers with 8 (for 8.8 numbers) or 16
//! (for 16.16 numbers) fractional bits.
//!
//! # NaNs
//!
//! Narrowing a NaN keeps the 10 most significant bits of its mantissa. If
//! they are all zero, the lowest mantissa bit is set, so that the result is
//! still a NaN and not an infinity. No quiet bit is added: some decoders in
//! the wild recognize NaNs only by this exact pattern.

use crate::codes::{IntRead, IntWrite};
use crate::error::CodecError;
use crate::traits::*;

const HALF_SIGN: u16 = 0x8000;
const HALF_EXP: u16 = 0x7C00;
const HALF_MAN: u16 = 0x03FF;

const F32_SIGN: u32 = 0x8000_0000;
const F32_EXP: u32 = 0x7F80_0000;
const F32_MAN: u32 = 0x007F_FFFF;

/// Difference between the exponent biases of single (127) and half (15)
/// precision.
const BIAS_DIFF: u32 = 127 - 15;

/// Convert the bit pattern of a half-precision number to a single-precision
/// number.
///
/// The conversion is exact.
#[must_use]
pub fn half_to_f32(half: u16) -> f32 {
    let sign = ((half & HALF_SIGN) as u32) << 16;
    let exp = ((half & HALF_EXP) >> 10) as u32;
    let man = (half & HALF_MAN) as u32;

    let bits = match exp {
        0 if man == 0 => sign,
        0 => {
            // subnormal: normalize the mantissa, moving the exponent down
            let mut man = man;
            let mut shift = 0;
            while man & 0x400 == 0 {
                man <<= 1;
                shift += 1;
            }
            sign | ((BIAS_DIFF + 1 - shift) << 23) | ((man & HALF_MAN as u32) << 13)
        }
        0x1F => sign | F32_EXP | (man << 13),
        _ => sign | ((exp + BIAS_DIFF) << 23) | (man << 13),
    };
    f32::from_bits(bits)
}

/// Convert a single-precision number to the bit pattern of the nearest
/// half-precision number, ties to even.
///
/// Values too large for half precision become infinities of the same sign;
/// values too small become zeros of the same sign.
#[must_use]
pub fn f32_to_half(value: f32) -> u16 {
    let bits = value.to_bits();
    let sign = ((bits & F32_SIGN) >> 16) as u16;
    let exp = bits & F32_EXP;
    let man = bits & F32_MAN;

    if exp == F32_EXP {
        if man == 0 {
            return sign | HALF_EXP;
        }
        let man = (man >> 13) as u16;
        return sign | HALF_EXP | if man == 0 { 1 } else { man };
    }

    let half_exp = (exp >> 23) as i32 - BIAS_DIFF as i32;
    if half_exp >= 0x1F {
        return sign | HALF_EXP;
    }

    if half_exp <= 0 {
        // the result is subnormal, or zero if even rounding cannot reach the
        // smallest subnormal
        if 14 - half_exp > 24 {
            return sign;
        }
        let man = man | 0x0080_0000;
        let shift = (14 - half_exp) as u32;
        let mut half_man = (man >> shift) as u16;
        let round_bit = 1_u32 << (shift - 1);
        if man & round_bit != 0 && man & (3 * round_bit - 1) != 0 {
            half_man += 1;
        }
        return sign | half_man;
    }

    let half = sign | ((half_exp as u16) << 10) | (man >> 13) as u16;
    let round_bit = 0x1000;
    if man & round_bit != 0 && man & (3 * round_bit - 1) != 0 {
        // a carry out of the mantissa correctly increments the exponent,
        // possibly up to infinity
        half + 1
    } else {
        half
    }
}

/// Trait for reading floating-point and fixed-point numbers.
pub trait FloatRead<E: Endianness>: IntRead<E> {
    /// Read a half-precision number.
    #[inline]
    fn read_half(&mut self) -> Result<f32, CodecError> {
        self.read_u16().map(half_to_f32)
    }

    /// Read a single-precision number.
    #[inline]
    fn read_f32(&mut self) -> Result<f32, CodecError> {
        self.read_u32().map(f32::from_bits)
    }

    /// Read a signed 8.8 fixed-point number.
    #[inline]
    fn read_fixed8(&mut self) -> Result<f32, CodecError> {
        self.read_i16().map(|x| x as f32 / 256.0)
    }

    /// Read a signed 16.16 fixed-point number.
    #[inline]
    fn read_fixed16(&mut self) -> Result<f64, CodecError> {
        self.read_i32().map(|x| x as f64 / 65536.0)
    }
}

/// Trait for writing floating-point and fixed-point numbers.
///
/// Fixed-point writers round to the nearest representable value and
/// saturate out-of-range values.
pub trait FloatWrite<E: Endianness>: IntWrite<E> {
    #[inline]
    fn write_half(&mut self, value: f32) -> Result<(), CodecError> {
        self.write_u16(f32_to_half(value))
    }

    #[inline]
    fn write_f32(&mut self, value: f32) -> Result<(), CodecError> {
        self.write_u32(value.to_bits())
    }

    #[inline]
    fn write_fixed8(&mut self, value: f32) -> Result<(), CodecError> {
        self.write_i16((value * 256.0).round() as i16)
    }

    #[inline]
    fn write_fixed16(&mut self, value: f64) -> Result<(), CodecError> {
        self.write_i32((value * 65536.0).round() as i32)
    }
}

impl<E: Endianness, B: BitRead<E> + ?Sized> FloatRead<E> for B {}
impl<E: Endianness, B: BitWrite<E> + ?Sized> FloatWrite<E> for B {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impls::{BufBitReader, BufBitWriter};
    use half::f16;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_boundaries() {
        let cases: [(f32, u16); 9] = [
            (0.0, 0x0000),
            (-0.0, 0x8000),
            (2.0_f32.powi(-14), 0x0400),
            (2.0_f32.powi(-24), 0x0001),
            (65504.0, 0x7BFF),
            (f32::INFINITY, 0x7C00),
            (f32::NEG_INFINITY, 0xFC00),
            (1.0, 0x3C00),
            (-2.0, 0xC000),
        ];
        for (value, half) in cases {
            assert_eq!(f32_to_half(value), half, "{value}");
            assert_eq!(half_to_f32(half).to_bits(), value.to_bits(), "{half:#x}");
        }
    }

    #[test]
    fn test_saturation() {
        assert_eq!(f32_to_half(65519.0), 0x7BFF);
        assert_eq!(f32_to_half(65520.0), 0x7C00);
        assert_eq!(f32_to_half(1e10), 0x7C00);
        assert_eq!(f32_to_half(-1e10), 0xFC00);
        assert_eq!(f32_to_half(2.0_f32.powi(-26)), 0x0000);
        assert_eq!(f32_to_half(-(2.0_f32.powi(-25))), 0x8000);
        assert_eq!(f32_to_half(1.5 * 2.0_f32.powi(-25)), 0x0001);
        assert_eq!(f32_to_half(f32::MIN_POSITIVE), 0x0000);
    }

    #[test]
    fn test_nan() {
        assert_eq!(f32_to_half(f32::NAN), 0x7E00);
        // the payload is in the low bits only, which are dropped
        assert_eq!(f32_to_half(f32::from_bits(0x7F80_0001)), 0x7C01);
        assert_eq!(f32_to_half(f32::from_bits(0xFF80_1FFF)), 0xFC01);
        assert_eq!(f32_to_half(f32::from_bits(0x7F80_2000)), 0x7C01);
        assert_eq!(f32_to_half(f32::from_bits(0x7FFF_FFFF)), 0x7FFF);
        for half in [0x7C01, 0x7E00, 0xFFFF] {
            let value = half_to_f32(half);
            assert!(value.is_nan());
            assert_eq!(f32_to_half(value), half);
        }
    }

    #[test]
    fn test_all_halves() {
        for half in 0..=u16::MAX {
            let value = half_to_f32(half);
            let expected = f16::from_bits(half).to_f32();
            if expected.is_nan() {
                assert!(value.is_nan(), "{half:#x}");
                continue;
            }
            assert_eq!(value.to_bits(), expected.to_bits(), "{half:#x}");
            assert_eq!(f32_to_half(value), half, "{half:#x}");
        }
    }

    #[test]
    fn test_random_narrowing() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..1_000_000 {
            let value = f32::from_bits(rng.random());
            if value.is_nan() {
                continue;
            }
            assert_eq!(
                f32_to_half(value),
                f16::from_f32(value).to_bits(),
                "{:#x}",
                value.to_bits()
            );
        }
        // concentrate on the range of halves, subnormals included
        for _ in 0..1_000_000 {
            let scale = 2.0_f32.powi(rng.random_range(-30..0));
            let value: f32 = rng.random_range(-70000.0..70000.0) * scale;
            assert_eq!(
                f32_to_half(value),
                f16::from_f32(value).to_bits(),
                "{:#x}",
                value.to_bits()
            );
        }
    }

    macro_rules! impl_tests {
        ($test_name:ident, $E:ty) => {
            #[test]
            fn $test_name() -> anyhow::Result<()> {
                let mut writer = <BufBitWriter<$E, _>>::new(Vec::new());
                writer.write_half(0.5)?;
                writer.write_half(-65504.0)?;
                writer.write_f32(core::f32::consts::PI)?;
                writer.write_fixed8(24.0)?;
                writer.write_fixed8(-1.5)?;
                writer.write_fixed8(12.3)?;
                writer.write_fixed16(-0.25)?;
                writer.write_fixed16(1234.000_015)?;
                let data = writer.finish()?;
                assert_eq!(data.len(), 2 + 2 + 4 + 2 * 3 + 4 * 2);

                let mut reader = <BufBitReader<$E, _>>::new(&data[..]);
                assert_eq!(reader.read_half()?, 0.5);
                assert_eq!(reader.read_half()?, -65504.0);
                assert_eq!(reader.read_f32()?, core::f32::consts::PI);
                assert_eq!(reader.read_fixed8()?, 24.0);
                assert_eq!(reader.read_fixed8()?, -1.5);
                assert_eq!(reader.read_fixed8()?, 3149.0 / 256.0);
                assert_eq!(reader.read_fixed16()?, -0.25);
                assert_eq!(reader.read_fixed16()?, 1234.0 + 1.0 / 65536.0);
                Ok(())
            }
        };
    }

    impl_tests!(test_floats_le, LE);
    impl_tests!(test_floats_be, BE);

    #[test]
    fn test_frame_rate_layout() -> anyhow::Result<()> {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        writer.write_fixed8(24.0)?;
        assert_eq!(writer.finish()?, [0x00, 0x18]);
        Ok(())
    }
}
