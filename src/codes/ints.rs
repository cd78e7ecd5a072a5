/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Byte-aligned fixed-width integers.
//!
//! Integers are assembled in the byte order `E` of the stream. Every method
//! first [aligns](BitRead::align_to_byte) the stream, discarding (or, when
//! writing, zero-padding) the rest of a partially consumed byte.

use crate::error::CodecError;
use crate::traits::*;

/// Trait for reading byte-aligned integers.
pub trait IntRead<E: Endianness>: BitRead<E> {
    #[inline]
    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let mut buf = [0; 1];
        self.read_bytes(&mut buf)?;
        Ok(buf[0])
    }

    #[inline]
    fn read_i8(&mut self) -> Result<i8, CodecError> {
        self.read_u8().map(|x| x as i8)
    }

    #[inline]
    fn read_u16(&mut self) -> Result<u16, CodecError> {
        let mut buf = [0; 2];
        self.read_bytes(&mut buf)?;
        Ok(E::u16_from(buf))
    }

    #[inline]
    fn read_i16(&mut self) -> Result<i16, CodecError> {
        self.read_u16().map(|x| x as i16)
    }

    #[inline]
    fn read_u32(&mut self) -> Result<u32, CodecError> {
        let mut buf = [0; 4];
        self.read_bytes(&mut buf)?;
        Ok(E::u32_from(buf))
    }

    #[inline]
    fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.read_u32().map(|x| x as i32)
    }
}

/// Trait for writing byte-aligned integers.
pub trait IntWrite<E: Endianness>: BitWrite<E> {
    #[inline]
    fn write_u8(&mut self, value: u8) -> Result<(), CodecError> {
        self.write_bytes(&[value])
    }

    #[inline]
    fn write_i8(&mut self, value: i8) -> Result<(), CodecError> {
        self.write_u8(value as u8)
    }

    #[inline]
    fn write_u16(&mut self, value: u16) -> Result<(), CodecError> {
        self.write_bytes(&E::u16_bytes(value))
    }

    #[inline]
    fn write_i16(&mut self, value: i16) -> Result<(), CodecError> {
        self.write_u16(value as u16)
    }

    #[inline]
    fn write_u32(&mut self, value: u32) -> Result<(), CodecError> {
        self.write_bytes(&E::u32_bytes(value))
    }

    #[inline]
    fn write_i32(&mut self, value: i32) -> Result<(), CodecError> {
        self.write_u32(value as u32)
    }
}

impl<E: Endianness, B: BitRead<E> + ?Sized> IntRead<E> for B {}
impl<E: Endianness, B: BitWrite<E> + ?Sized> IntWrite<E> for B {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impls::{BufBitReader, BufBitWriter};

    #[test]
    fn test_byte_order() -> anyhow::Result<()> {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        writer.write_u16(0x1234)?;
        writer.write_i32(-2)?;
        assert_eq!(writer.finish()?, [0x34, 0x12, 0xFE, 0xFF, 0xFF, 0xFF]);

        let mut writer = <BufBitWriter<BE, _>>::new(Vec::new());
        writer.write_u16(0x1234)?;
        writer.write_i32(-2)?;
        assert_eq!(writer.finish()?, [0x12, 0x34, 0xFF, 0xFF, 0xFF, 0xFE]);
        Ok(())
    }

    macro_rules! impl_tests {
        ($test_name:ident, $E:ty) => {
            #[test]
            fn $test_name() -> anyhow::Result<()> {
                let mut writer = <BufBitWriter<$E, _>>::with_capacity(Vec::new(), 8);
                for i in 0..1000_u32 {
                    // a leading bit field makes every integer realign
                    writer.write_bits(1, (i % 8) as usize)?;
                    writer.write_u8(i as u8)?;
                    writer.write_i8((i as i8).wrapping_neg())?;
                    writer.write_u16(i as u16 * 61)?;
                    writer.write_i16(-(i as i16) * 31)?;
                    writer.write_u32(i.wrapping_mul(0x9E37_79B9))?;
                    writer.write_i32(-(i as i32) * 1_000_003)?;
                }
                let data = writer.finish()?;

                let mut reader = <BufBitReader<$E, _>>::with_capacity(&data[..], 8);
                for i in 0..1000_u32 {
                    let n = (i % 8) as usize;
                    assert_eq!(reader.read_bits(n)?, if n == 0 { 0 } else { 1 });
                    assert_eq!(reader.read_u8()?, i as u8);
                    assert_eq!(reader.read_i8()?, (i as i8).wrapping_neg());
                    assert_eq!(reader.read_u16()?, i as u16 * 61);
                    assert_eq!(reader.read_i16()?, -(i as i16) * 31);
                    assert_eq!(reader.read_u32()?, i.wrapping_mul(0x9E37_79B9));
                    assert_eq!(reader.read_i32()?, -(i as i32) * 1_000_003);
                }
                assert!(reader.eof()?);
                assert!(reader.read_u16().unwrap_err().is_eof());
                Ok(())
            }
        };
    }

    impl_tests!(test_ints_le, LE);
    impl_tests!(test_ints_be, BE);
}
