/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Variable-length integers.
//!
//! These codes represent an unsigned 32-bit integer as a sequence of bytes,
//! each carrying seven bits of the value in its lower bits and a
//! continuation bit in its most significant bit, which is set on all bytes
//! but the last one. Groups are stored starting from the least significant
//! one, as in [LEB128](https://en.wikipedia.org/wiki/LEB128), so the byte
//! order of the stream is irrelevant.
//!
//! The representation is not complete (e.g., `0x80 0x00` is a valid but
//! non-canonical representation of zero): writers always produce the
//! shortest form, readers accept any form of at most
//! [`MAX_VAR_INT_BYTES`] bytes.
//!
//! Counts and offsets without a natural fixed width (e.g., in action
//! bytecode) use this code.

use crate::error::CodecError;
use crate::traits::*;
use crate::utils::unsigned_size;

/// The maximum length in bytes of a variable-length integer.
pub const MAX_VAR_INT_BYTES: usize = 5;

const CONTINUATION: u8 = 0x80;
const GROUP_MASK: u8 = 0x7F;

/// Return the length of the variable-length code for `value` in bytes.
#[must_use]
#[inline]
pub const fn len_var_u32(value: u32) -> usize {
    let bits = unsigned_size(value);
    if bits == 0 { 1 } else { bits.div_ceil(7) }
}

/// Trait for reading variable-length integers.
pub trait VarIntRead<E: Endianness>: BitRead<E> {
    /// Read a variable-length integer.
    ///
    /// # Errors
    ///
    /// [`CodecError::VarIntOverflow`] if the code is longer than
    /// [`MAX_VAR_INT_BYTES`] bytes or its value does not fit in 32 bits.
    #[inline]
    fn read_var_u32(&mut self) -> Result<u32, CodecError> {
        self.align_to_byte();
        let pos = self.byte_pos();
        let mut value = 0_u32;
        let mut buf = [0; 1];
        for i in 0..MAX_VAR_INT_BYTES {
            self.read_bytes(&mut buf)?;
            let group = buf[0] & GROUP_MASK;
            if i == MAX_VAR_INT_BYTES - 1 && (buf[0] & CONTINUATION != 0 || group > 0x0F) {
                return Err(CodecError::VarIntOverflow { pos });
            }
            value |= (group as u32) << (7 * i);
            if buf[0] & CONTINUATION == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarIntOverflow { pos })
    }
}

/// Trait for writing variable-length integers.
pub trait VarIntWrite<E: Endianness>: BitWrite<E> {
    /// Write `value` as a variable-length integer and return the number of
    /// bytes written.
    #[inline]
    fn write_var_u32(&mut self, mut value: u32) -> Result<usize, CodecError> {
        let mut buf = [0; MAX_VAR_INT_BYTES];
        let mut len = 0;
        loop {
            let group = value as u8 & GROUP_MASK;
            value >>= 7;
            if value == 0 {
                buf[len] = group;
                len += 1;
                break;
            }
            buf[len] = group | CONTINUATION;
            len += 1;
        }
        self.write_bytes(&buf[..len])?;
        Ok(len)
    }
}

impl<E: Endianness, B: BitRead<E> + ?Sized> VarIntRead<E> for B {}
impl<E: Endianness, B: BitWrite<E> + ?Sized> VarIntWrite<E> for B {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impls::{BufBitReader, BufBitWriter};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_boundaries() -> anyhow::Result<()> {
        let values = [0, 1, 127, 128, 16383, 16384, (1 << 31) - 1, u32::MAX];
        let lens = [1, 1, 1, 2, 2, 3, 5, 5];
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        for (&value, &len) in values.iter().zip(lens.iter()) {
            assert_eq!(len_var_u32(value), len);
            assert_eq!(writer.write_var_u32(value)?, len);
        }
        let data = writer.finish()?;
        assert_eq!(data.len(), lens.iter().sum::<usize>());
        assert_eq!(&data[3..5], [0x80, 0x01]);

        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        for &value in &values {
            assert_eq!(reader.read_var_u32()?, value);
        }
        assert!(reader.eof()?);
        Ok(())
    }

    #[test]
    fn test_overflow() -> anyhow::Result<()> {
        let data = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        assert!(matches!(
            reader.read_var_u32(),
            Err(CodecError::VarIntOverflow { pos: 0 })
        ));

        // five bytes, but 35 bits
        let data = [0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        reader.read_bits(3)?;
        assert!(matches!(
            reader.read_var_u32(),
            Err(CodecError::VarIntOverflow { pos: 1 })
        ));

        // non-canonical forms are accepted
        let data = [0x80, 0x00, 0x81, 0x80, 0x00];
        let mut reader = <BufBitReader<BE, _>>::new(&data[..]);
        assert_eq!(reader.read_var_u32()?, 0);
        assert_eq!(reader.read_var_u32()?, 1);

        let data = [0x80, 0x80];
        let mut reader = <BufBitReader<BE, _>>::new(&data[..]);
        assert!(reader.read_var_u32().unwrap_err().is_eof());
        Ok(())
    }

    macro_rules! impl_tests {
        ($test_name:ident, $E:ty) => {
            #[test]
            fn $test_name() -> anyhow::Result<()> {
                let mut rng = StdRng::seed_from_u64(0);
                let values: Vec<u32> = (0..10_000)
                    .map(|_| rng.random::<u32>() >> rng.random_range(0..32_u32))
                    .collect();

                let mut writer = <BufBitWriter<$E, _>>::with_capacity(Vec::new(), 8);
                let mut total = 0;
                for &value in &values {
                    total += writer.write_var_u32(value)?;
                }
                let data = writer.finish()?;
                assert_eq!(data.len(), total);
                assert_eq!(
                    total,
                    values.iter().map(|&value| len_var_u32(value)).sum::<usize>()
                );

                let mut reader = <BufBitReader<$E, _>>::with_capacity(&data[..], 8);
                for &value in &values {
                    assert_eq!(reader.read_var_u32()?, value);
                }
                Ok(())
            }
        };
    }

    impl_tests!(test_var_ints_le, LE);
    impl_tests!(test_var_ints_be, BE);
}
