/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Strings.
//!
//! Strings are either null-terminated, or stored in a field of known length
//! padded with zeros. Text is decoded and encoded with the
//! [encoding](crate::traits::BitRead::encoding) of the stream.

use crate::error::CodecError;
use crate::traits::*;
use crate::utils::TextEncoding;

/// Return the length in bytes of `text` written by
/// [`write_string`](StringWrite::write_string), terminating zero included.
#[must_use]
#[inline]
pub fn len_string(encoding: TextEncoding, text: &str) -> usize {
    encoding.encoded_len(text) + 1
}

/// Trait for reading strings.
pub trait StringRead<E: Endianness>: BitRead<E> {
    /// Read a field of `len` bytes and decode it, ignoring trailing zeros.
    fn read_string(&mut self, len: usize) -> Result<String, CodecError> {
        self.align_to_byte();
        let pos = self.byte_pos();
        let mut bytes = vec![0; len];
        self.read_bytes(&mut bytes)?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        self.encoding().decode(&bytes[..end], pos)
    }

    /// Read a null-terminated string.
    fn read_cstring(&mut self) -> Result<String, CodecError> {
        self.align_to_byte();
        let pos = self.byte_pos();
        let encoding = self.encoding();
        let bytes = self.read_until_nul()?;
        encoding.decode(bytes, pos)
    }
}

/// Trait for writing strings.
pub trait StringWrite<E: Endianness>: BitWrite<E> {
    /// Write `text` followed by a zero byte and return the number of bytes
    /// written.
    fn write_string(&mut self, text: &str) -> Result<usize, CodecError> {
        let mut bytes = Vec::with_capacity(text.len() + 1);
        self.encoding().encode(text, &mut bytes)?;
        bytes.push(0);
        self.write_bytes(&bytes)?;
        Ok(bytes.len())
    }
}

impl<E: Endianness, B: BitRead<E> + ?Sized> StringRead<E> for B {}
impl<E: Endianness, B: BitWrite<E> + ?Sized> StringWrite<E> for B {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impls::{BufBitReader, BufBitWriter};

    #[test]
    fn test_strings() -> anyhow::Result<()> {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        writer.write_bits(1, 1)?;
        assert_eq!(writer.write_string("héllo")?, len_string(TextEncoding::Utf8, "héllo"));
        writer.write_string("")?;
        writer.write_bytes(b"abc\0\0")?;
        let data = writer.finish()?;
        assert_eq!(data.len(), 1 + 7 + 1 + 5);

        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        assert_eq!(reader.read_bits(1)?, 1);
        assert_eq!(reader.read_cstring()?, "héllo");
        assert_eq!(reader.read_cstring()?, "");
        assert_eq!(reader.read_string(5)?, "abc");
        assert!(reader.eof()?);
        Ok(())
    }

    #[test]
    fn test_latin1() -> anyhow::Result<()> {
        let mut writer =
            <BufBitWriter<BE, _>>::new(Vec::new()).with_encoding(TextEncoding::Latin1);
        assert_eq!(writer.write_string("héllo")?, 6);
        assert!(writer.write_string("€").is_err());
        let data = writer.finish()?;
        assert_eq!(data, b"h\xe9llo\0");

        let mut reader = <BufBitReader<BE, _>>::new(&data[..]);
        assert!(matches!(
            reader.read_cstring(),
            Err(CodecError::InvalidText { pos: 1, .. })
        ));

        let mut reader =
            <BufBitReader<BE, _>>::new(&data[..]).with_encoding(TextEncoding::Latin1);
        assert_eq!(reader.read_string(6)?, "héllo");
        Ok(())
    }

    #[test]
    fn test_long_cstring() -> anyhow::Result<()> {
        let text: String = (0..10_000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let mut writer = BufBitWriter::<LE, _>::with_capacity(Vec::new(), 16);
        writer.write_string(&text)?;
        writer.write_string(&text[..100])?;
        let data = writer.finish()?;

        let mut reader = BufBitReader::<LE, _>::with_capacity(&data[..], 16);
        assert_eq!(reader.read_cstring()?, text);
        assert_eq!(reader.read_cstring()?, text[..100]);
        assert!(reader.read_cstring().unwrap_err().is_eof());
        Ok(())
    }
}
