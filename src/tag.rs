/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Tag framing.
//!
//! Every top-level record (a *tag*) starts with a 16-bit header, stored in
//! the byte order of the stream, containing the type code of the record in
//! its upper 10 bits and the length in bytes of the body in its lower 6 bits:
//!
//! ```text
//! short form:    | type code (10) | length (6) |
//! extended form: | type code (10) |   63 (6)   | length (32) |
//! ```
//!
//! Bodies of at most [`MAX_SHORT_LENGTH`] bytes use the short form; longer
//! bodies use the extended form, in which the 6-bit field contains the
//! escape value [`EXTENDED_LENGTH`] and the length follows as a 32-bit
//! integer. A few record types always use the extended form, whatever their
//! length: [`TagHeader::new_extended`] creates their headers.
//!
//! The length must be known before the body is written: encoders compute it
//! first, and then write header and body with [`encode_tag`], which also
//! checks that the body has the declared length.
//!
//! ```
//! use swf_bitstream::prelude::*;
//!
//! // a SetBackgroundColor tag
//! let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
//! encode_tag(&mut writer, TagHeader::new(9, 3), |w| w.write_bytes(&[0xFF, 0x80, 0x00]))
//!     .unwrap();
//! let data = writer.finish().unwrap();
//! assert_eq!(data, [0x43, 0x02, 0xFF, 0x80, 0x00]);
//!
//! let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
//! let (header, color) = decode_tag(&mut reader, |_, r| {
//!     let mut color = [0; 3];
//!     r.read_bytes(&mut color)?;
//!     Ok(color)
//! })
//! .unwrap();
//! assert_eq!(header.type_code, 9);
//! assert_eq!(color, [0xFF, 0x80, 0x00]);
//! ```

use crate::codes::{IntRead, IntWrite};
use crate::error::CodecError;
use crate::traits::*;

/// The largest type code that fits in a header.
pub const MAX_TYPE_CODE: u16 = (1 << 10) - 1;

/// The largest body length that can be stored in a short header.
pub const MAX_SHORT_LENGTH: u32 = 62;

/// The value of the 6-bit length field announcing a 32-bit length.
pub const EXTENDED_LENGTH: u16 = 63;

/// The length in bytes of a short header.
pub const SHORT_HEADER_LEN: usize = 2;

/// The length in bytes of an extended header.
pub const EXTENDED_HEADER_LEN: usize = 6;

const LENGTH_MASK: u16 = 0x3F;

/// Return the length in bytes of the header of a record whose body is
/// `length` bytes long, assuming the shortest form.
#[must_use]
#[inline]
pub const fn header_len(length: u32) -> usize {
    if length > MAX_SHORT_LENGTH {
        EXTENDED_HEADER_LEN
    } else {
        SHORT_HEADER_LEN
    }
}

/// The header of a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagHeader {
    /// The type code, at most [`MAX_TYPE_CODE`].
    pub type_code: u16,
    /// The length in bytes of the body.
    pub length: u32,
    /// Whether the header uses the extended form even if the length would
    /// fit a short header. Lengths larger than [`MAX_SHORT_LENGTH`] always
    /// use the extended form.
    pub extended: bool,
}

impl TagHeader {
    /// Return the header of a record with the given body length, in the
    /// shortest form.
    pub const fn new(type_code: u16, length: u32) -> Self {
        Self {
            type_code,
            length,
            extended: length > MAX_SHORT_LENGTH,
        }
    }

    /// Return the header of a record with the given body length in the
    /// extended form, even if the length would fit a short header.
    pub const fn new_extended(type_code: u16, length: u32) -> Self {
        Self {
            type_code,
            length,
            extended: true,
        }
    }

    /// Whether this header is written in the extended form.
    pub const fn is_extended(&self) -> bool {
        self.extended || self.length > MAX_SHORT_LENGTH
    }

    /// Return the length in bytes of this header.
    pub const fn header_len(&self) -> usize {
        if self.is_extended() {
            EXTENDED_HEADER_LEN
        } else {
            SHORT_HEADER_LEN
        }
    }

    /// Return the length in bytes of the record, header included.
    pub const fn total_len(&self) -> u64 {
        self.header_len() as u64 + self.length as u64
    }

    /// Read a header.
    pub fn read<E: Endianness, R: BitRead<E> + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, CodecError> {
        let word = reader.read_u16()?;
        let type_code = word >> 6;
        let short = word & LENGTH_MASK;
        if short == EXTENDED_LENGTH {
            Ok(Self::new_extended(type_code, reader.read_u32()?))
        } else {
            Ok(Self {
                type_code,
                length: short as u32,
                extended: false,
            })
        }
    }

    /// Read a header without consuming it.
    pub fn peek<E: Endianness, R: BitRead<E> + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, CodecError> {
        let mut bytes = [0; EXTENDED_HEADER_LEN];
        reader.peek_bytes(&mut bytes[..SHORT_HEADER_LEN])?;
        let word = E::u16_from([bytes[0], bytes[1]]);
        let type_code = word >> 6;
        let short = word & LENGTH_MASK;
        if short == EXTENDED_LENGTH {
            reader.peek_bytes(&mut bytes)?;
            let length = E::u32_from([bytes[2], bytes[3], bytes[4], bytes[5]]);
            Ok(Self::new_extended(type_code, length))
        } else {
            Ok(Self {
                type_code,
                length: short as u32,
                extended: false,
            })
        }
    }

    /// Write this header.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidTypeCode`] if the type code does not fit in 10
    /// bits.
    pub fn write<E: Endianness, W: BitWrite<E> + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<(), CodecError> {
        if self.type_code > MAX_TYPE_CODE {
            return Err(CodecError::InvalidTypeCode(self.type_code as u32));
        }
        if self.is_extended() {
            writer.write_u16((self.type_code << 6) | EXTENDED_LENGTH)?;
            writer.write_u32(self.length)
        } else {
            writer.write_u16((self.type_code << 6) | self.length as u16)
        }
    }
}

/// Write `header` and then the body written by `f`, checking that the body
/// has the length declared by the header.
pub fn encode_tag<E, W, F>(writer: &mut W, header: TagHeader, f: F) -> Result<(), CodecError>
where
    E: Endianness,
    W: BitWrite<E> + ?Sized,
    F: FnOnce(&mut W) -> Result<(), CodecError>,
{
    header.write(writer)?;
    writer.mark();
    let result = f(writer).and_then(|()| writer.check(header.length as u64));
    writer.unmark()?;
    result
}

/// Read a header and then the body read by `f`, checking that the body has
/// the declared length.
///
/// `f` receives the header, so it can be used to decode variable-length
/// bodies.
pub fn decode_tag<E, R, T, F>(reader: &mut R, f: F) -> Result<(TagHeader, T), CodecError>
where
    E: Endianness,
    R: BitRead<E> + ?Sized,
    F: FnOnce(&TagHeader, &mut R) -> Result<T, CodecError>,
{
    let header = TagHeader::read(reader)?;
    reader.mark();
    let result = f(&header, reader)
        .and_then(|value| reader.check(header.length as u64).map(|()| value));
    reader.unmark()?;
    result.map(|value| (header, value))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::impls::{BufBitReader, BufBitWriter};

    macro_rules! impl_tests {
        ($test_name:ident, $E:ty) => {
            #[test]
            fn $test_name() -> anyhow::Result<()> {
                let body = [0xA5_u8; 300];
                let mut writer = <BufBitWriter<$E, _>>::new(Vec::new());
                let mut expected_len = 0;
                for length in [0, 1, 61, 62, 63, 64, 300] {
                    let header = TagHeader::new(length as u16 + 1, length);
                    assert_eq!(header.extended, length >= 63);
                    assert_eq!(header.header_len(), header_len(length));
                    encode_tag(&mut writer, header, |w| {
                        w.write_bytes(&body[..length as usize])
                    })?;
                    expected_len += header.total_len();
                    assert_eq!(writer.byte_pos(), expected_len);
                }
                encode_tag(&mut writer, TagHeader::new_extended(MAX_TYPE_CODE, 5), |w| {
                    w.write_bytes(&body[..5])
                })?;
                let data = writer.finish()?;
                assert_eq!(data.len() as u64, expected_len + 11);

                let mut reader = <BufBitReader<$E, _>>::new(&data[..]);
                for length in [0, 1, 61, 62, 63, 64, 300] {
                    let peeked = TagHeader::peek(&mut reader)?;
                    let (header, read) = decode_tag(&mut reader, |header, r| {
                        let mut read = vec![0; header.length as usize];
                        r.read_bytes(&mut read)?;
                        Ok(read)
                    })?;
                    assert_eq!(peeked, header);
                    assert_eq!(header, TagHeader::new(length as u16 + 1, length));
                    assert_eq!(read, &body[..length as usize]);
                }
                let header = TagHeader::read(&mut reader)?;
                assert_eq!(header, TagHeader::new_extended(MAX_TYPE_CODE, 5));
                reader.skip_bytes(header.length as u64)?;
                assert!(reader.eof()?);
                Ok(())
            }
        };
    }

    impl_tests!(test_tags_le, LE);
    impl_tests!(test_tags_be, BE);

    #[test]
    fn test_wire_format() -> anyhow::Result<()> {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        TagHeader::new(1, 0).write(&mut writer)?;
        TagHeader::new(2, 62).write(&mut writer)?;
        TagHeader::new(2, 63).write(&mut writer)?;
        TagHeader::new_extended(20, 1).write(&mut writer)?;
        assert_eq!(
            writer.finish()?,
            [
                0x40, 0x00, // 1 << 6
                0xBE, 0x00, // 2 << 6 | 62
                0xBF, 0x00, 0x3F, 0x00, 0x00, 0x00, // 2 << 6 | 63, 63
                0x3F, 0x05, 0x01, 0x00, 0x00, 0x00, // 20 << 6 | 63, 1
            ]
        );

        let mut writer = <BufBitWriter<BE, _>>::new(Vec::new());
        TagHeader::new(2, 63).write(&mut writer)?;
        assert_eq!(writer.finish()?, [0x00, 0xBF, 0x00, 0x00, 0x00, 0x3F]);
        Ok(())
    }

    #[test]
    fn test_length_changed_after_new() -> anyhow::Result<()> {
        let mut header = TagHeader::new(9, 10);
        header.length = 100;
        assert!(header.is_extended());
        assert_eq!(header.total_len(), 106);
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        header.write(&mut writer)?;
        let data = writer.finish()?;
        assert_eq!(data, [0x7F, 0x02, 100, 0, 0, 0]);

        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        let read = TagHeader::read(&mut reader)?;
        assert_eq!((read.type_code, read.length), (9, 100));
        Ok(())
    }

    #[test]
    fn test_invalid_type_code() {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        assert!(matches!(
            TagHeader::new(MAX_TYPE_CODE + 1, 0).write(&mut writer),
            Err(CodecError::InvalidTypeCode(1024))
        ));
        assert_eq!(writer.byte_pos(), 0);
    }

    #[test]
    fn test_length_mismatch() -> anyhow::Result<()> {
        let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
        writer.write_u8(0)?;
        let err = encode_tag(&mut writer, TagHeader::new(7, 4), |w| w.write_bytes(&[1, 2, 3]))
            .unwrap_err();
        let mismatch = err.length_mismatch().unwrap();
        assert_eq!((mismatch.pos, mismatch.expected, mismatch.delta), (3, 4, 1));
        // the checkpoint has been popped anyway
        assert_eq!(writer.last_mark(), None);

        // a body that reads past its declared length
        let data = [0x02, 0x00, 1, 2, 3, 4];
        let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
        let err = decode_tag(&mut reader, |_, r| r.read_u32()).unwrap_err();
        assert_eq!(err.length_mismatch().unwrap().delta, -2);
        Ok(())
    }
}
