/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::CodecError;
use crate::traits::*;
use crate::utils::TextEncoding;

/// A wrapper over a [`BitRead`] that logs at trace level all operations
/// performed, including checkpoint operations.
///
/// Since fields are read by extension traits built on the primitives of
/// [`BitRead`], the log shows how every field maps onto bits and bytes.
#[derive(Debug)]
pub struct DbgBitReader<E: Endianness, R> {
    reader: R,
    _marker: core::marker::PhantomData<E>,
}

impl<E: Endianness, R> DbgBitReader<E, R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            _marker: Default::default(),
        }
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<E: Endianness, R: BitRead<E>> Checkpoint for DbgBitReader<E, R> {
    fn mark(&mut self) {
        log::trace!("mark() at byte {}", self.reader.byte_pos());
        self.reader.mark()
    }
    fn unmark(&mut self) -> Result<u64, CodecError> {
        let result = self.reader.unmark();
        log::trace!("unmark(): {:?}", result);
        result
    }
    fn last_mark(&self) -> Option<u64> {
        self.reader.last_mark()
    }
    fn reset(&mut self) -> Result<(), CodecError> {
        let result = self.reader.reset();
        log::trace!("reset(): {:?}", result);
        result
    }
    fn byte_pos(&self) -> u64 {
        self.reader.byte_pos()
    }
    fn check(&self, expected: u64) -> Result<(), CodecError> {
        let result = self.reader.check(expected);
        log::trace!("check({}): {:?}", expected, result);
        result
    }
}

impl<E: Endianness, R: BitRead<E>> BitRead<E> for DbgBitReader<E, R> {
    fn read_bits(&mut self, n: usize) -> Result<u32, CodecError> {
        let value = self.reader.read_bits(n)?;
        log::trace!("read_bits({}): {}", n, value);
        Ok(value)
    }
    fn read_signed_bits(&mut self, n: usize) -> Result<i32, CodecError> {
        let value = self.reader.read_signed_bits(n)?;
        log::trace!("read_signed_bits({}): {}", n, value);
        Ok(value)
    }
    fn peek_bits(&mut self, n: usize) -> Result<u32, CodecError> {
        let value = self.reader.peek_bits(n)?;
        log::trace!("peek_bits({}): {}", n, value);
        Ok(value)
    }
    fn skip_bits(&mut self, n: u64) -> Result<(), CodecError> {
        log::trace!("skip_bits({})", n);
        self.reader.skip_bits(n)
    }
    fn align_to_byte(&mut self) {
        log::trace!("align_to_byte() at bit {}", self.reader.bit_pos());
        self.reader.align_to_byte()
    }
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        self.reader.read_bytes(buf)?;
        log::trace!("read_bytes({}): {:02x?}", buf.len(), buf);
        Ok(())
    }
    fn peek_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        self.reader.peek_bytes(buf)?;
        log::trace!("peek_bytes({}): {:02x?}", buf.len(), buf);
        Ok(())
    }
    fn skip_bytes(&mut self, n: u64) -> Result<(), CodecError> {
        log::trace!("skip_bytes({})", n);
        self.reader.skip_bytes(n)
    }
    fn read_until_nul(&mut self) -> Result<&[u8], CodecError> {
        let bytes = self.reader.read_until_nul()?;
        log::trace!("read_until_nul(): {} bytes", bytes.len());
        Ok(bytes)
    }
    fn eof(&mut self) -> Result<bool, CodecError> {
        let eof = self.reader.eof()?;
        log::trace!("eof(): {}", eof);
        Ok(eof)
    }
    fn bit_pos(&self) -> u64 {
        self.reader.bit_pos()
    }
    fn encoding(&self) -> TextEncoding {
        self.reader.encoding()
    }
}

/// A wrapper over a [`BitWrite`] that logs at trace level all operations
/// performed, including checkpoint operations.
#[derive(Debug)]
pub struct DbgBitWriter<E: Endianness, W> {
    writer: W,
    _marker: core::marker::PhantomData<E>,
}

impl<E: Endianness, W> DbgBitWriter<E, W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            _marker: Default::default(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<E: Endianness, W: BitWrite<E>> Checkpoint for DbgBitWriter<E, W> {
    fn mark(&mut self) {
        log::trace!("mark() at byte {}", self.writer.byte_pos());
        self.writer.mark()
    }
    fn unmark(&mut self) -> Result<u64, CodecError> {
        let result = self.writer.unmark();
        log::trace!("unmark(): {:?}", result);
        result
    }
    fn last_mark(&self) -> Option<u64> {
        self.writer.last_mark()
    }
    fn reset(&mut self) -> Result<(), CodecError> {
        let result = self.writer.reset();
        log::trace!("reset(): {:?}", result);
        result
    }
    fn byte_pos(&self) -> u64 {
        self.writer.byte_pos()
    }
    fn check(&self, expected: u64) -> Result<(), CodecError> {
        let result = self.writer.check(expected);
        log::trace!("check({}): {:?}", expected, result);
        result
    }
}

impl<E: Endianness, W: BitWrite<E>> BitWrite<E> for DbgBitWriter<E, W> {
    fn write_bits(&mut self, value: u32, n: usize) -> Result<(), CodecError> {
        log::trace!("write_bits({:#x}, {})", value, n);
        self.writer.write_bits(value, n)
    }
    fn write_signed_bits(&mut self, value: i32, n: usize) -> Result<(), CodecError> {
        log::trace!("write_signed_bits({}, {})", value, n);
        self.writer.write_signed_bits(value, n)
    }
    fn align_to_byte(&mut self) {
        log::trace!("align_to_byte() at bit {}", self.writer.bit_pos());
        self.writer.align_to_byte()
    }
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        log::trace!("write_bytes({}): {:02x?}", bytes.len(), bytes);
        self.writer.write_bytes(bytes)
    }
    fn flush(&mut self) -> Result<(), CodecError> {
        log::trace!("flush()");
        self.writer.flush()
    }
    fn bit_pos(&self) -> u64 {
        self.writer.bit_pos()
    }
    fn encoding(&self) -> TextEncoding {
        self.writer.encoding()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codes::{IntRead, IntWrite, VarIntRead, VarIntWrite};
    use crate::impls::{BufBitReader, BufBitWriter};

    #[test]
    fn test_forwarding() -> anyhow::Result<()> {
        let mut writer = DbgBitWriter::<BE, _>::new(<BufBitWriter<BE, _>>::new(Vec::new()));
        writer.write_bits(0b101, 3)?;
        writer.align_to_byte();
        writer.mark();
        writer.write_u16(0xCAFE)?;
        writer.write_var_u32(1000)?;
        writer.check(4)?;
        assert_eq!(writer.unmark()?, 1);
        let data = writer.into_inner().finish()?;
        assert_eq!(data, [0xA0, 0xCA, 0xFE, 0xE8, 0x07]);

        let mut reader = DbgBitReader::<BE, _>::new(<BufBitReader<BE, _>>::new(&data[..]));
        assert_eq!(reader.peek_bits(3)?, 0b101);
        assert_eq!(reader.read_signed_bits(3)?, -3);
        reader.align_to_byte();
        reader.mark();
        assert_eq!(reader.read_u16()?, 0xCAFE);
        assert_eq!(reader.read_var_u32()?, 1000);
        assert!(reader.check(3).is_err());
        reader.reset()?;
        assert_eq!(reader.read_u8()?, 0xCA);
        assert_eq!(BitRead::<BE>::bit_pos(&reader), 16);
        assert!(!reader.eof()?);
        Ok(())
    }
}
