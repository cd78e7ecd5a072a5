/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::io::{ErrorKind, Read};

use crate::error::CodecError;
use crate::traits::*;
use crate::utils::{MAX_FIELD_BITS, TextEncoding};

/// The default size in bytes of the internal buffer of [`BufBitReader`] and
/// [`BufBitWriter`](crate::impls::BufBitWriter).
pub const DEFAULT_CAPACITY: usize = 4096;

/// The minimum size in bytes of the internal buffers: a bit field of 32 bits
/// starting at any bit offset must fit.
pub const MIN_CAPACITY: usize = 8;

/// An implementation of [`BitRead`] and [`Checkpoint`] for a
/// [`std::io::Read`].
///
/// Bytes are read from the backend into an internal buffer, which is
/// [refilled](BufBitReader::fill) transparently whenever a read needs more
/// bytes than those available, even in the middle of a bit field: only whole
/// unread bytes are moved, so a partially consumed byte keeps its bit
/// offset.
///
/// A refill discards the bytes already consumed; afterwards, a
/// [reset](Checkpoint::reset) to a checkpoint before the discarded bytes
/// fails with [`CodecError::InvalidBacktrack`]. Decoders that need to
/// backtrack should use a capacity larger than the records they scan.
///
/// The byte order `E` is used only for multi-byte integers.
///
/// # Example
/// ```
/// use swf_bitstream::prelude::*;
///
/// let data = [0b1011_0011, 0x34, 0x12];
/// let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
/// assert_eq!(reader.read_bits(3).unwrap(), 0b101);
/// assert_eq!(reader.read_signed_bits(5).unwrap(), -13);
/// assert_eq!(reader.read_u16().unwrap(), 0x1234);
/// assert!(reader.eof().unwrap());
/// ```
#[derive(Debug)]
pub struct BufBitReader<E: Endianness, R: Read> {
    /// The source of bytes.
    backend: R,
    /// The buffer; its length is the capacity of the reader.
    buffer: Box<[u8]>,
    /// The number of valid bytes in the buffer.
    valid: usize,
    /// The index of the current byte in the buffer.
    index: usize,
    /// The offset of the next bit in the current byte. If nonzero, `index`
    /// is smaller than `valid`.
    offset: usize,
    /// The number of bytes discarded from the front of the buffer.
    stream_pos: u64,
    /// The checkpoint stack.
    marks: Vec<u64>,
    /// Scratch space for null-terminated reads.
    scratch: Vec<u8>,
    encoding: TextEncoding,
    _marker: core::marker::PhantomData<E>,
}

impl<E: Endianness, R: Read> BufBitReader<E, R> {
    /// Create a new [`BufBitReader`] with a buffer of [`DEFAULT_CAPACITY`]
    /// bytes.
    #[must_use]
    pub fn new(backend: R) -> Self {
        Self::with_capacity(backend, DEFAULT_CAPACITY)
    }

    /// Create a new [`BufBitReader`] with a buffer of `capacity` bytes (at
    /// least [`MIN_CAPACITY`]).
    #[must_use]
    pub fn with_capacity(backend: R, capacity: usize) -> Self {
        Self {
            backend,
            buffer: vec![0; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            valid: 0,
            index: 0,
            offset: 0,
            stream_pos: 0,
            marks: Vec::new(),
            scratch: Vec::new(),
            encoding: TextEncoding::default(),
            _marker: core::marker::PhantomData,
        }
    }

    /// Set the text encoding used by string reads.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the text encoding used by string reads.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Return the size of the internal buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Return the number of bytes discarded so far from the front of the
    /// buffer.
    pub fn stream_pos(&self) -> u64 {
        self.stream_pos
    }

    /// Return the backend. Buffered bytes are lost.
    pub fn into_inner(self) -> R {
        self.backend
    }

    /// Move the unread bytes to the front of the buffer, and read from the
    /// backend until the buffer is full or the backend is exhausted.
    ///
    /// Return the number of bytes read from the backend.
    pub fn fill(&mut self) -> Result<usize, CodecError> {
        self.buffer.copy_within(self.index..self.valid, 0);
        self.stream_pos += self.index as u64;
        self.valid -= self.index;
        self.index = 0;

        let mut read = 0;
        while self.valid < self.buffer.len() {
            match self.backend.read(&mut self.buffer[self.valid..]) {
                Ok(0) => break,
                Ok(n) => {
                    self.valid += n;
                    read += n;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        log::trace!(
            "fill: read {} bytes, {} bytes buffered at byte {}",
            read,
            self.valid,
            self.stream_pos
        );
        Ok(read)
    }

    #[inline(always)]
    fn available_bits(&self) -> usize {
        (self.valid - self.index) * 8 - self.offset
    }

    #[inline(always)]
    fn eof_error(&self, requested: u64) -> CodecError {
        CodecError::UnexpectedEof {
            bit_pos: BitRead::<E>::bit_pos(self),
            requested,
            available: self.available_bits() as u64,
        }
    }

    /// Make sure that at least `n_bits` bits are buffered.
    #[inline]
    fn ensure_bits(&mut self, n_bits: usize) -> Result<(), CodecError> {
        if self.available_bits() < n_bits {
            self.fill()?;
            if self.available_bits() < n_bits {
                return Err(self.eof_error(n_bits as u64));
            }
        }
        Ok(())
    }

    /// Return the five bytes starting at the current byte in the highest 40
    /// bits of a word. Bytes past the valid ones read as zero.
    #[inline]
    fn window(&self) -> u64 {
        let valid = &self.buffer[..self.valid];
        let mut window = 0_u64;
        for i in 0..5 {
            window <<= 8;
            if let Some(&byte) = valid.get(self.index + i) {
                window |= byte as u64;
            }
        }
        window << 24
    }

    #[inline(always)]
    fn advance_bits(&mut self, n_bits: usize) {
        let pos = self.index * 8 + self.offset + n_bits;
        self.index = pos >> 3;
        self.offset = pos & 7;
    }

    /// Skip `n` bytes from the current byte, refilling as needed.
    fn skip_whole_bytes(&mut self, mut n: u64) -> Result<(), CodecError> {
        loop {
            let available = (self.valid - self.index) as u64;
            if n <= available {
                self.index += n as usize;
                return Ok(());
            }
            n -= available;
            self.index = self.valid;
            if self.fill()? == 0 {
                return Err(self.eof_error(n * 8));
            }
        }
    }
}

impl<E: Endianness, R: Read> Checkpoint for BufBitReader<E, R> {
    #[inline]
    fn mark(&mut self) {
        self.marks.push(self.stream_pos + self.index as u64);
    }

    #[inline]
    fn unmark(&mut self) -> Result<u64, CodecError> {
        self.marks.pop().ok_or(CodecError::NoCheckpoint)
    }

    #[inline]
    fn last_mark(&self) -> Option<u64> {
        self.marks.last().copied()
    }

    fn reset(&mut self) -> Result<(), CodecError> {
        let target = self.last_mark().ok_or(CodecError::NoCheckpoint)?;
        if target < self.stream_pos {
            return Err(CodecError::InvalidBacktrack {
                target,
                discarded: self.stream_pos,
            });
        }
        self.index = (target - self.stream_pos) as usize;
        self.offset = 0;
        Ok(())
    }

    #[inline]
    fn byte_pos(&self) -> u64 {
        self.stream_pos + self.index as u64
    }
}

impl<E: Endianness, R: Read> BitRead<E> for BufBitReader<E, R> {
    #[inline]
    fn read_bits(&mut self, n_bits: usize) -> Result<u32, CodecError> {
        let value = self.peek_bits(n_bits)?;
        self.advance_bits(n_bits);
        Ok(value)
    }

    #[inline]
    fn read_signed_bits(&mut self, n_bits: usize) -> Result<i32, CodecError> {
        if n_bits > MAX_FIELD_BITS {
            return Err(CodecError::InvalidWidth(n_bits));
        }
        if n_bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(n_bits)?;
        // arithmetic shift to extend the sign
        let value = ((self.window() << self.offset) as i64 >> (64 - n_bits)) as i32;
        self.advance_bits(n_bits);
        Ok(value)
    }

    #[inline]
    fn peek_bits(&mut self, n_bits: usize) -> Result<u32, CodecError> {
        if n_bits > MAX_FIELD_BITS {
            return Err(CodecError::InvalidWidth(n_bits));
        }
        if n_bits == 0 {
            return Ok(0);
        }
        self.ensure_bits(n_bits)?;
        Ok(((self.window() << self.offset) >> (64 - n_bits)) as u32)
    }

    fn skip_bits(&mut self, n_bits: u64) -> Result<(), CodecError> {
        let total = self.offset as u64 + n_bits;
        self.offset = 0;
        self.skip_whole_bytes(total / 8)?;
        let rest = (total % 8) as usize;
        if rest != 0 {
            self.ensure_bits(rest)?;
            self.offset = rest;
        }
        Ok(())
    }

    #[inline]
    fn align_to_byte(&mut self) {
        if self.offset > 0 {
            self.index += 1;
            self.offset = 0;
        }
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        BitRead::<E>::align_to_byte(self);
        let mut done = 0;
        while done < buf.len() {
            let available = self.valid - self.index;
            if available == 0 {
                if self.fill()? == 0 {
                    return Err(self.eof_error(((buf.len() - done) * 8) as u64));
                }
                continue;
            }
            let len = available.min(buf.len() - done);
            buf[done..done + len].copy_from_slice(&self.buffer[self.index..self.index + len]);
            self.index += len;
            done += len;
        }
        Ok(())
    }

    fn peek_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError> {
        let skip = usize::from(self.offset > 0);
        if self.valid - self.index < skip + buf.len() {
            self.fill()?;
            if self.valid - self.index < skip + buf.len() {
                return Err(self.eof_error((buf.len() * 8) as u64));
            }
        }
        let start = self.index + skip;
        buf.copy_from_slice(&self.buffer[start..start + buf.len()]);
        Ok(())
    }

    fn skip_bytes(&mut self, n: u64) -> Result<(), CodecError> {
        BitRead::<E>::align_to_byte(self);
        self.skip_whole_bytes(n)
    }

    fn read_until_nul(&mut self) -> Result<&[u8], CodecError> {
        BitRead::<E>::align_to_byte(self);
        self.scratch.clear();
        loop {
            let unread = &self.buffer[self.index..self.valid];
            if let Some(len) = unread.iter().position(|&b| b == 0) {
                self.scratch.extend_from_slice(&unread[..len]);
                self.index += len + 1;
                return Ok(&self.scratch);
            }
            self.scratch.extend_from_slice(unread);
            self.index = self.valid;
            if self.fill()? == 0 {
                return Err(self.eof_error(8));
            }
        }
    }

    fn eof(&mut self) -> Result<bool, CodecError> {
        let skip = usize::from(self.offset > 0);
        if self.index + skip < self.valid {
            return Ok(false);
        }
        self.fill()?;
        Ok(self.index + skip >= self.valid)
    }

    #[inline]
    fn bit_pos(&self) -> u64 {
        (self.stream_pos + self.index as u64) * 8 + self.offset as u64
    }

    #[inline]
    fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}
