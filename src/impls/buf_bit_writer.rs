/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::io::Write;

use crate::error::{CodecError, LengthMismatch};
use crate::impls::{DEFAULT_CAPACITY, MIN_CAPACITY};
use crate::traits::*;
use crate::utils::{MAX_FIELD_BITS, TextEncoding, bytes_for_bits, low_mask};

/// An implementation of [`BitWrite`] and [`Checkpoint`] for a
/// [`std::io::Write`].
///
/// Bits are accumulated in an internal buffer, which is
/// [flushed](BitWrite::flush) to the backend when a write would overflow
/// it. A partially written trailing byte stays in the buffer until it is
/// completed, so call [`finish`](BufBitWriter::finish) (or
/// [`align_to_byte`](BitWrite::align_to_byte) and then
/// [`flush`](BitWrite::flush)) at the end of the stream.
///
/// Writes replace the destination bits rather than or-ing into them, so
/// that [`patch`](BufBitWriter::patch) can go back to a checkpoint and
/// rewrite a length whose value was not known in advance, as long as the
/// checkpoint has not been flushed.
///
/// The byte order `E` is used only for multi-byte integers.
#[derive(Debug)]
pub struct BufBitWriter<E: Endianness, W: Write> {
    /// The sink of bytes.
    backend: W,
    /// The buffer; its length is the capacity of the writer. Bytes past the
    /// current one are zero.
    buffer: Box<[u8]>,
    /// The index of the current byte in the buffer.
    index: usize,
    /// The offset of the next bit in the current byte.
    offset: usize,
    /// The number of bytes flushed to the backend.
    stream_pos: u64,
    /// The checkpoint stack.
    marks: Vec<u64>,
    /// While patching, the bit positions in the buffer of the checkpoint
    /// and of the end of the data.
    patch_window: Option<(usize, usize)>,
    encoding: TextEncoding,
    _marker: core::marker::PhantomData<E>,
}

impl<E: Endianness, W: Write> BufBitWriter<E, W> {
    /// Create a new [`BufBitWriter`] with a buffer of [`DEFAULT_CAPACITY`]
    /// bytes.
    #[must_use]
    pub fn new(backend: W) -> Self {
        Self::with_capacity(backend, DEFAULT_CAPACITY)
    }

    /// Create a new [`BufBitWriter`] with a buffer of `capacity` bytes (at
    /// least [`MIN_CAPACITY`]).
    #[must_use]
    pub fn with_capacity(backend: W, capacity: usize) -> Self {
        Self {
            backend,
            buffer: vec![0; capacity.max(MIN_CAPACITY)].into_boxed_slice(),
            index: 0,
            offset: 0,
            stream_pos: 0,
            marks: Vec::new(),
            patch_window: None,
            encoding: TextEncoding::default(),
            _marker: core::marker::PhantomData,
        }
    }

    /// Set the text encoding used by string writes.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the text encoding used by string writes.
    pub fn set_encoding(&mut self, encoding: TextEncoding) {
        self.encoding = encoding;
    }

    /// Return the size of the internal buffer.
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Return the number of bytes flushed so far to the backend.
    pub fn stream_pos(&self) -> u64 {
        self.stream_pos
    }

    /// Pad the last byte with zeros, flush the buffer and the backend, and
    /// return the backend.
    pub fn finish(mut self) -> Result<W, CodecError> {
        BitWrite::<E>::align_to_byte(&mut self);
        BitWrite::<E>::flush(&mut self)?;
        self.backend.flush()?;
        Ok(self.backend)
    }

    /// Go back to the most recent checkpoint, let `f` overwrite the data
    /// there, and move again to the current position.
    ///
    /// This is the way to write a self-describing length that is known only
    /// after the data it describes: write a placeholder after
    /// [marking](Checkpoint::mark), write the data, and patch the
    /// placeholder.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidBacktrack`] if the checkpoint has already been
    /// flushed; a [`LengthMismatch`] if `f` tries to write past the current
    /// position, with the checkpoint, the space available and its excess
    /// (as a negative delta). The overrunning write does not happen, and
    /// nothing is flushed while `f` runs.
    ///
    /// # Example
    /// ```
    /// use swf_bitstream::prelude::*;
    ///
    /// let mut writer = <BufBitWriter<LE, _>>::new(Vec::new());
    /// writer.mark();
    /// writer.write_u16(0).unwrap();
    /// writer.write_bytes(b"payload").unwrap();
    /// let len = writer.bytes_since_mark().unwrap() as u16 - 2;
    /// writer.patch(|w| w.write_u16(len)).unwrap();
    /// writer.unmark().unwrap();
    /// assert_eq!(writer.finish().unwrap(), b"\x07\x00payload");
    /// ```
    pub fn patch<F>(&mut self, f: F) -> Result<(), CodecError>
    where
        F: FnOnce(&mut Self) -> Result<(), CodecError>,
    {
        let (index, offset) = (self.index, self.offset);
        self.rewind()?;
        let outer = self
            .patch_window
            .replace((self.index * 8, index * 8 + offset));
        let result = f(self);
        self.patch_window = outer;
        self.index = index;
        self.offset = offset;
        result
    }

    /// Fail if writing `n_bits` more bits would pass the end of the data
    /// being patched.
    #[inline(always)]
    fn check_patch_window(&self, n_bits: usize) -> Result<(), CodecError> {
        let Some((start, limit)) = self.patch_window else {
            return Ok(());
        };
        let end = self.index * 8 + self.offset + n_bits;
        if end <= limit {
            return Ok(());
        }
        let available = ((limit - start) / 8) as u64;
        Err(LengthMismatch {
            pos: self.stream_pos + (start / 8) as u64,
            expected: available,
            delta: available as i64 - bytes_for_bits(end.saturating_sub(start) as u64) as i64,
        }
        .into())
    }

    /// Move the cursor to the most recent checkpoint, keeping the data
    /// after it.
    fn rewind(&mut self) -> Result<(), CodecError> {
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

    /// Flush if fewer than `n_bytes` bytes (including the current one) are
    /// left in the buffer.
    #[inline(always)]
    fn reserve(&mut self, n_bytes: usize) -> Result<(), CodecError> {
        if self.index + n_bytes > self.buffer.len() {
            BitWrite::<E>::flush(self)?;
        }
        Ok(())
    }
}

impl<E: Endianness, W: Write> Checkpoint for BufBitWriter<E, W> {
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

    /// Move back to the most recent checkpoint.
    ///
    /// The data written after the checkpoint is discarded. Use
    /// [`BufBitWriter::patch`] to overwrite part of it instead.
    fn reset(&mut self) -> Result<(), CodecError> {
        self.rewind()?;
        self.buffer[self.index..].fill(0);
        Ok(())
    }

    #[inline]
    fn byte_pos(&self) -> u64 {
        self.stream_pos + self.index as u64
    }
}

impl<E: Endianness, W: Write> BitWrite<E> for BufBitWriter<E, W> {
    #[inline]
    fn write_bits(&mut self, value: u32, n_bits: usize) -> Result<(), CodecError> {
        if n_bits > MAX_FIELD_BITS {
            return Err(CodecError::InvalidWidth(n_bits));
        }
        if n_bits == 0 {
            return Ok(());
        }
        self.check_patch_window(n_bits)?;
        let n_bytes = (self.offset + n_bits).div_ceil(8);
        self.reserve(n_bytes)?;

        // align the field in a 64-bit window starting at the current byte
        let shift = 64 - self.offset - n_bits;
        let bits = ((value & low_mask(n_bits)) as u64) << shift;
        let mask = (low_mask(n_bits) as u64) << shift;
        for (i, byte) in self.buffer[self.index..self.index + n_bytes]
            .iter_mut()
            .enumerate()
        {
            let bit_shift = 56 - 8 * i;
            let byte_mask = (mask >> bit_shift) as u8;
            *byte = (*byte & !byte_mask) | (bits >> bit_shift) as u8;
        }

        let pos = self.index * 8 + self.offset + n_bits;
        self.index = pos >> 3;
        self.offset = pos & 7;
        Ok(())
    }

    #[inline]
    fn align_to_byte(&mut self) {
        if self.offset > 0 {
            self.index += 1;
            self.offset = 0;
        }
    }

    fn write_bytes(&mut self, mut bytes: &[u8]) -> Result<(), CodecError> {
        BitWrite::<E>::align_to_byte(self);
        self.check_patch_window(bytes.len() * 8)?;
        while !bytes.is_empty() {
            if self.index == self.buffer.len() {
                BitWrite::<E>::flush(self)?;
            }
            let len = (self.buffer.len() - self.index).min(bytes.len());
            self.buffer[self.index..self.index + len].copy_from_slice(&bytes[..len]);
            self.index += len;
            bytes = &bytes[len..];
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), CodecError> {
        // deferred until the patch ends
        if self.index == 0 || self.patch_window.is_some() {
            return Ok(());
        }
        self.backend.write_all(&self.buffer[..self.index])?;
        log::trace!(
            "flush: wrote {} bytes at byte {}",
            self.index,
            self.stream_pos
        );
        let mut carried = 0;
        if self.offset > 0 {
            self.buffer[0] = self.buffer[self.index];
            carried = 1;
        }
        self.buffer[carried..].fill(0);
        self.stream_pos += self.index as u64;
        self.index = 0;
        Ok(())
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
