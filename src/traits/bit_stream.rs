/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::error::{CodecError, LengthMismatch};
use crate::traits::*;
use crate::utils::TextEncoding;

/// A stack of absolute byte positions used to validate record lengths and
/// to backtrack.
///
/// Every record decoder and encoder follows the same protocol: it
/// [marks](Checkpoint::mark) the stream at the start of its body, reads or
/// writes its fields, [checks](Checkpoint::check) the number of bytes
/// consumed against the declared length, and finally
/// [unmarks](Checkpoint::unmark).
///
/// Marks are byte positions: a mark taken in the middle of a byte refers to
/// the start of that byte.
pub trait Checkpoint {
    /// Push the current byte position on the checkpoint stack.
    fn mark(&mut self);

    /// Pop the most recent checkpoint and return it.
    fn unmark(&mut self) -> Result<u64, CodecError>;

    /// Return the most recent checkpoint, if any.
    fn last_mark(&self) -> Option<u64>;

    /// Move the cursor back to the most recent checkpoint, leaving it on the
    /// stack.
    ///
    /// Buffered implementations fail with
    /// [`CodecError::InvalidBacktrack`] if the bytes at the checkpoint have
    /// already been discarded by a refill or a flush.
    fn reset(&mut self) -> Result<(), CodecError>;

    /// Return the current byte position from the start of the stream,
    /// ignoring the bit offset within the current byte.
    fn byte_pos(&self) -> u64;

    /// Return the number of bytes read or written since the most recent
    /// checkpoint.
    #[inline]
    fn bytes_since_mark(&self) -> Result<u64, CodecError> {
        let mark = self.last_mark().ok_or(CodecError::NoCheckpoint)?;
        Ok(self.byte_pos() - mark)
    }

    /// Check that exactly `expected` bytes have been read or written since
    /// the most recent checkpoint.
    ///
    /// On a mismatch the returned [`LengthMismatch`] carries the position of
    /// the checkpoint, the expected length and `expected - actual`.
    fn check(&self, expected: u64) -> Result<(), CodecError> {
        let pos = self.last_mark().ok_or(CodecError::NoCheckpoint)?;
        let actual = self.byte_pos() - pos;
        if actual != expected {
            return Err(LengthMismatch {
                pos,
                expected,
                delta: expected as i64 - actual as i64,
            }
            .into());
        }
        Ok(())
    }
}

/// Sequential, streaming bit-by-bit reads.
///
/// Bit fields are read starting from the most significant bit of each byte.
/// Multi-byte integers are assembled in the byte order `E`; their methods are
/// provided by [`IntRead`](crate::codes::IntRead) and the other extension
/// traits in [`codes`](crate::codes).
///
/// All byte-level methods first [align](BitRead::align_to_byte) the stream.
///
/// The trait is dyn-compatible, so that record decoders can be stored as
/// function pointers taking a `&mut dyn BitRead<E>`.
pub trait BitRead<E: Endianness>: Checkpoint {
    /// Read `n` bits (at most 32) and return them in the lowest bits.
    fn read_bits(&mut self, n: usize) -> Result<u32, CodecError>;

    /// Read `n` bits (at most 32) and sign-extend them.
    fn read_signed_bits(&mut self, n: usize) -> Result<i32, CodecError>;

    /// Return the next `n` bits (at most 32) without advancing the stream
    /// position.
    fn peek_bits(&mut self, n: usize) -> Result<u32, CodecError>;

    /// Skip `n` bits.
    fn skip_bits(&mut self, n: u64) -> Result<(), CodecError>;

    /// Discard the remaining bits of the current byte, if any.
    fn align_to_byte(&mut self);

    /// Fill `buf` with the next bytes of the stream.
    fn read_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError>;

    /// Fill `buf` with the next bytes of the stream without advancing the
    /// stream position. `buf` cannot be longer than the internal buffer.
    fn peek_bytes(&mut self, buf: &mut [u8]) -> Result<(), CodecError>;

    /// Skip `n` bytes.
    fn skip_bytes(&mut self, n: u64) -> Result<(), CodecError>;

    /// Read bytes up to the next zero byte, which is consumed but not
    /// included in the returned slice.
    fn read_until_nul(&mut self) -> Result<&[u8], CodecError>;

    /// Return whether no bytes are left, once the current byte is completed.
    fn eof(&mut self) -> Result<bool, CodecError>;

    /// Return the current position in bits from the start of the stream.
    fn bit_pos(&self) -> u64;

    /// Return the text encoding used by string reads.
    fn encoding(&self) -> TextEncoding;
}

/// Sequential, streaming bit-by-bit writes.
///
/// Bit fields are written starting from the most significant bit of each
/// byte. Multi-byte integers are written in the byte order `E` by
/// [`IntWrite`](crate::codes::IntWrite) and the other extension traits in
/// [`codes`](crate::codes).
pub trait BitWrite<E: Endianness>: Checkpoint {
    /// Write the lowest `n` bits (at most 32) of `value`.
    ///
    /// The other bits of `value` are ignored.
    fn write_bits(&mut self, value: u32, n: usize) -> Result<(), CodecError>;

    /// Write the lowest `n` bits (at most 32) of the two's complement
    /// representation of `value`.
    #[inline]
    fn write_signed_bits(&mut self, value: i32, n: usize) -> Result<(), CodecError> {
        self.write_bits(value as u32, n)
    }

    /// Pad the current byte with zeros, if it is partially written.
    fn align_to_byte(&mut self);

    /// Write all of `bytes`.
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError>;

    /// Write all complete bytes to the underlying sink.
    ///
    /// A partially written trailing byte is kept in the buffer.
    fn flush(&mut self) -> Result<(), CodecError>;

    /// Return the current position in bits from the start of the stream.
    fn bit_pos(&self) -> u64;

    /// Return the text encoding used by string writes.
    fn encoding(&self) -> TextEncoding;
}
