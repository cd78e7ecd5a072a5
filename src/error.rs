/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Errors returned by streams, codes and decoders.

use crate::dispatch::Category;
use crate::utils::TextEncoding;
#[cfg(feature = "mem_dbg")]
use mem_dbg::{MemDbg, MemSize};

/// A disagreement between the length declared by a record and the number of
/// bytes actually read or written since the matching
/// [mark](crate::traits::Checkpoint::mark).
///
/// `delta` is `expected - actual`: a positive value means that fewer bytes
/// than declared were consumed, a negative value means that the record
/// overran its declared length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "mem_dbg", derive(MemDbg, MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error(
    "Length mismatch for the record at byte {pos}: expected {expected} bytes, delta {delta}"
)]
pub struct LengthMismatch {
    /// The byte position of the checkpoint.
    pub pos: u64,
    /// The declared length in bytes.
    pub expected: u64,
    /// The expected length minus the actual length.
    pub delta: i64,
}

impl LengthMismatch {
    /// The number of bytes actually consumed or produced.
    pub fn actual(&self) -> u64 {
        (self.expected as i64 - self.delta) as u64
    }
}

/// The error type of every fallible operation of this crate.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Unexpected end of stream at bit {bit_pos}: {requested} bits requested, {available} available")]
    UnexpectedEof {
        bit_pos: u64,
        requested: u64,
        available: u64,
    },

    #[error(transparent)]
    LengthMismatch(#[from] LengthMismatch),

    #[error("Cannot go back to byte {target}: data before byte {discarded} has been discarded")]
    InvalidBacktrack { target: u64, discarded: u64 },

    #[error("No checkpoint has been marked")]
    NoCheckpoint,

    #[error("The number of bits has to be in [0, 32] and {0} is not")]
    InvalidWidth(usize),

    #[error("Variable-length integer at byte {pos} does not fit in 32 bits")]
    VarIntOverflow { pos: u64 },

    #[error("Type code {0} does not fit in 10 bits")]
    InvalidTypeCode(u32),

    #[error("Action {code:#04x} cannot have a body of {len} bytes")]
    InvalidActionBody { code: u8, len: usize },

    #[error("Unknown {category} record with type code {type_code} at byte {pos}")]
    UnknownRecord {
        category: Category,
        type_code: u16,
        pos: u64,
    },

    #[error("No decoder is registered for {0} records")]
    NoDecoder(Category),

    #[error("Invalid {encoding} text at byte {pos}")]
    InvalidText { encoding: TextEncoding, pos: u64 },

    #[error("Unknown text encoding {0:?}")]
    UnknownEncoding(String),

    #[error("Invalid movie signature {0:?}")]
    InvalidSignature([u8; 3]),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Return the length mismatch carried by this error, if any.
    pub fn length_mismatch(&self) -> Option<&LengthMismatch> {
        match self {
            CodecError::LengthMismatch(mismatch) => Some(mismatch),
            _ => None,
        }
    }

    /// Whether this error signals that the source ran out of data.
    pub fn is_eof(&self) -> bool {
        match self {
            CodecError::UnexpectedEof { .. } => true,
            CodecError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}
