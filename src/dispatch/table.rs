/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Table-driven decoders based on function pointers.

use std::collections::BTreeMap;

use crate::codes::IntRead;
use crate::dispatch::{Category, Context, OpaqueRecord, RecordDecoder, RecordHeader};
use crate::error::CodecError;
use crate::tag::{EXTENDED_HEADER_LEN, TagHeader};
use crate::traits::*;

/// A function decoding the body of a record.
///
/// The header has already been consumed; if it declares a length, the
/// [`TableDecoder`] checks that the function consumes exactly that many
/// bytes.
pub type DecodeFn<E, T> =
    fn(&RecordHeader, &mut dyn BitRead<E>, &mut Context<'_, E, T>) -> Result<T, CodecError>;

/// The layout of record headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Framing {
    /// A [tag header](crate::tag).
    Tag,
    /// An 8-bit action code, followed by a 16-bit body length if the code is
    /// at least `0x80`; smaller codes have no body.
    Action,
    /// An 8-bit type code with no length: the decoding function must know
    /// where the record ends, so unknown type codes cannot be skipped.
    Code8,
}

/// What to do with type codes that are not in the table of a
/// [`TableDecoder`].
pub enum UnknownPolicy<T> {
    /// Skip the record, logging a warning.
    Skip,
    /// Keep the record as an [`OpaqueRecord`], wrapped by the given
    /// function.
    Keep(fn(OpaqueRecord) -> T),
    /// Return [`CodecError::UnknownRecord`].
    Error,
}

// manually implemented to avoid bounds on T
impl<T> Clone for UnknownPolicy<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for UnknownPolicy<T> {}

impl<T> core::fmt::Debug for UnknownPolicy<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UnknownPolicy::Skip => f.write_str("Skip"),
            UnknownPolicy::Keep(_) => f.write_str("Keep"),
            UnknownPolicy::Error => f.write_str("Error"),
        }
    }
}

/// A [`RecordDecoder`] reading headers with a given [`Framing`] and
/// dispatching type codes through a table of [`DecodeFn`].
///
/// Type codes missing from the table are handled by an [`UnknownPolicy`]
/// ([`UnknownPolicy::Error`] by default). With [`Framing::Code8`] the
/// length of unknown records is not known, so they are always an error.
pub struct TableDecoder<E: Endianness, T> {
    category: Category,
    framing: Framing,
    unknown: UnknownPolicy<T>,
    table: BTreeMap<u16, DecodeFn<E, T>>,
}

impl<E: Endianness, T> Clone for TableDecoder<E, T> {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            framing: self.framing,
            unknown: self.unknown,
            table: self.table.clone(),
        }
    }
}

impl<E: Endianness, T> core::fmt::Debug for TableDecoder<E, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TableDecoder")
            .field("category", &self.category)
            .field("framing", &self.framing)
            .field("unknown", &self.unknown)
            .field("type_codes", &self.table.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<E: Endianness, T> TableDecoder<E, T> {
    /// Create a decoder with an empty table.
    pub fn new(category: Category, framing: Framing) -> Self {
        Self {
            category,
            framing,
            unknown: UnknownPolicy::Error,
            table: BTreeMap::new(),
        }
    }

    /// Set the policy for unknown type codes.
    #[must_use]
    pub fn with_unknown(mut self, unknown: UnknownPolicy<T>) -> Self {
        self.unknown = unknown;
        self
    }

    /// Add a decoding function.
    #[must_use]
    pub fn with_decoder(mut self, type_code: u16, decode: DecodeFn<E, T>) -> Self {
        self.insert(type_code, decode);
        self
    }

    /// Add a decoding function, returning the one it replaces.
    pub fn insert(&mut self, type_code: u16, decode: DecodeFn<E, T>) -> Option<DecodeFn<E, T>> {
        self.table.insert(type_code, decode)
    }

    /// Remove a decoding function, so that the type code becomes unknown.
    pub fn remove(&mut self, type_code: u16) -> Option<DecodeFn<E, T>> {
        self.table.remove(&type_code)
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn unknown(&self) -> UnknownPolicy<T> {
        self.unknown
    }

    /// Read (consuming it) the header of the next record.
    fn read_header(&self, reader: &mut dyn BitRead<E>) -> Result<RecordHeader, CodecError> {
        Ok(match self.framing {
            Framing::Tag => {
                let header = TagHeader::read(reader)?;
                RecordHeader {
                    type_code: header.type_code,
                    length: Some(header.length),
                    header_len: header.header_len(),
                }
            }
            Framing::Action => {
                let code = reader.read_u8()?;
                if code >= 0x80 {
                    RecordHeader {
                        type_code: code as u16,
                        length: Some(reader.read_u16()? as u32),
                        header_len: 3,
                    }
                } else {
                    RecordHeader {
                        type_code: code as u16,
                        length: Some(0),
                        header_len: 1,
                    }
                }
            }
            Framing::Code8 => RecordHeader {
                type_code: reader.read_u8()? as u16,
                length: None,
                header_len: 1,
            },
        })
    }
}

/// Read a body of `length` bytes, growing the buffer as bytes arrive, so
/// that a corrupt length cannot cause a huge allocation.
fn read_body<E: Endianness>(
    reader: &mut dyn BitRead<E>,
    length: usize,
) -> Result<Vec<u8>, CodecError> {
    const CHUNK: usize = 4096;
    let mut data = Vec::with_capacity(length.min(CHUNK));
    let mut chunk = [0; CHUNK];
    let mut left = length;
    while left > 0 {
        let n = left.min(CHUNK);
        reader.read_bytes(&mut chunk[..n])?;
        data.extend_from_slice(&chunk[..n]);
        left -= n;
    }
    Ok(data)
}

impl<E: Endianness, T> RecordDecoder<E, T> for TableDecoder<E, T> {
    fn peek_header(&self, reader: &mut dyn BitRead<E>) -> Result<RecordHeader, CodecError> {
        Ok(match self.framing {
            Framing::Tag => {
                let header = TagHeader::peek(reader)?;
                RecordHeader {
                    type_code: header.type_code,
                    length: Some(header.length),
                    header_len: header.header_len(),
                }
            }
            Framing::Action => {
                let mut bytes = [0; 3];
                reader.peek_bytes(&mut bytes[..1])?;
                if bytes[0] >= 0x80 {
                    reader.peek_bytes(&mut bytes)?;
                    RecordHeader {
                        type_code: bytes[0] as u16,
                        length: Some(E::u16_from([bytes[1], bytes[2]]) as u32),
                        header_len: 3,
                    }
                } else {
                    RecordHeader {
                        type_code: bytes[0] as u16,
                        length: Some(0),
                        header_len: 1,
                    }
                }
            }
            Framing::Code8 => {
                let mut bytes = [0; 1];
                reader.peek_bytes(&mut bytes)?;
                RecordHeader {
                    type_code: bytes[0] as u16,
                    length: None,
                    header_len: 1,
                }
            }
        })
    }

    fn decode(
        &self,
        target: &mut Vec<T>,
        reader: &mut dyn BitRead<E>,
        ctx: &mut Context<'_, E, T>,
    ) -> Result<(), CodecError> {
        reader.align_to_byte();
        let pos = reader.byte_pos();
        let header = self.read_header(reader)?;
        let type_code = header.type_code;

        if let Some(decode) = self.table.get(&type_code) {
            log::trace!(
                "{} record {} at byte {} ({:?} bytes)",
                self.category,
                type_code,
                pos,
                header.length
            );
            let value = match header.length {
                Some(length) => {
                    reader.mark();
                    let result = decode(&header, reader, ctx)
                        .and_then(|value| reader.check(length as u64).map(|()| value));
                    reader.unmark()?;
                    result?
                }
                None => decode(&header, reader, ctx)?,
            };
            target.push(value);
            return Ok(());
        }

        match (self.unknown, header.length) {
            (UnknownPolicy::Skip, Some(length)) => {
                log::warn!(
                    "Skipping unknown {} record {} at byte {} ({} bytes)",
                    self.category,
                    type_code,
                    pos,
                    length
                );
                reader.skip_bytes(length as u64)
            }
            (UnknownPolicy::Keep(wrap), Some(length)) => {
                log::trace!(
                    "{} record {} at byte {} kept opaque ({} bytes)",
                    self.category,
                    type_code,
                    pos,
                    length
                );
                let data = read_body(reader, length as usize)?;
                target.push(wrap(OpaqueRecord {
                    framing: self.framing,
                    type_code,
                    extended: header.header_len == EXTENDED_HEADER_LEN,
                    data,
                }));
                Ok(())
            }
            _ => Err(CodecError::UnknownRecord {
                category: self.category,
                type_code,
                pos,
            }),
        }
    }
}
