/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::codes::IntWrite;
use crate::dispatch::{Framing, Vars};
use crate::error::CodecError;
use crate::tag::{EXTENDED_HEADER_LEN, SHORT_HEADER_LEN, TagHeader, encode_tag};
use crate::traits::*;

/// Values that can be written to a stream.
///
/// Encoding happens in two passes. [`prepare`](Encode::prepare) computes
/// (and possibly caches) the lengths of the value and of its parts, so
/// that headers can be written before the data they describe;
/// [`encode`](Encode::encode) writes the value.
pub trait Encode<E: Endianness> {
    /// Prepare the value for encoding and return its length in bytes,
    /// header included.
    fn prepare(&mut self, vars: &mut Vars) -> usize;

    /// Write the value. [`prepare`](Encode::prepare) must have been called
    /// since the last modification.
    fn encode(&self, writer: &mut dyn BitWrite<E>, vars: &mut Vars) -> Result<(), CodecError>;
}

/// A record kept as its type code and body bytes, so that it can be written
/// back unchanged.
///
/// Decoders create opaque records for type codes they do not know when
/// configured with [`UnknownPolicy::Keep`](crate::dispatch::UnknownPolicy::Keep).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpaqueRecord {
    /// The framing of the record.
    pub framing: Framing,
    pub type_code: u16,
    /// Whether the header must be written in the extended form. Used only
    /// by the [tag framing](Framing::Tag).
    pub extended: bool,
    /// The body.
    pub data: Vec<u8>,
}

impl OpaqueRecord {
    /// Return a tag with the given body, using the shortest header.
    pub fn tag(type_code: u16, data: Vec<u8>) -> Self {
        let extended = TagHeader::new(type_code, data.len() as u32).extended;
        Self {
            framing: Framing::Tag,
            type_code,
            extended,
            data,
        }
    }

    /// Return an action with the given body.
    ///
    /// Actions with a code below `0x80` have no body, and bodies are at
    /// most [`u16::MAX`] bytes long: [`Encode::encode`] fails otherwise.
    pub fn action(code: u8, data: Vec<u8>) -> Self {
        Self {
            framing: Framing::Action,
            type_code: code as u16,
            extended: false,
            data,
        }
    }

    /// Return the length in bytes of the header of this record.
    pub fn header_len(&self) -> usize {
        match self.framing {
            Framing::Tag if self.extended => EXTENDED_HEADER_LEN,
            Framing::Tag => SHORT_HEADER_LEN,
            Framing::Action if self.type_code >= 0x80 => 3,
            Framing::Action | Framing::Code8 => 1,
        }
    }
}

impl<E: Endianness> Encode<E> for OpaqueRecord {
    fn prepare(&mut self, _vars: &mut Vars) -> usize {
        if self.framing == Framing::Tag {
            self.extended |= TagHeader::new(self.type_code, self.data.len() as u32).extended;
        }
        self.header_len() + self.data.len()
    }

    fn encode(&self, writer: &mut dyn BitWrite<E>, _vars: &mut Vars) -> Result<(), CodecError> {
        match self.framing {
            Framing::Tag => {
                let length = self.data.len() as u32;
                let header = if self.extended {
                    TagHeader::new_extended(self.type_code, length)
                } else {
                    TagHeader::new(self.type_code, length)
                };
                encode_tag(writer, header, |w| w.write_bytes(&self.data))
            }
            Framing::Action => {
                let code = u8::try_from(self.type_code)
                    .map_err(|_| CodecError::InvalidTypeCode(self.type_code as u32))?;
                let len = self.data.len();
                if code < 0x80 {
                    if len > 0 {
                        return Err(CodecError::InvalidActionBody { code, len });
                    }
                    return writer.write_u8(code);
                }
                let len16 = u16::try_from(len)
                    .map_err(|_| CodecError::InvalidActionBody { code, len })?;
                writer.write_u8(code)?;
                writer.write_u16(len16)?;
                writer.write_bytes(&self.data)
            }
            Framing::Code8 => {
                writer.write_u8(self.type_code as u8)?;
                writer.write_bytes(&self.data)
            }
        }
    }
}
