/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Whole movies.
//!
//! A movie starts with an 8-byte prefix containing a [`Signature`], a
//! version, and the length of the uncompressed file. The rest of the file,
//! possibly compressed with zlib, contains the remaining fields of the
//! [`MovieHeader`] followed by a sequence of [tags](crate::tag) terminated
//! by an End tag (type code zero).
//!
//! Movies are always little endian.
//!
//! ```
//! use swf_bitstream::prelude::*;
//!
//! let mut movie = Movie {
//!     header: MovieHeader::new(Signature::Zlib, 10, Bounds::new(0, 11000, 0, 8000), 24.0),
//!     records: vec![OpaqueRecord::tag(9, vec![0xFF, 0xFF, 0xFF]), OpaqueRecord::tag(1, vec![])],
//! };
//! let data = movie.encode(Vec::new()).unwrap();
//! assert_eq!(&data[..3], b"CWS");
//!
//! let registry = Registry::<LE, OpaqueRecord>::standard();
//! let decoded = Movie::decode(&data[..], &registry).unwrap();
//! assert_eq!(decoded, movie);
//! ```

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;

use crate::codes::{FloatRead, FloatWrite, IntRead, IntWrite};
use crate::dispatch::{Category, Context, Encode, Registry, Vars, keys};
use crate::error::CodecError;
use crate::impls::{BufBitReader, BufBitWriter};
use crate::tag::{SHORT_HEADER_LEN, TagHeader};
use crate::traits::*;
use crate::utils::{bytes_for_bits, low_mask, max_size};

/// The length in bytes of the uncompressed prefix of a movie.
pub const PREFIX_LEN: usize = 8;

/// The width in bits of the field storing the width of the fields of a
/// [`Bounds`].
const BOUNDS_WIDTH_BITS: usize = 5;

/// The first three bytes of a movie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Signature {
    /// `FWS`: the body is stored as is.
    Uncompressed,
    /// `CWS`: the body is compressed with zlib.
    Zlib,
}

impl Signature {
    pub const fn bytes(self) -> [u8; 3] {
        match self {
            Signature::Uncompressed => *b"FWS",
            Signature::Zlib => *b"CWS",
        }
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Result<Self, CodecError> {
        match &bytes {
            b"FWS" => Ok(Signature::Uncompressed),
            b"CWS" => Ok(Signature::Zlib),
            _ => Err(CodecError::InvalidSignature(bytes)),
        }
    }
}

/// A rectangle in twips.
///
/// On the wire, a 5-bit width is followed by the four coordinates, stored
/// as signed bit fields of that width. The whole structure is byte aligned
/// at both ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl Bounds {
    pub const fn new(min_x: i32, max_x: i32, min_y: i32, max_y: i32) -> Self {
        Self {
            min_x,
            max_x,
            min_y,
            max_y,
        }
    }

    fn coords(&self) -> [i32; 4] {
        [self.min_x, self.max_x, self.min_y, self.max_y]
    }

    /// Return the width in bits of the coordinate fields.
    pub fn field_bits(&self) -> usize {
        max_size(&self.coords())
    }

    /// Return the length in bytes of the encoded rectangle.
    pub fn encoded_len(&self) -> usize {
        bytes_for_bits((BOUNDS_WIDTH_BITS + 4 * self.field_bits()) as u64) as usize
    }

    pub fn read<E: Endianness, R: BitRead<E> + ?Sized>(
        reader: &mut R,
    ) -> Result<Self, CodecError> {
        reader.align_to_byte();
        let n_bits = reader.read_bits(BOUNDS_WIDTH_BITS)? as usize;
        let mut coords = [0; 4];
        for coord in &mut coords {
            *coord = reader.read_signed_bits(n_bits)?;
        }
        reader.align_to_byte();
        let [min_x, max_x, min_y, max_y] = coords;
        Ok(Self::new(min_x, max_x, min_y, max_y))
    }

    /// Write the rectangle.
    ///
    /// # Errors
    ///
    /// [`CodecError::InvalidWidth`] if a coordinate needs 32 bits, as the
    /// width field holds at most 31.
    pub fn write<E: Endianness, W: BitWrite<E> + ?Sized>(
        &self,
        writer: &mut W,
    ) -> Result<(), CodecError> {
        let n_bits = self.field_bits();
        if n_bits > low_mask(BOUNDS_WIDTH_BITS) as usize {
            return Err(CodecError::InvalidWidth(n_bits));
        }
        writer.align_to_byte();
        writer.write_bits(n_bits as u32, BOUNDS_WIDTH_BITS)?;
        for coord in self.coords() {
            writer.write_signed_bits(coord, n_bits)?;
        }
        writer.align_to_byte();
        Ok(())
    }
}

/// The header of a movie.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovieHeader {
    pub signature: Signature,
    pub version: u8,
    /// The length in bytes of the uncompressed file, prefix included.
    ///
    /// Recomputed by [`Movie::encode`].
    pub length: u32,
    /// The size of the stage.
    pub frame_size: Bounds,
    /// Frames per second, as an 8.8 fixed-point number.
    pub frame_rate: f32,
    pub frame_count: u16,
}

impl MovieHeader {
    /// Create a header for a movie with no frames.
    pub fn new(signature: Signature, version: u8, frame_size: Bounds, frame_rate: f32) -> Self {
        Self {
            signature,
            version,
            length: 0,
            frame_size,
            frame_rate,
            frame_count: 0,
        }
    }

    /// Return the length in bytes of the header, prefix included.
    pub fn header_len(&self) -> usize {
        PREFIX_LEN + self.frame_size.encoded_len() + 4
    }
}

/// A movie: a header and a sequence of top-level records.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Movie<T> {
    pub header: MovieHeader,
    /// The records of the movie, without the final End tag.
    pub records: Vec<T>,
}

impl<T> Movie<T> {
    /// Read a movie, decoding its tags with the [`Category::Movie`] decoder
    /// of `registry`.
    ///
    /// The version of the movie is available to decoders under
    /// [`keys::VERSION`]. Bytes after the End tag are ignored.
    pub fn decode<R: Read>(mut source: R, registry: &Registry<LE, T>) -> Result<Self, CodecError> {
        let mut prefix = [0; PREFIX_LEN];
        source.read_exact(&mut prefix)?;
        let signature = Signature::from_bytes([prefix[0], prefix[1], prefix[2]])?;
        let version = prefix[3];
        let length = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);
        log::debug!(
            "Movie {:?}, version {}, {} bytes",
            signature,
            version,
            length
        );
        match signature {
            Signature::Uncompressed => {
                Self::decode_body(signature, version, length, source, registry)
            }
            Signature::Zlib => {
                Self::decode_body(signature, version, length, ZlibDecoder::new(source), registry)
            }
        }
    }

    fn decode_body<R: Read>(
        signature: Signature,
        version: u8,
        length: u32,
        body: R,
        registry: &Registry<LE, T>,
    ) -> Result<Self, CodecError> {
        let mut reader = <BufBitReader<LE, _>>::new(body);
        let frame_size = Bounds::read(&mut reader)?;
        let frame_rate = reader.read_fixed8()?;
        let frame_count = reader.read_u16()?;

        let mut ctx = Context::new(registry);
        ctx.put(keys::VERSION, version as i32);
        let mut records = vec![];
        registry.decode_until(Category::Movie, &mut records, &mut reader, &mut ctx, 0)?;

        let end = PREFIX_LEN as u64 + reader.byte_pos();
        if end != length as u64 {
            log::warn!(
                "Movie declares {} bytes but ends at byte {}",
                length,
                end
            );
        }
        Ok(Self {
            header: MovieHeader {
                signature,
                version,
                length,
                frame_size,
                frame_rate,
                frame_count,
            },
            records,
        })
    }
}

impl<T: Encode<LE>> Movie<T> {
    /// Prepare the records, update the length in the header, and write the
    /// movie to `sink`, which is returned.
    ///
    /// The version of the movie is available to encoders under
    /// [`keys::VERSION`].
    pub fn encode<W: Write>(&mut self, mut sink: W) -> Result<W, CodecError> {
        let mut vars = Vars::new();
        vars.put(keys::VERSION, self.header.version as i32);
        let records_len: usize = self
            .records
            .iter_mut()
            .map(|record| record.prepare(&mut vars))
            .sum();
        let length = self.header.header_len() + records_len + SHORT_HEADER_LEN;
        self.header.length = u32::try_from(length).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("A movie of {length} bytes is too long"),
            )
        })?;
        log::debug!(
            "Encoding movie {:?}, version {}, {} records, {} bytes",
            self.header.signature,
            self.header.version,
            self.records.len(),
            length
        );

        let mut prefix = [0; PREFIX_LEN];
        prefix[..3].copy_from_slice(&self.header.signature.bytes());
        prefix[3] = self.header.version;
        prefix[4..].copy_from_slice(&self.header.length.to_le_bytes());
        sink.write_all(&prefix)?;

        match self.header.signature {
            Signature::Uncompressed => self.encode_body(sink, vars),
            Signature::Zlib => Ok(self
                .encode_body(ZlibEncoder::new(sink, Compression::default()), vars)?
                .finish()?),
        }
    }

    fn encode_body<W: Write>(&self, body: W, mut vars: Vars) -> Result<W, CodecError> {
        let mut writer = <BufBitWriter<LE, _>>::new(body);
        self.header.frame_size.write(&mut writer)?;
        writer.write_fixed8(self.header.frame_rate)?;
        writer.write_u16(self.header.frame_count)?;
        for record in &self.records {
            record.encode(&mut writer, &mut vars)?;
        }
        TagHeader::new(0, 0).write(&mut writer)?;
        writer.finish()
    }
}
