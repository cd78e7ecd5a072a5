/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::sync::Arc;

use crate::dispatch::*;
use crate::error::{CodecError, LengthMismatch};

/// A table of [`RecordDecoder`], one per [`Category`].
///
/// Registries are plain values: there is no global instance. Clones share
/// their decoders, so a decoding pass needing a different decoder for some
/// category can clone a registry and [register](Registry::register) the
/// decoder on the clone.
pub struct Registry<E: Endianness, T> {
    decoders: [Option<Arc<dyn RecordDecoder<E, T>>>; Category::COUNT],
}

impl<E: Endianness, T> Clone for Registry<E, T> {
    fn clone(&self) -> Self {
        Self {
            decoders: self.decoders.clone(),
        }
    }
}

impl<E: Endianness, T> core::fmt::Debug for Registry<E, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_set()
            .entries(
                Category::ALL
                    .into_iter()
                    .filter(|category| self.decoders[category.index()].is_some()),
            )
            .finish()
    }
}

impl<E: Endianness, T: From<OpaqueRecord> + 'static> Default for Registry<E, T> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<E: Endianness, T> Registry<E, T> {
    /// Create a registry with no decoders.
    pub fn new() -> Self {
        Self {
            decoders: Default::default(),
        }
    }

    /// Create a registry with [table decoders](TableDecoder) with empty
    /// tables and the standard framings: tags for [`Category::Movie`],
    /// actions for [`Category::Action`], and 8-bit type codes for
    /// [`Category::FillStyle`], [`Category::MorphFillStyle`] and
    /// [`Category::Filter`].
    ///
    /// Unknown tags and actions are kept as [`OpaqueRecord`], so that a
    /// movie can be written back unchanged; unknown styles and filters are
    /// an error, as their length is unknown.
    ///
    /// There is no standard decoder for [`Category::Shape`], whose records
    /// are not byte aligned.
    pub fn standard() -> Self
    where
        T: From<OpaqueRecord> + 'static,
    {
        let mut registry = Self::new();
        registry.register(
            Category::Movie,
            TableDecoder::new(Category::Movie, Framing::Tag)
                .with_unknown(UnknownPolicy::Keep(T::from)),
        );
        registry.register(
            Category::Action,
            TableDecoder::new(Category::Action, Framing::Action)
                .with_unknown(UnknownPolicy::Keep(T::from)),
        );
        for category in [
            Category::FillStyle,
            Category::MorphFillStyle,
            Category::Filter,
        ] {
            registry.register(category, TableDecoder::new(category, Framing::Code8));
        }
        registry
    }

    /// Set the decoder of `category`, returning the previous one.
    pub fn register(
        &mut self,
        category: Category,
        decoder: impl RecordDecoder<E, T> + 'static,
    ) -> Option<Arc<dyn RecordDecoder<E, T>>> {
        self.decoders[category.index()].replace(Arc::new(decoder))
    }

    /// Set the decoder of `category`, sharing it with other registries.
    pub fn register_shared(
        &mut self,
        category: Category,
        decoder: Arc<dyn RecordDecoder<E, T>>,
    ) -> Option<Arc<dyn RecordDecoder<E, T>>> {
        self.decoders[category.index()].replace(decoder)
    }

    /// Remove the decoder of `category`.
    pub fn remove(&mut self, category: Category) -> Option<Arc<dyn RecordDecoder<E, T>>> {
        self.decoders[category.index()].take()
    }

    /// Return the decoder of `category`.
    pub fn get(&self, category: Category) -> Option<&Arc<dyn RecordDecoder<E, T>>> {
        self.decoders[category.index()].as_ref()
    }

    /// Return the decoder of `category`, or [`CodecError::NoDecoder`].
    pub fn decoder(&self, category: Category) -> Result<&dyn RecordDecoder<E, T>, CodecError> {
        self.decoders[category.index()]
            .as_deref()
            .ok_or(CodecError::NoDecoder(category))
    }

    /// Return the header of the next record of `category` without consuming
    /// it.
    pub fn peek(
        &self,
        category: Category,
        reader: &mut dyn BitRead<E>,
    ) -> Result<RecordHeader, CodecError> {
        self.decoder(category)?.peek_header(reader)
    }

    /// Decode the next record of `category`, appending its value (if any) to
    /// `target`.
    pub fn decode_next(
        &self,
        category: Category,
        target: &mut Vec<T>,
        reader: &mut dyn BitRead<E>,
        ctx: &mut Context<'_, E, T>,
    ) -> Result<(), CodecError> {
        self.decoder(category)?.decode(target, reader, ctx)
    }

    /// Decode records of `category` until a record with type code
    /// `sentinel`, which is consumed but not decoded.
    ///
    /// Return the number of records consumed, including skipped ones.
    pub fn decode_until(
        &self,
        category: Category,
        target: &mut Vec<T>,
        reader: &mut dyn BitRead<E>,
        ctx: &mut Context<'_, E, T>,
        sentinel: u16,
    ) -> Result<usize, CodecError> {
        let decoder = self.decoder(category)?;
        log::debug!(
            "Decoding {} records at byte {} until type code {}",
            category,
            reader.byte_pos(),
            sentinel
        );
        let mut count = 0;
        loop {
            let header = decoder.peek_header(reader)?;
            if header.type_code == sentinel {
                reader.skip_bytes(header.total_len().unwrap_or(header.header_len as u64))?;
                break;
            }
            decoder.decode(target, reader, ctx)?;
            count += 1;
        }
        log::debug!(
            "Decoded {} {} records, ending at byte {}",
            count,
            category,
            reader.byte_pos()
        );
        Ok(count)
    }

    /// Decode records of `category` filling the next `length` bytes.
    ///
    /// If the declared length of a record would overrun the container, the
    /// rest of the container is skipped with a warning, so decoding stops
    /// exactly at its end. If a record of unknown length overruns the
    /// container, the result is a [`LengthMismatch`] for the container.
    ///
    /// Return the number of records consumed, including skipped ones.
    pub fn decode_within(
        &self,
        category: Category,
        target: &mut Vec<T>,
        reader: &mut dyn BitRead<E>,
        ctx: &mut Context<'_, E, T>,
        length: u32,
    ) -> Result<usize, CodecError> {
        let decoder = self.decoder(category)?;
        reader.align_to_byte();
        let start = reader.byte_pos();
        let end = start + length as u64;
        log::debug!(
            "Decoding {} records in bytes [{}..{})",
            category,
            start,
            end
        );

        let mut count = 0;
        loop {
            let pos = reader.byte_pos();
            if pos >= end {
                break;
            }
            let remaining = end - pos;
            let header = match decoder.peek_header(reader) {
                Ok(header) => header,
                Err(e) if e.is_eof() => {
                    // a header might not fit in the last bytes of the stream
                    log::warn!(
                        "Truncated {} record at byte {}: skipping the last {} bytes of the container",
                        category,
                        pos,
                        remaining
                    );
                    reader.skip_bytes(remaining)?;
                    break;
                }
                Err(e) => return Err(e),
            };
            match header.total_len() {
                Some(total) if total > remaining => {
                    log::warn!(
                        "{} record {} at byte {} overruns its container by {} bytes: skipping the last {} bytes of the container",
                        category,
                        header.type_code,
                        pos,
                        total - remaining,
                        remaining
                    );
                    reader.skip_bytes(remaining)?;
                    break;
                }
                _ => {}
            }
            decoder.decode(target, reader, ctx)?;
            count += 1;
        }

        let consumed = reader.byte_pos() - start;
        if consumed != length as u64 {
            return Err(LengthMismatch {
                pos: start,
                expected: length as u64,
                delta: length as i64 - consumed as i64,
            }
            .into());
        }
        log::debug!("Decoded {} {} records", count, category);
        Ok(count)
    }
}
