/*
 * SPDX-FileCopyrightText: 2025 Tommaso Fontana
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Programmable dispatch of heterogeneous records.
//!
//! Many parts of a movie are sequences of self-identifying records of
//! different kinds: the tags of a movie or of a sprite, the actions of a
//! script, the filters of an object, and so on. Every such sequence belongs
//! to a [`Category`], and a [`Registry`] holds one [`RecordDecoder`] per
//! category, which reads the next record of the sequence and appends the
//! corresponding value to a caller-supplied vector.
//!
//! # Decoders
//!
//! [`RecordDecoder`] is a dyn-compatible trait with two methods: one to
//! [peek](RecordDecoder::peek_header) at the header of the next record
//! without consuming it, and one to [decode](RecordDecoder::decode) the
//! record. Any implementation can be registered, but usually you will use a
//! [`TableDecoder`], which reads a header according to a [`Framing`], looks up
//! the type code in a table of [function pointers](DecodeFn), and applies an
//! [`UnknownPolicy`] to type codes that are not in the table: unknown records
//! can be skipped, kept as an [`OpaqueRecord`], or reported as an error.
//!
//! Bodies of records with a declared length are validated centrally: a
//! [`TableDecoder`] [marks](crate::traits::Checkpoint::mark) the stream
//! before calling the decoding function and
//! [checks](crate::traits::Checkpoint::check) the length afterwards.
//!
//! # Containers
//!
//! [`Registry::decode_until`] decodes records until a sentinel type code,
//! and [`Registry::decode_within`] decodes records filling a container of
//! known length, never reading past its end.
//!
//! # Configuration
//!
//! There is no global registry: [`Registry::standard`] returns a new registry
//! with the standard framings, which can be cloned and customized by
//! [registering](Registry::register) other decoders. Clones share decoders,
//! so cloning is cheap.
//!
//! A [`Context`] is passed to every decoding function: it contains a
//! reference to the active registry, so that decoders can decode nested
//! containers, and a set of [variables](Vars) that sibling records use to
//! communicate parameters.
//!
//! ```
//! use swf_bitstream::prelude::*;
//!
//! #[derive(Debug, PartialEq)]
//! enum Tag {
//!     ShowFrame,
//!     Other(OpaqueRecord),
//! }
//!
//! impl From<OpaqueRecord> for Tag {
//!     fn from(record: OpaqueRecord) -> Self {
//!         Tag::Other(record)
//!     }
//! }
//!
//! let mut registry = Registry::<LE, Tag>::standard();
//! registry.register(
//!     Category::Movie,
//!     TableDecoder::new(Category::Movie, Framing::Tag)
//!         .with_unknown(UnknownPolicy::Keep(Tag::from))
//!         .with_decoder(1, |_, _, _| Ok(Tag::ShowFrame)),
//! );
//!
//! // ShowFrame, SetBackgroundColor, End
//! let data = [0x40, 0x00, 0x43, 0x02, 0xFF, 0x80, 0x00, 0x00, 0x00];
//! let mut reader = <BufBitReader<LE, _>>::new(&data[..]);
//! let mut ctx = Context::new(&registry);
//! let mut tags = vec![];
//! registry
//!     .decode_until(Category::Movie, &mut tags, &mut reader, &mut ctx, 0)
//!     .unwrap();
//! assert_eq!(
//!     tags,
//!     [Tag::ShowFrame, Tag::Other(OpaqueRecord::tag(9, vec![0xFF, 0x80, 0x00]))]
//! );
//! assert!(reader.eof().unwrap());
//! ```

use core::fmt::{Display, Formatter};

use crate::error::CodecError;
use crate::traits::*;

mod context;
pub use context::*;

mod record;
pub use record::*;

mod registry;
pub use registry::*;

mod table;
pub use table::*;

/// The kinds of heterogeneous records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    /// Records of a shape outline.
    Shape,
    /// Fill styles.
    FillStyle,
    /// Fill styles of morph shapes.
    MorphFillStyle,
    /// Graphic filters.
    Filter,
    /// Actions of a script.
    Action,
    /// Tags of a movie or of a sprite.
    Movie,
}

impl Category {
    /// The number of categories.
    pub const COUNT: usize = 6;

    /// All categories, in the order of their indices.
    pub const ALL: [Category; Self::COUNT] = [
        Category::Shape,
        Category::FillStyle,
        Category::MorphFillStyle,
        Category::Filter,
        Category::Action,
        Category::Movie,
    ];

    /// Return the index of this category in [`Category::ALL`].
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn name(self) -> &'static str {
        match self {
            Category::Shape => "shape",
            Category::FillStyle => "fill style",
            Category::MorphFillStyle => "morph fill style",
            Category::Filter => "filter",
            Category::Action => "action",
            Category::Movie => "movie",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// The header of a record, as seen by a [`RecordDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "mem_dbg", derive(mem_dbg::MemDbg, mem_dbg::MemSize))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordHeader {
    /// The type code of the record.
    pub type_code: u16,
    /// The length in bytes of the body, if the framing declares it.
    pub length: Option<u32>,
    /// The length in bytes of the header.
    pub header_len: usize,
}

impl RecordHeader {
    /// Return the length in bytes of the whole record, if known.
    pub fn total_len(&self) -> Option<u64> {
        self.length.map(|length| self.header_len as u64 + length as u64)
    }
}

/// A decoder for the records of a [`Category`].
///
/// Implementations must be thread safe, as registries are shared.
pub trait RecordDecoder<E: Endianness, T>: Send + Sync {
    /// Return the header of the next record without consuming it.
    fn peek_header(&self, reader: &mut dyn BitRead<E>) -> Result<RecordHeader, CodecError>;

    /// Decode the next record, appending zero or one values to `target`.
    ///
    /// Skipped records append nothing.
    fn decode(
        &self,
        target: &mut Vec<T>,
        reader: &mut dyn BitRead<E>,
        ctx: &mut Context<'_, E, T>,
    ) -> Result<(), CodecError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_categories() {
        for (i, category) in Category::ALL.into_iter().enumerate() {
            assert_eq!(category.index(), i);
        }
        assert_eq!(Category::MorphFillStyle.to_string(), "morph fill style");
        let header = RecordHeader {
            type_code: 0x96,
            length: Some(5),
            header_len: 3,
        };
        assert_eq!(header.total_len(), Some(8));
        assert_eq!(RecordHeader { length: None, ..header }.total_len(), None);
    }
}
