/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/// Inner private trait used to make implementing [`Endianness`]
/// impossible for other structs.
mod private {
    /// This is a [SealedTrait](https://predr.ag/blog/definitive-guide-to-sealed-traits-in-rust/).
    pub trait Endianness: 'static {
        fn u16_from_bytes(bytes: [u8; 2]) -> u16;
        fn u32_from_bytes(bytes: [u8; 4]) -> u32;
        fn u16_to_bytes(value: u16) -> [u8; 2];
        fn u32_to_bytes(value: u32) -> [u8; 4];
    }
}

/// Marker trait for byte-order selector types.
///
/// Its only implementations are [`LittleEndian`] and [`BigEndian`].
///
/// The byte order applies to multi-byte integers only: bit fields are
/// always packed starting from the most significant bit of each byte.
/// Standard movie files are little endian.
pub trait Endianness: private::Endianness + core::fmt::Debug + Send + Sync {
    /// The name of the byte order.
    const NAME: &'static str;

    /// Assemble an unsigned 16-bit integer from its bytes in stream order.
    #[inline(always)]
    fn u16_from(bytes: [u8; 2]) -> u16 {
        <Self as private::Endianness>::u16_from_bytes(bytes)
    }

    /// Assemble an unsigned 32-bit integer from its bytes in stream order.
    #[inline(always)]
    fn u32_from(bytes: [u8; 4]) -> u32 {
        <Self as private::Endianness>::u32_from_bytes(bytes)
    }

    /// Split an unsigned 16-bit integer into its bytes in stream order.
    #[inline(always)]
    fn u16_bytes(value: u16) -> [u8; 2] {
        <Self as private::Endianness>::u16_to_bytes(value)
    }

    /// Split an unsigned 32-bit integer into its bytes in stream order.
    #[inline(always)]
    fn u32_bytes(value: u32) -> [u8; 4] {
        <Self as private::Endianness>::u32_to_bytes(value)
    }
}

/// Selector type for little-endian streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LittleEndian;

/// Selector type for big-endian streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BigEndian;

/// Alias for [`BigEndian`]
pub type BE = BigEndian;

/// Alias for [`LittleEndian`]
pub type LE = LittleEndian;

impl private::Endianness for LittleEndian {
    #[inline(always)]
    fn u16_from_bytes(bytes: [u8; 2]) -> u16 {
        u16::from_le_bytes(bytes)
    }
    #[inline(always)]
    fn u32_from_bytes(bytes: [u8; 4]) -> u32 {
        u32::from_le_bytes(bytes)
    }
    #[inline(always)]
    fn u16_to_bytes(value: u16) -> [u8; 2] {
        value.to_le_bytes()
    }
    #[inline(always)]
    fn u32_to_bytes(value: u32) -> [u8; 4] {
        value.to_le_bytes()
    }
}

impl private::Endianness for BigEndian {
    #[inline(always)]
    fn u16_from_bytes(bytes: [u8; 2]) -> u16 {
        u16::from_be_bytes(bytes)
    }
    #[inline(always)]
    fn u32_from_bytes(bytes: [u8; 4]) -> u32 {
        u32::from_be_bytes(bytes)
    }
    #[inline(always)]
    fn u16_to_bytes(value: u16) -> [u8; 2] {
        value.to_be_bytes()
    }
    #[inline(always)]
    fn u32_to_bytes(value: u32) -> [u8; 4] {
        value.to_be_bytes()
    }
}

impl Endianness for LittleEndian {
    const NAME: &'static str = "little";
}

impl Endianness for BigEndian {
    const NAME: &'static str = "big";
}
