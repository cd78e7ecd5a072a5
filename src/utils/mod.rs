/*
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Helpers: bit arithmetic, text encodings and debug wrappers.

The functions in [`bits`] compute the minimum widths of bit fields.

[`TextEncoding`] is the character encoding of strings.

[`DbgBitReader`] and [`DbgBitWriter`] log at trace level all operations
performed by a [`BitRead`](crate::traits::BitRead) or
[`BitWrite`](crate::traits::BitWrite).

*/

pub mod bits;
pub use bits::*;

mod text;
pub use text::TextEncoding;

mod dbg;
pub use dbg::*;
