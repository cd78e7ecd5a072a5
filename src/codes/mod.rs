/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Traits for reading and writing the numeric and textual fields of records.

Each kind of field is implemented as a pair of traits for reading and
writing (e.g., [`VarIntRead`] and [`VarIntWrite`]). The traits for reading
depend on [`BitRead`](crate::traits::BitRead), whereas the traits for
writing depend on [`BitWrite`](crate::traits::BitWrite), and both are
implemented for every reader and writer, including trait objects, so you
just need to pull them in scope (or import the
[prelude](crate::prelude)).

| Field | Width | Traits |
|-------|------:|--------|
| `u8`, `i8`, `u16`, `i16`, `u32`, `i32` | 8–32 | [`IntRead`], [`IntWrite`] |
| variable-length `u32` | 8–40 | [`VarIntRead`], [`VarIntWrite`] |
| half- and single-precision floats | 16, 32 | [`FloatRead`], [`FloatWrite`] |
| 8.8 and 16.16 fixed point | 16, 32 | [`FloatRead`], [`FloatWrite`] |
| fixed-length and null-terminated strings | | [`StringRead`], [`StringWrite`] |

All fields in this module are byte aligned. Bit fields are read and written
directly by [`BitRead::read_bits`](crate::traits::BitRead::read_bits) and
[`BitWrite::write_bits`](crate::traits::BitWrite::write_bits), and their
widths are computed by the functions in [`utils`](crate::utils).

*/

pub mod ints;
pub use ints::{IntRead, IntWrite};

pub mod var_int;
pub use var_int::{len_var_u32, VarIntRead, VarIntWrite, MAX_VAR_INT_BYTES};

pub mod float;
pub use float::{f32_to_half, half_to_f32, FloatRead, FloatWrite};

pub mod string;
pub use string::{len_string, StringRead, StringWrite};
