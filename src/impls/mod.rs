/*
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Implementations of buffered bit streams.

[`BufBitReader`] wraps any [`std::io::Read`] and [`BufBitWriter`] wraps any
[`std::io::Write`]. Both have a statically selectable byte order, which
affects only multi-byte integers, and an internal byte buffer whose size can
be chosen at construction (it must be large enough to hold the longest
[peek](crate::traits::BitRead::peek_bytes) you need, and the data between a
[mark](crate::traits::Checkpoint::mark) and a
[reset](crate::traits::Checkpoint::reset)).

*/

mod buf_bit_reader;
pub use buf_bit_reader::{BufBitReader, DEFAULT_CAPACITY, MIN_CAPACITY};

mod buf_bit_writer;
pub use buf_bit_writer::BufBitWriter;
