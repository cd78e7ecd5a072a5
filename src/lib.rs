/*
 * SPDX-FileCopyrightText: 2025 Inria
 * SPDX-FileCopyrightText: 2025 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]

pub mod codes;
pub mod dispatch;
pub mod error;
pub mod impls;
pub mod movie;
pub mod tag;
pub mod traits;
pub mod utils;

#[cfg(feature = "fuzz")]
pub mod fuzz;

/// Prelude module to import everything from this crate
pub mod prelude {
    pub use crate::codes::*;
    pub use crate::dispatch::*;
    pub use crate::error::*;
    pub use crate::impls::*;
    pub use crate::movie::*;
    pub use crate::tag::*;
    pub use crate::traits::*;
    pub use crate::utils::*;
}
