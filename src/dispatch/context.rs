/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::collections::HashMap;

use crate::dispatch::Registry;
use crate::traits::Endianness;

/// Standard keys of [`Vars`].
///
/// Applications can use keys from [`USER`] on.
pub mod keys {
    /// The version of the movie being decoded or encoded.
    pub const VERSION: u32 = 1;
    /// The type code of the enclosing tag.
    pub const TAG_TYPE: u32 = 2;
    /// Whether colors have an alpha channel (nonzero) or not.
    pub const HAS_ALPHA: u32 = 3;
    /// The bit width of fill style indices in shape records.
    pub const FILL_BITS: u32 = 4;
    /// The bit width of line style indices in shape records.
    pub const LINE_BITS: u32 = 5;
    /// The shared bit width of a group of bit fields.
    pub const FIELD_BITS: u32 = 6;
    /// The first key free for applications.
    pub const USER: u32 = 1024;
}

/// A map from small integer keys to integer values, used by records to pass
/// parameters to the following records.
///
/// An absent key is different from a key with value zero: absent keys
/// usually mean that a default applies.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vars(HashMap<u32, i32>);

impl Vars {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the value of `key`, if present.
    #[inline]
    pub fn get(&self, key: u32) -> Option<i32> {
        self.0.get(&key).copied()
    }

    /// Return the value of `key`, or `default` if `key` is absent.
    #[inline]
    pub fn get_or(&self, key: u32, default: i32) -> i32 {
        self.get(key).unwrap_or(default)
    }

    /// Set the value of `key`, returning the previous value.
    #[inline]
    pub fn put(&mut self, key: u32, value: i32) -> Option<i32> {
        self.0.insert(key, value)
    }

    /// Remove `key`, returning its value.
    #[inline]
    pub fn remove(&mut self, key: u32) -> Option<i32> {
        self.0.remove(&key)
    }

    #[inline]
    pub fn contains(&self, key: u32) -> bool {
        self.0.contains_key(&key)
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The state shared by all records of a decoding pass: the active
/// [`Registry`] and a set of [`Vars`].
///
/// A context dereferences to its variables.
#[derive(Debug)]
pub struct Context<'r, E: Endianness, T> {
    registry: &'r Registry<E, T>,
    vars: Vars,
}

impl<'r, E: Endianness, T> Context<'r, E, T> {
    /// Create a context with no variables.
    pub fn new(registry: &'r Registry<E, T>) -> Self {
        Self::with_vars(registry, Vars::default())
    }

    pub fn with_vars(registry: &'r Registry<E, T>, vars: Vars) -> Self {
        Self { registry, vars }
    }

    /// Return the active registry.
    ///
    /// The returned reference does not borrow the context, so nested
    /// containers can be decoded by passing the context along:
    /// ```ignore
    /// ctx.registry().decode_until(Category::Movie, &mut children, reader, ctx, 0)?;
    /// ```
    #[inline(always)]
    pub fn registry(&self) -> &'r Registry<E, T> {
        self.registry
    }

    pub fn vars(&self) -> &Vars {
        &self.vars
    }

    pub fn vars_mut(&mut self) -> &mut Vars {
        &mut self.vars
    }

    pub fn into_vars(self) -> Vars {
        self.vars
    }
}

impl<E: Endianness, T> core::ops::Deref for Context<'_, E, T> {
    type Target = Vars;

    fn deref(&self) -> &Vars {
        &self.vars
    }
}

impl<E: Endianness, T> core::ops::DerefMut for Context<'_, E, T> {
    fn deref_mut(&mut self) -> &mut Vars {
        &mut self.vars
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::traits::LE;

    #[test]
    fn test_vars() {
        let mut vars = Vars::new();
        assert_eq!(vars.get(keys::HAS_ALPHA), None);
        assert_eq!(vars.get_or(keys::HAS_ALPHA, 1), 1);
        assert_eq!(vars.put(keys::HAS_ALPHA, 0), None);
        // zero is not absent
        assert_eq!(vars.get(keys::HAS_ALPHA), Some(0));
        assert_eq!(vars.get_or(keys::HAS_ALPHA, 1), 0);
        assert!(vars.contains(keys::HAS_ALPHA));
        assert_eq!(vars.put(keys::HAS_ALPHA, 1), Some(0));
        assert_eq!(vars.remove(keys::HAS_ALPHA), Some(1));
        assert!(vars.is_empty());
    }

    #[test]
    fn test_context() {
        let registry = Registry::<LE, ()>::new();
        let mut vars = Vars::new();
        vars.put(keys::VERSION, 8);
        let mut ctx = Context::with_vars(&registry, vars);
        assert_eq!(ctx.get(keys::VERSION), Some(8));
        ctx.put(keys::USER, -1);
        assert_eq!(ctx.vars().len(), 2);
        let vars = ctx.into_vars();
        assert_eq!(vars.get(keys::USER), Some(-1));
    }
}
