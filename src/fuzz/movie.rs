/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::prelude::*;

/// Decode arbitrary bytes as a movie; movies that decode must survive an
/// encoding round trip.
pub fn harness(data: &[u8]) {
    let registry = Registry::<LE, OpaqueRecord>::standard();
    let Ok(mut movie) = Movie::decode(data, &registry) else {
        return;
    };
    let encoded = movie.encode(Vec::new()).unwrap();
    let decoded = Movie::decode(&encoded[..], &registry).unwrap();
    assert_eq!(decoded.header.length as usize, encoded_len(&movie, &encoded));
    assert_eq!(decoded.header.frame_size, movie.header.frame_size);
    assert_eq!(decoded.header.frame_count, movie.header.frame_count);
    assert_eq!(decoded.records, movie.records);
}

fn encoded_len(movie: &Movie<OpaqueRecord>, encoded: &[u8]) -> usize {
    match movie.header.signature {
        Signature::Uncompressed => encoded.len(),
        Signature::Zlib => movie.header.length as usize,
    }
}
