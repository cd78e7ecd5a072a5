/*
 * SPDX-FileCopyrightText: 2025 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use core::fmt::{Display, Formatter};
use core::str::FromStr;

use crate::error::CodecError;

/// The character encoding of strings.
///
/// Movies from version 6 on store text in UTF-8; older movies use a
/// single-byte encoding, approximated here by ISO-8859-1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl TextEncoding {
    /// Return the canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "UTF-8",
            TextEncoding::Latin1 => "ISO-8859-1",
        }
    }

    /// Decode `bytes`; `pos` is the stream position of the first byte, used
    /// for error reporting.
    pub fn decode(&self, bytes: &[u8], pos: u64) -> Result<String, CodecError> {
        match self {
            TextEncoding::Utf8 => match core::str::from_utf8(bytes) {
                Ok(text) => Ok(text.to_owned()),
                Err(e) => Err(CodecError::InvalidText {
                    encoding: *self,
                    pos: pos + e.valid_up_to() as u64,
                }),
            },
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| b as char).collect()),
        }
    }

    /// Encode `text`, appending the bytes to `out`.
    ///
    /// Characters that cannot be represented in ISO-8859-1 are an error.
    pub fn encode(&self, text: &str, out: &mut Vec<u8>) -> Result<(), CodecError> {
        match self {
            TextEncoding::Utf8 => out.extend_from_slice(text.as_bytes()),
            TextEncoding::Latin1 => {
                for (i, c) in text.chars().enumerate() {
                    let code = u32::from(c);
                    if code > 0xFF {
                        return Err(CodecError::InvalidText {
                            encoding: *self,
                            pos: i as u64,
                        });
                    }
                    out.push(code as u8);
                }
            }
        }
        Ok(())
    }

    /// Return the number of bytes of the encoded form of `text`, without the
    /// terminating zero.
    pub fn encoded_len(&self, text: &str) -> usize {
        match self {
            TextEncoding::Utf8 => text.len(),
            TextEncoding::Latin1 => text.chars().count(),
        }
    }
}

impl Display for TextEncoding {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = CodecError;

    /// Parse an encoding name, ignoring case and punctuation.
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let normalized: String = name
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "utf8" => Ok(TextEncoding::Utf8),
            "latin1" | "iso88591" | "l1" => Ok(TextEncoding::Latin1),
            _ => Err(CodecError::UnknownEncoding(name.to_owned())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names() -> anyhow::Result<()> {
        assert_eq!("UTF-8".parse::<TextEncoding>()?, TextEncoding::Utf8);
        assert_eq!("utf8".parse::<TextEncoding>()?, TextEncoding::Utf8);
        assert_eq!("ISO-8859-1".parse::<TextEncoding>()?, TextEncoding::Latin1);
        assert_eq!("Latin-1".parse::<TextEncoding>()?, TextEncoding::Latin1);
        assert!("Shift_JIS".parse::<TextEncoding>().is_err());
        assert_eq!(TextEncoding::default().to_string(), "UTF-8");
        Ok(())
    }

    #[test]
    fn test_latin1() -> anyhow::Result<()> {
        let mut out = vec![];
        TextEncoding::Latin1.encode("caffè", &mut out)?;
        assert_eq!(out, b"caff\xe8");
        assert_eq!(TextEncoding::Latin1.encoded_len("caffè"), 5);
        assert_eq!(TextEncoding::Utf8.encoded_len("caffè"), 6);
        assert_eq!(TextEncoding::Latin1.decode(&out, 0)?, "caffè");
        assert!(TextEncoding::Latin1.encode("€", &mut out).is_err());
        Ok(())
    }

    #[test]
    fn test_invalid_utf8() {
        let err = TextEncoding::Utf8.decode(b"ab\xff", 10).unwrap_err();
        match err {
            CodecError::InvalidText { pos, .. } => assert_eq!(pos, 12),
            _ => panic!("unexpected error {err}"),
        }
    }
}
