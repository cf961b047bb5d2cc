//! 4-character DLT identifiers (ECU, application and context IDs)
//!
//! An identifier is stored as four bytes, packed big-endian into a `u32`.
//! Zero bytes decode to spaces and the result is trimmed, so identifiers shorter
//! than four characters do not round-trip through their padded form exactly.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors raised by the identifier codec
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentifierError {
    #[error("Identifier {text:?} has {len} characters, at most 4 allowed")]
    InvalidLength { text: String, len: usize },
}

/// Pack up to 4 characters big-endian into a `u32`
///
/// Each character is taken as a single byte; missing trailing characters are zero.
///
/// # Example
/// ```
/// use dlt_decoder::encode_identifier;
///
/// assert_eq!(encode_identifier("ABCD").unwrap(), 0x41424344);
/// assert!(encode_identifier("TOOLONG12").is_err());
/// ```
pub fn encode_identifier(text: &str) -> Result<u32, IdentifierError> {
    let len = text.chars().count();
    if len > 4 {
        return Err(IdentifierError::InvalidLength {
            text: text.to_string(),
            len,
        });
    }

    let mut bytes = [0u8; 4];
    for (slot, ch) in bytes.iter_mut().zip(text.chars()) {
        *slot = (ch as u32 & 0xFF) as u8;
    }
    Ok(u32::from_be_bytes(bytes))
}

/// Unpack a `u32` into its trimmed 4-character text
pub fn decode_identifier(value: u32) -> String {
    let text: String = value
        .to_be_bytes()
        .iter()
        .map(|&b| if b == 0 { ' ' } else { char::from(b) })
        .collect();
    text.trim().to_string()
}

/// A packed 4-character identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(pub u32);

impl Identifier {
    /// Build from the four raw header bytes
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_be_bytes(bytes))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// True for the all-zero identifier
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&decode_identifier(self.0))
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        encode_identifier(s).map(Identifier)
    }
}

impl Serialize for Identifier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&decode_identifier(self.0))
    }
}

impl<'de> Deserialize<'de> for Identifier {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
