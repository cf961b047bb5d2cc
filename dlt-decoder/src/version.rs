//! Storage version registry
//!
//! Maps a frame-start magic to the storage version it announces and a version to
//! the codec that decodes its frames. Adding a version means adding an arm here;
//! the driver's control flow does not change.

use crate::formats::V1Codec;
use crate::stream::{ByteStream, Endianness};
use crate::types::{DltMessage, FrameError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Decodes the fields of one frame once its storage version is known
///
/// Called with the stream positioned right after the frame's magic.
pub trait MessageCodec {
    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        frame_offset: u64,
    ) -> Result<DltMessage, FrameError>;
}

/// On-disk framing variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageVersion {
    V1,
    /// Recognized, decoding not implemented
    V2,
}

static V1_CODEC: V1Codec = V1Codec;

impl StorageVersion {
    /// Every recognized version
    pub const ALL: [StorageVersion; 2] = [StorageVersion::V1, StorageVersion::V2];

    /// Magic bytes as they appear in the file
    pub const fn magic_bytes(self) -> [u8; 4] {
        match self {
            StorageVersion::V1 => *b"DLT\x01",
            StorageVersion::V2 => *b"DLT\x02",
        }
    }

    /// Magic as a `u32` read in `order`
    pub fn magic(self, order: Endianness) -> u32 {
        order.u32_from(&self.magic_bytes())
    }

    /// True if `candidate` is the magic of any recognized version in `order`
    pub fn is_valid_magic(candidate: u32, order: Endianness) -> bool {
        Self::ALL.iter().any(|v| v.magic(order) == candidate)
    }

    /// Resolve a magic read in `order` to its version
    pub fn resolve(candidate: u32, order: Endianness) -> Result<Self, FrameError> {
        Self::ALL
            .into_iter()
            .find(|v| v.magic(order) == candidate)
            .ok_or(FrameError::UnrecognizedMagic(candidate))
    }

    /// Codec for this version, or `UnsupportedVersion` for the unimplemented arm
    pub fn codec(self) -> Result<&'static dyn MessageCodec, FrameError> {
        match self {
            StorageVersion::V1 => Ok(&V1_CODEC),
            StorageVersion::V2 => Err(FrameError::UnsupportedVersion(self)),
        }
    }
}

impl fmt::Display for StorageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageVersion::V1 => write!(f, "V1"),
            StorageVersion::V2 => write!(f, "V2"),
        }
    }
}
