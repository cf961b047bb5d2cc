//! Per-version frame codecs
//!
//! Each codec implements [`crate::version::MessageCodec`] and decodes one frame
//! whose magic has already been consumed.

pub mod v1;

pub use v1::V1Codec;
