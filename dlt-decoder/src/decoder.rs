//! Main decoder API
//!
//! This module provides the entry points of the library: wiring a byte source
//! (with an optional total size hint) into a [`DecodeDriver`] that lazily yields
//! [`crate::DecodeStatus`] records.

use crate::config::{DecoderConfig, SourceStrategy};
use crate::driver::DecodeDriver;
use crate::source::open_source;
use crate::stream::ByteStream;
use crate::types::Result;
use std::path::Path;

/// Decoder entry point carrying a [`DecoderConfig`]
#[derive(Debug, Clone, Default)]
pub struct Decoder {
    config: DecoderConfig,
}

impl Decoder {
    /// Create a new decoder instance
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode an already opened byte stream
    ///
    /// # Arguments
    /// * `stream` - Byte source, owned by the driver until it is exhausted
    /// * `size_hint` - Total size used for progress, if known
    pub fn decode_stream<S: ByteStream>(&self, stream: S, size_hint: Option<u64>) -> DecodeDriver<S> {
        DecodeDriver::new(stream, size_hint).with_scan_order(self.config.scan_order)
    }

    /// Open a log file and return a lazy sequence of decode results
    ///
    /// Opening failures are returned here; everything after that is reported per record.
    ///
    /// # Example
    /// ```no_run
    /// use dlt_decoder::{Decoder, DecoderConfig, SourceStrategy};
    /// use std::path::Path;
    ///
    /// let decoder = Decoder::new(DecoderConfig::new().with_source(SourceStrategy::Windowed));
    /// for status in decoder.decode_file(Path::new("trace.dlt")).unwrap() {
    ///     let status = status.unwrap();
    ///     if let Some(err) = status.decode_error() {
    ///         eprintln!("{}", err);
    ///     }
    /// }
    /// ```
    pub fn decode_file(&self, path: &Path) -> Result<DecodeDriver<Box<dyn ByteStream>>> {
        log::info!("Decoding log file: {:?} ({:?} source)", path, self.config.source);
        let (stream, len) = open_source(path, &self.config)?;
        Ok(self.decode_stream(stream, Some(len)))
    }
}

/// Decode a byte stream with default settings
pub fn decode_stream<S: ByteStream>(stream: S, size_hint: Option<u64>) -> DecodeDriver<S> {
    Decoder::default().decode_stream(stream, size_hint)
}

/// Decode a log file using the given source strategy
///
/// Pass [`SourceStrategy::platform_default`] when there is no preference.
pub fn decode_file(path: &Path, strategy: SourceStrategy) -> Result<DecodeDriver<Box<dyn ByteStream>>> {
    Decoder::new(DecoderConfig::new().with_source(strategy)).decode_file(path)
}
