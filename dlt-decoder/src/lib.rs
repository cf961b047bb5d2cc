//! DLT Log Decoder Library
//!
//! Decodes DLT (AUTOSAR Diagnostic Log and Trace) capture files into a lazy stream
//! of per-message decode results, tolerating corruption by resynchronizing on
//! frame-start magic values and reporting progress for arbitrarily large files.
//!
//! # Architecture
//!
//! - [`ByteStream`]: ordered, position-tracked byte source with checkpoint/rewind
//!   (in-memory, memory-mapped or windowed file)
//! - [`resync`]: byte-by-byte scan for the next frame-start magic
//! - [`StorageVersion`]: magic registry and per-version [`MessageCodec`] dispatch
//! - [`DecodeDriver`]: scan → checkpoint → dispatch → decode → emit, rewinding on failure
//! - [`identifier`]: 4-character identifier codec used by header fields
//!
//! The library does NOT:
//! - Ingest live captures
//! - Write DLT frames
//! - Decode storage version 2 (recognized, reported as unsupported per frame)
//!
//! # Example Usage
//!
//! ```no_run
//! use dlt_decoder::{decode_file, SourceStrategy};
//! use std::path::Path;
//!
//! let records = decode_file(Path::new("trace.dlt"), SourceStrategy::platform_default()).unwrap();
//!
//! for record in records {
//!     let status = record.unwrap();
//!     match status.decoded_message() {
//!         Some(message) => println!("{} {:?}", status.progress_text, message.app_id()),
//!         None => eprintln!("Decode error: {:?}", status.decode_error()),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod decoder;
pub mod driver;
pub mod identifier;
pub mod resync;
pub mod stream;
pub mod types;
pub mod version;

// Re-export main types for convenience
pub use config::{DecoderConfig, SourceStrategy};
pub use decoder::{decode_file, decode_stream, Decoder};
pub use driver::{DecodeDriver, DecodeStats};
pub use identifier::{decode_identifier, encode_identifier, Identifier, IdentifierError};
pub use source::open_source;
pub use stream::{
    ByteStream, Endianness, MmapStream, SliceStream, StreamError, WindowedFileStream,
    WindowedStream,
};
pub use types::{
    DecodeError, DecodeOutcome, DecodeStatus, DecoderError, DltMessage, ExtendedHeader,
    FrameError, LogLevel, MessageType, Result, StandardHeader, StorageHeader, Timestamp,
};
pub use version::{MessageCodec, StorageVersion};

// Internal modules (not exposed in public API)
mod formats;
mod progress;
mod source;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
