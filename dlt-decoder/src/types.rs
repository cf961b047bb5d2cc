//! Core types for the DLT decoder library
//!
//! This module defines what the decoder emits: one [`DecodeStatus`] per decode
//! attempt, carrying either a decoded [`DltMessage`] or a [`DecodeError`] record,
//! plus the error types separating recoverable per-frame failures ([`FrameError`])
//! from lifecycle-fatal ones ([`DecoderError`]).

use crate::identifier::Identifier;
use crate::stream::{Endianness, StreamError};
use crate::version::StorageVersion;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Errors that end a decode or never start it
///
/// These are propagated to the caller and are never counted in a
/// [`DecodeStatus`] error counter.
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Failed to open log file {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fatal stream failure at offset {offset}: {source}")]
    Stream {
        offset: u64,
        #[source]
        source: StreamError,
    },

    #[error("Decoder already exhausted after {records} records")]
    Exhausted { records: u64 },
}

/// Recoverable failure of a single decode attempt
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("No frame start before end of data ({discarded} bytes discarded)")]
    NoFrameStart { discarded: u64 },

    #[error("Resynchronized after discarding {discarded} bytes")]
    Resynchronized { discarded: u64 },

    #[error("Unrecognized magic 0x{0:08X}")]
    UnrecognizedMagic(u32),

    #[error("Storage version {0} is recognized but not supported")]
    UnsupportedVersion(StorageVersion),

    #[error("Frame truncated at offset {offset} ({needed} more bytes needed)")]
    Truncated { offset: u64, needed: usize },

    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("Stream error: {0}")]
    Stream(StreamError),
}

impl FrameError {
    /// Stable category label, reported as the record's `cause`
    pub fn kind(&self) -> &'static str {
        match self {
            FrameError::NoFrameStart { .. } => "EndOfData",
            FrameError::Resynchronized { .. } => "Resynchronized",
            FrameError::UnrecognizedMagic(_) => "UnrecognizedMagic",
            FrameError::UnsupportedVersion(_) => "UnsupportedVersion",
            FrameError::Truncated { .. } => "Truncated",
            FrameError::Malformed(_) => "MalformedFrame",
            FrameError::Stream(_) => "Stream",
        }
    }
}

impl From<StreamError> for FrameError {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::EndOfData { offset, needed } => FrameError::Truncated { offset, needed },
            other => FrameError::Stream(other),
        }
    }
}

/// Error record attached to a failed decode attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeError {
    /// Stream offset the failed attempt is attributed to
    pub offset: u64,
    /// Human-readable description
    pub message: String,
    /// Failure category (see [`FrameError::kind`])
    pub cause: String,
}

impl DecodeError {
    pub fn new(offset: u64, err: &FrameError) -> Self {
        Self {
            offset,
            message: err.to_string(),
            cause: err.kind().to_string(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at offset {}: {}", self.cause, self.offset, self.message)
    }
}

/// What a decode attempt produced
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DecodeOutcome {
    DecodedMessage(DltMessage),
    DecodeError(DecodeError),
}

/// Result of one decode attempt, with progress and cumulative counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeStatus {
    /// Attempt counter, starting at 0
    pub index: u64,
    /// Stream offset after the attempt
    pub file_position: Option<u64>,
    /// Total size hint supplied at start
    pub file_size: Option<u64>,
    /// `file_position / file_size` when a size hint was supplied
    pub progress: Option<f64>,
    /// Human-readable progress label
    pub progress_text: String,
    /// Failed attempts so far, this one included
    pub error_count: u64,
    /// Successful attempts so far, this one included
    pub success_count: u64,
    #[serde(flatten)]
    pub outcome: DecodeOutcome,
}

impl DecodeStatus {
    pub fn decoded_message(&self) -> Option<&DltMessage> {
        match &self.outcome {
            DecodeOutcome::DecodedMessage(message) => Some(message),
            DecodeOutcome::DecodeError(_) => None,
        }
    }

    pub fn decode_error(&self) -> Option<&DecodeError> {
        match &self.outcome {
            DecodeOutcome::DecodeError(err) => Some(err),
            DecodeOutcome::DecodedMessage(_) => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DecodeOutcome::DecodedMessage(_))
    }
}

/// DLT log levels (message type info of a log message)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum LogLevel {
    Fatal,
    Error,
    Warn,
    Info,
    Debug,
    Verbose,
    Unknown(u8),
}

impl LogLevel {
    fn from_type_info(mtin: u8) -> Self {
        match mtin {
            1 => LogLevel::Fatal,
            2 => LogLevel::Error,
            3 => LogLevel::Warn,
            4 => LogLevel::Info,
            5 => LogLevel::Debug,
            6 => LogLevel::Verbose,
            other => LogLevel::Unknown(other),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Fatal => write!(f, "fatal"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Verbose => write!(f, "verbose"),
            LogLevel::Unknown(v) => write!(f, "level({})", v),
        }
    }
}

/// Message type from the extended header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    Log(LogLevel),
    AppTrace(u8),
    NetworkTrace(u8),
    Control(u8),
    Unknown { kind: u8, info: u8 },
}

impl MessageType {
    /// Decode from the MSIN byte of the extended header
    pub fn from_message_info(msin: u8) -> Self {
        let kind = (msin >> 1) & 0x07;
        let info = msin >> 4;
        match kind {
            0 => MessageType::Log(LogLevel::from_type_info(info)),
            1 => MessageType::AppTrace(info),
            2 => MessageType::NetworkTrace(info),
            3 => MessageType::Control(info),
            _ => MessageType::Unknown { kind, info },
        }
    }
}

/// Storage header written by the logger in front of every frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageHeader {
    pub seconds: u32,
    pub microseconds: u32,
    pub ecu_id: Identifier,
}

impl StorageHeader {
    /// Reception time, `None` if the stored values are out of range
    pub fn timestamp(&self) -> Option<Timestamp> {
        let nanos = self.microseconds.checked_mul(1_000)?;
        DateTime::from_timestamp(self.seconds as i64, nanos)
    }
}

/// Standard DLT header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandardHeader {
    /// Raw HTYP byte
    pub header_type: u8,
    pub counter: u8,
    /// Length of standard header, extended header and payload
    pub length: u16,
    pub ecu_id: Option<Identifier>,
    pub session_id: Option<u32>,
    /// Sender uptime in 0.1 ms ticks
    pub timestamp: Option<u32>,
}

impl StandardHeader {
    pub const USE_EXTENDED_HEADER: u8 = 0x01;
    pub const MSB_FIRST: u8 = 0x02;
    pub const WITH_ECU_ID: u8 = 0x04;
    pub const WITH_SESSION_ID: u8 = 0x08;
    pub const WITH_TIMESTAMP: u8 = 0x10;

    /// Protocol version (bits 5-7 of HTYP)
    pub fn version(&self) -> u8 {
        self.header_type >> 5
    }

    pub fn has_extended_header(&self) -> bool {
        self.header_type & Self::USE_EXTENDED_HEADER != 0
    }

    /// Byte order of the payload
    pub fn payload_order(&self) -> Endianness {
        if self.header_type & Self::MSB_FIRST != 0 {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Extended DLT header
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedHeader {
    /// Raw MSIN byte
    pub message_info: u8,
    pub argument_count: u8,
    pub app_id: Identifier,
    pub context_id: Identifier,
}

impl ExtendedHeader {
    pub fn is_verbose(&self) -> bool {
        self.message_info & 0x01 != 0
    }

    pub fn message_type(&self) -> MessageType {
        MessageType::from_message_info(self.message_info)
    }
}

/// One decoded DLT message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DltMessage {
    pub version: StorageVersion,
    /// Offset of the frame's magic in the stream
    pub offset: u64,
    pub storage_header: StorageHeader,
    pub standard_header: StandardHeader,
    pub extended_header: Option<ExtendedHeader>,
    /// Raw payload bytes, in [`StandardHeader::payload_order`]
    pub payload: Vec<u8>,
}

impl DltMessage {
    /// ECU id from the standard header, falling back to the storage header
    pub fn ecu_id(&self) -> Identifier {
        self.standard_header
            .ecu_id
            .unwrap_or(self.storage_header.ecu_id)
    }

    pub fn app_id(&self) -> Option<Identifier> {
        self.extended_header.as_ref().map(|h| h.app_id)
    }

    pub fn context_id(&self) -> Option<Identifier> {
        self.extended_header.as_ref().map(|h| h.context_id)
    }

    pub fn message_type(&self) -> Option<MessageType> {
        self.extended_header.as_ref().map(|h| h.message_type())
    }

    /// Log level, for log messages only
    pub fn log_level(&self) -> Option<LogLevel> {
        match self.message_type()? {
            MessageType::Log(level) => Some(level),
            _ => None,
        }
    }

    pub fn timestamp(&self) -> Option<Timestamp> {
        self.storage_header.timestamp()
    }
}
