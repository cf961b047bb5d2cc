//! Decoder configuration types
//!
//! This module defines the configuration needed by the decoder library: which
//! byte source to open files with and how magic values are recognized.

use crate::stream::windowed::DEFAULT_WINDOW_SIZE;
use crate::stream::Endianness;
use serde::{Deserialize, Serialize};

/// How a log file is turned into a byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStrategy {
    /// Map the whole file into memory
    MemoryMapped,
    /// Read through a fixed-size window
    Windowed,
}

impl SourceStrategy {
    /// Windowed on Windows, where a memory map locks the file; memory-mapped elsewhere
    pub fn platform_default() -> Self {
        if cfg!(windows) {
            SourceStrategy::Windowed
        } else {
            SourceStrategy::MemoryMapped
        }
    }
}

impl Default for SourceStrategy {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Configuration for the decoder library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecoderConfig {
    /// Byte source used by `decode_file`
    #[serde(default)]
    pub source: SourceStrategy,

    /// Buffer size of the windowed source, in bytes (default: 64 KiB)
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    /// Byte order used to recognize frame-start magic values
    #[serde(default)]
    pub scan_order: Endianness,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            source: SourceStrategy::default(),
            window_size: default_window_size(),
            scan_order: Endianness::default(),
        }
    }
}

impl DecoderConfig {
    /// Create a new decoder configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the byte source strategy
    pub fn with_source(mut self, source: SourceStrategy) -> Self {
        self.source = source;
        self
    }

    /// Builder method: set the windowed source buffer size
    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    /// Builder method: set the byte order used for magic recognition
    pub fn with_scan_order(mut self, order: Endianness) -> Self {
        self.scan_order = order;
        self
    }
}
