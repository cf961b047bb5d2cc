//! Byte source selection for log files

use crate::config::{DecoderConfig, SourceStrategy};
use crate::stream::{ByteStream, MmapStream, WindowedFileStream};
use crate::types::{DecoderError, Result};
use std::path::Path;

/// Open `path` with the configured strategy
///
/// Returns the stream together with the file length, used as the progress size hint.
pub fn open_source(path: &Path, config: &DecoderConfig) -> Result<(Box<dyn ByteStream>, u64)> {
    let open_err = |source| DecoderError::Open {
        path: path.to_path_buf(),
        source,
    };

    match config.source {
        SourceStrategy::MemoryMapped => {
            let stream = MmapStream::open(path).map_err(open_err)?;
            let len = stream.len();
            Ok((Box::new(stream), len))
        }
        SourceStrategy::Windowed => {
            let stream = WindowedFileStream::open(path, config.window_size).map_err(open_err)?;
            let len = stream.len();
            Ok((Box::new(stream), len))
        }
    }
}
