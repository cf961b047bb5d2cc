//! Streaming decode driver
//!
//! The driver owns a [`ByteStream`] and turns it into a lazy sequence of
//! [`DecodeStatus`] records, one per decode attempt:
//!
//! 1. **Scanning**: resynchronize on the next frame-start magic
//! 2. **Checkpoint**: mark the stream right after the magic
//! 3. **Dispatch**: resolve the magic to a [`StorageVersion`] and its codec
//! 4. **Decode**: let the codec read the frame
//! 5. **Emit**: attach the message, or the error after rewinding to the checkpoint
//!
//! Bytes discarded while scanning are reported as one `Resynchronized` error record;
//! the frame start found behind them is kept pending and decoded by the next attempt.
//! Recoverable failures never end the sequence. It ends when the stream has no bytes
//! left (the stream is then closed, exactly once) or on a fatal stream failure.
//!
//! Single consumer, single pass: the driver mutates the stream's read position and
//! the cumulative counters are only meaningful when every record is drained in order.

use crate::progress::{progress, progress_text};
use crate::resync::{find_next_magic, MagicMatch};
use crate::stream::{ByteStream, Endianness, StreamError};
use crate::types::{
    DecodeError, DecodeOutcome, DecodeStatus, DecoderError, DltMessage, FrameError, Result,
};
use crate::version::StorageVersion;
use serde::Serialize;
use std::iter::FusedIterator;

/// Where the next poll starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Look for the next magic
    Scanning,
    /// A magic was found behind discarded bytes; decode it without rescanning
    Pending(MagicMatch),
    /// Stream exhausted (or failed) and closed
    Closed,
}

/// Outcome of one attempt: a message, or the offset and cause of its failure
type Attempt = std::result::Result<DltMessage, (u64, FrameError)>;

/// Snapshot of a driver's cumulative counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodeStats {
    pub records: u64,
    pub success_count: u64,
    pub error_count: u64,
}

/// Pull-based decoder over a byte stream
pub struct DecodeDriver<S: ByteStream> {
    stream: S,
    file_size: Option<u64>,
    scan_order: Endianness,
    state: State,
    index: u64,
    error_count: u64,
    success_count: u64,
}

impl<S: ByteStream> DecodeDriver<S> {
    /// Create a driver over `stream`; `file_size` is the total size hint used for progress
    pub fn new(stream: S, file_size: Option<u64>) -> Self {
        Self {
            stream,
            file_size,
            scan_order: Endianness::default(),
            state: State::Scanning,
            index: 0,
            error_count: 0,
            success_count: 0,
        }
    }

    /// Builder method: byte order used to recognize magic values
    pub fn with_scan_order(mut self, order: Endianness) -> Self {
        self.scan_order = order;
        self
    }

    /// Produce the next record
    ///
    /// Returns `Ok(None)` once, when the stream is exhausted (the stream is closed at
    /// that point). Polling again afterwards fails with [`DecoderError::Exhausted`].
    /// A fatal stream failure closes the stream and is returned as `Err`.
    pub fn poll(&mut self) -> Result<Option<DecodeStatus>> {
        let attempt = match self.state {
            State::Closed => {
                return Err(DecoderError::Exhausted {
                    records: self.index,
                })
            }
            State::Pending(found) => {
                self.state = State::Scanning;
                self.decode_frame(found)
            }
            State::Scanning => {
                if !self.stream.has_remaining() {
                    self.finish();
                    return Ok(None);
                }
                self.scan()
            }
        };

        match attempt {
            Ok(attempt) => Ok(Some(self.emit(attempt))),
            Err(err) => {
                log::error!("Decoding aborted: {}", err);
                self.shutdown();
                Err(err)
            }
        }
    }

    fn scan(&mut self) -> Result<Attempt> {
        let start = self.stream.position();
        self.stream.set_order(self.scan_order);

        match find_next_magic(&mut self.stream) {
            Ok(found) if found.discarded > 0 => {
                self.state = State::Pending(found);
                Ok(Err((
                    start,
                    FrameError::Resynchronized {
                        discarded: found.discarded,
                    },
                )))
            }
            Ok(found) => self.decode_frame(found),
            Err(StreamError::EndOfData { .. }) => {
                let discarded = self.stream.position() - start;
                Ok(Err((start, FrameError::NoFrameStart { discarded })))
            }
            Err(source) => Err(DecoderError::Stream {
                offset: self.stream.position(),
                source,
            }),
        }
    }

    fn decode_frame(&mut self, found: MagicMatch) -> Result<Attempt> {
        self.stream.checkpoint();

        let decoded = StorageVersion::resolve(found.magic, self.scan_order)
            .and_then(|version| version.codec())
            .and_then(|codec| codec.decode(&mut self.stream, found.offset));

        match decoded {
            Ok(message) => Ok(Ok(message)),
            Err(FrameError::Stream(source)) if source.is_fatal() => Err(DecoderError::Stream {
                offset: self.stream.position(),
                source,
            }),
            Err(err) => {
                // Next scan starts right after the accepted magic
                if let Err(rewind_err) = self.stream.rewind() {
                    log::warn!(
                        "Rewind after failed frame at offset {} failed, continuing from {}: {}",
                        found.offset,
                        self.stream.position(),
                        rewind_err
                    );
                }
                Ok(Err((found.offset, err)))
            }
        }
    }

    fn emit(&mut self, attempt: Attempt) -> DecodeStatus {
        let outcome = match attempt {
            Ok(message) => {
                self.success_count += 1;
                DecodeOutcome::DecodedMessage(message)
            }
            Err((offset, err)) => {
                self.error_count += 1;
                log::debug!("Record {}: {} (offset {})", self.index, err, offset);
                DecodeOutcome::DecodeError(DecodeError::new(offset, &err))
            }
        };

        let position = self.stream.position();
        let status = DecodeStatus {
            index: self.index,
            file_position: Some(position),
            file_size: self.file_size,
            progress: progress(position, self.file_size),
            progress_text: progress_text(position, self.file_size),
            error_count: self.error_count,
            success_count: self.success_count,
            outcome,
        };
        self.index += 1;
        status
    }

    fn finish(&mut self) {
        log::info!(
            "Decoding finished: {} records ({} decoded, {} errors)",
            self.index,
            self.success_count,
            self.error_count
        );
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.state = State::Closed;
        if let Err(e) = self.stream.close() {
            log::warn!("Failed to close stream: {}", e);
        }
    }

    /// Close the stream before exhaustion, for consumers that stop early
    ///
    /// Does nothing if the driver already closed it.
    pub fn close(&mut self) -> Result<()> {
        if self.state == State::Closed {
            return Ok(());
        }
        self.state = State::Closed;
        self.stream.close().map_err(|source| DecoderError::Stream {
            offset: self.stream.position(),
            source,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.state == State::Closed
    }

    /// Cumulative counters of the records produced so far
    pub fn stats(&self) -> DecodeStats {
        DecodeStats {
            records: self.index,
            success_count: self.success_count,
            error_count: self.error_count,
        }
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }
}

impl<S: ByteStream> Iterator for DecodeDriver<S> {
    type Item = Result<DecodeStatus>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_closed() {
            return None;
        }
        self.poll().transpose()
    }
}

impl<S: ByteStream> FusedIterator for DecodeDriver<S> {}
