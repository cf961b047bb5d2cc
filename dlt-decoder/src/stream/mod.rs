//! Byte stream contract
//!
//! A [`ByteStream`] is an ordered, position-tracked byte source with a configurable
//! byte order and a single checkpoint that can be rewound to. The decode driver owns
//! exactly one stream and talks to it only through this trait, so the concrete
//! source (in-memory, memory-mapped, windowed file) is interchangeable.
//!
//! ## Failure model
//! - Reads past the end of available data fail with [`StreamError::EndOfData`] and
//!   consume nothing.
//! - [`ByteStream::rewind`] without a prior [`ByteStream::checkpoint`] fails with
//!   [`StreamError::NoCheckpoint`]; after [`ByteStream::close`] it fails with
//!   [`StreamError::Closed`]. Callers treat rewind failure as best-effort.
//! - [`StreamError::Io`] and [`StreamError::Closed`] are fatal for the stream's lifecycle.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

pub mod slice;
pub mod windowed;

pub use slice::{MmapStream, SliceStream};
pub use windowed::{WindowedFileStream, WindowedStream};

/// Byte order used for multi-byte reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Endianness {
    /// Most significant byte first (network order)
    #[default]
    Big,
    /// Least significant byte first
    Little,
}

impl Endianness {
    /// Interpret two bytes in this order
    pub fn u16_from(self, bytes: &[u8]) -> u16 {
        match self {
            Endianness::Big => BigEndian::read_u16(bytes),
            Endianness::Little => LittleEndian::read_u16(bytes),
        }
    }

    /// Interpret four bytes in this order
    pub fn u32_from(self, bytes: &[u8]) -> u32 {
        match self {
            Endianness::Big => BigEndian::read_u32(bytes),
            Endianness::Little => LittleEndian::read_u32(bytes),
        }
    }

    /// Interpret eight bytes in this order
    pub fn u64_from(self, bytes: &[u8]) -> u64 {
        match self {
            Endianness::Big => BigEndian::read_u64(bytes),
            Endianness::Little => LittleEndian::read_u64(bytes),
        }
    }
}

/// Errors raised by a byte stream
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    #[error("End of data at offset {offset} (needed {needed} more bytes)")]
    EndOfData { offset: u64, needed: usize },

    #[error("Rewind requested without a checkpoint")]
    NoCheckpoint,

    #[error("Stream is closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    /// True if the stream can no longer be used after this error
    pub fn is_fatal(&self) -> bool {
        matches!(self, StreamError::Io(_) | StreamError::Closed)
    }
}

/// Result type for stream operations
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Ordered, position-tracked byte source with checkpoint/rewind
pub trait ByteStream {
    /// Set the byte order used by the multi-byte reads
    fn set_order(&mut self, order: Endianness);

    /// Currently configured byte order
    fn order(&self) -> Endianness;

    /// True while at least one byte can still be read
    fn has_remaining(&self) -> bool;

    /// Current read offset from the start of the source
    fn position(&self) -> u64;

    /// Fill `buf` completely, or fail without consuming anything
    fn read_into(&mut self, buf: &mut [u8]) -> StreamResult<()>;

    /// Remember the current offset as the rewind target
    fn checkpoint(&mut self);

    /// Move the read head back to the last checkpoint
    fn rewind(&mut self) -> StreamResult<()>;

    /// Release the underlying source
    fn close(&mut self) -> StreamResult<()>;

    fn read_u8(&mut self) -> StreamResult<u8> {
        let mut buf = [0u8; 1];
        self.read_into(&mut buf)?;
        Ok(buf[0])
    }

    fn read_u16(&mut self) -> StreamResult<u16> {
        let mut buf = [0u8; 2];
        self.read_into(&mut buf)?;
        Ok(self.order().u16_from(&buf))
    }

    fn read_u32(&mut self) -> StreamResult<u32> {
        let mut buf = [0u8; 4];
        self.read_into(&mut buf)?;
        Ok(self.order().u32_from(&buf))
    }

    fn read_u64(&mut self) -> StreamResult<u64> {
        let mut buf = [0u8; 8];
        self.read_into(&mut buf)?;
        Ok(self.order().u64_from(&buf))
    }

    /// Read a fixed-length run of bytes
    fn read_bytes(&mut self, len: usize) -> StreamResult<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_into(&mut buf)?;
        Ok(buf)
    }
}

impl<S: ByteStream + ?Sized> ByteStream for Box<S> {
    fn set_order(&mut self, order: Endianness) {
        (**self).set_order(order)
    }

    fn order(&self) -> Endianness {
        (**self).order()
    }

    fn has_remaining(&self) -> bool {
        (**self).has_remaining()
    }

    fn position(&self) -> u64 {
        (**self).position()
    }

    fn read_into(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        (**self).read_into(buf)
    }

    fn checkpoint(&mut self) {
        (**self).checkpoint()
    }

    fn rewind(&mut self) -> StreamResult<()> {
        (**self).rewind()
    }

    fn close(&mut self) -> StreamResult<()> {
        (**self).close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_sensitive_reads() {
        let mut stream = SliceStream::new(vec![0x12u8, 0x34, 0x12, 0x34, 0x56, 0x78, 0x01]);
        assert_eq!(stream.read_u16().unwrap(), 0x1234);

        stream.set_order(Endianness::Little);
        assert_eq!(stream.read_u32().unwrap(), 0x7856_3412);
        assert_eq!(stream.read_u8().unwrap(), 0x01);
        assert!(!stream.has_remaining());
    }

    #[test]
    fn test_read_u64_both_orders() {
        let bytes: Vec<u8> = vec![1, 2, 3, 4, 5, 6, 7, 8, 1, 2, 3, 4, 5, 6, 7, 8];
        let mut stream = SliceStream::new(bytes);
        assert_eq!(stream.read_u64().unwrap(), 0x0102_0304_0506_0708);
        stream.set_order(Endianness::Little);
        assert_eq!(stream.read_u64().unwrap(), 0x0807_0605_0403_0201);
    }

    #[test]
    fn test_boxed_stream_delegates() {
        let mut stream: Box<dyn ByteStream> = Box::new(SliceStream::new(vec![0xABu8, 0xCD]));
        stream.checkpoint();
        assert_eq!(stream.read_u16().unwrap(), 0xABCD);
        stream.rewind().unwrap();
        assert_eq!(stream.position(), 0);
    }

    #[test]
    fn test_fatal_classification() {
        assert!(StreamError::Closed.is_fatal());
        assert!(!StreamError::NoCheckpoint.is_fatal());
        assert!(!StreamError::EndOfData { offset: 0, needed: 1 }.is_fatal());
    }
}
