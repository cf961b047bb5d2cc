//! In-memory and memory-mapped byte sources

use super::{ByteStream, Endianness, StreamError, StreamResult};
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Byte stream over a contiguous buffer
///
/// Works for owned vectors, borrowed slices and memory-mapped files alike.
/// Closing drops the buffer, which unmaps a memory-mapped source.
pub struct SliceStream<B: AsRef<[u8]>> {
    data: Option<B>,
    len: u64,
    pos: u64,
    mark: Option<u64>,
    order: Endianness,
}

/// Stream over a memory-mapped file
pub type MmapStream = SliceStream<Mmap>;

impl<B: AsRef<[u8]>> SliceStream<B> {
    /// Wrap a buffer, starting at offset 0 in big-endian order
    pub fn new(data: B) -> Self {
        let len = data.as_ref().len() as u64;
        Self {
            data: Some(data),
            len,
            pos: 0,
            mark: None,
            order: Endianness::default(),
        }
    }

    /// Total length of the buffer
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_closed(&self) -> bool {
        self.data.is_none()
    }
}

impl SliceStream<Mmap> {
    /// Memory-map a file read-only
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let file = File::open(path)?;
        // SAFETY: the map is read-only and never handed out mutably; a capture file
        // truncated by another process while mapped is outside what we support.
        let mmap = unsafe { Mmap::map(&file) }?;
        log::debug!("Memory-mapped {:?} ({} bytes)", path, mmap.len());
        Ok(Self::new(mmap))
    }
}

impl<B: AsRef<[u8]>> ByteStream for SliceStream<B> {
    fn set_order(&mut self, order: Endianness) {
        self.order = order;
    }

    fn order(&self) -> Endianness {
        self.order
    }

    fn has_remaining(&self) -> bool {
        self.data.is_some() && self.pos < self.len
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn read_into(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        let data = self.data.as_ref().ok_or(StreamError::Closed)?.as_ref();
        let available = self.len - self.pos;
        if (buf.len() as u64) > available {
            return Err(StreamError::EndOfData {
                offset: self.pos,
                needed: buf.len() - available as usize,
            });
        }

        let start = self.pos as usize;
        buf.copy_from_slice(&data[start..start + buf.len()]);
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.mark = Some(self.pos);
    }

    fn rewind(&mut self) -> StreamResult<()> {
        if self.data.is_none() {
            return Err(StreamError::Closed);
        }
        self.pos = self.mark.ok_or(StreamError::NoCheckpoint)?;
        Ok(())
    }

    fn close(&mut self) -> StreamResult<()> {
        self.data = None;
        self.mark = None;
        Ok(())
    }
}
