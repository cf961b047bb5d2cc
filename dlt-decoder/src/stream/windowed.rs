//! Windowed file source
//!
//! Reads the file through a fixed-size buffer instead of mapping it. Used where a
//! memory map would hold an exclusive lock on the capture file (Windows).

use super::{ByteStream, Endianness, StreamError, StreamResult};
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read, Seek};
use std::path::Path;

/// Default window size: 64 KiB
pub const DEFAULT_WINDOW_SIZE: usize = 64 * 1024;

/// Byte stream reading a seekable source through a sliding buffer
pub struct WindowedStream<R: Read + Seek> {
    reader: Option<BufReader<R>>,
    len: u64,
    pos: u64,
    mark: Option<u64>,
    order: Endianness,
    /// Set when a seek or read failed midway; the read head no longer matches `pos`
    poisoned: bool,
}

/// Windowed stream over a file
pub type WindowedFileStream = WindowedStream<File>;

impl WindowedStream<File> {
    /// Open `path` with a buffer of `window_size` bytes
    pub fn open(path: &Path, window_size: usize) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        log::debug!(
            "Opened {:?} for windowed reading ({} bytes, window {} bytes)",
            path,
            len,
            window_size
        );
        Ok(Self::from_reader(file, len, window_size))
    }
}

impl<R: Read + Seek> WindowedStream<R> {
    /// Wrap a reader positioned at offset 0 holding `len` bytes
    pub fn from_reader(reader: R, len: u64, window_size: usize) -> Self {
        Self {
            reader: Some(BufReader::with_capacity(window_size.max(1), reader)),
            len,
            pos: 0,
            mark: None,
            order: Endianness::default(),
            poisoned: false,
        }
    }

    /// Source length captured at open time
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none()
    }

    /// Ready reader, or the error every call gets once the read head is lost
    fn reader(&mut self) -> StreamResult<&mut BufReader<R>> {
        if self.poisoned {
            return Err(StreamError::Io(std::io::Error::new(
                ErrorKind::Other,
                format!("read position lost near offset {}", self.pos),
            )));
        }
        self.reader.as_mut().ok_or(StreamError::Closed)
    }
}

impl<R: Read + Seek> ByteStream for WindowedStream<R> {
    fn set_order(&mut self, order: Endianness) {
        self.order = order;
    }

    fn order(&self) -> Endianness {
        self.order
    }

    fn has_remaining(&self) -> bool {
        self.reader.is_some() && self.pos < self.len
    }

    fn position(&self) -> u64 {
        self.pos
    }

    fn read_into(&mut self, buf: &mut [u8]) -> StreamResult<()> {
        let pos = self.pos;
        let available = self.len.saturating_sub(pos);
        let reader = self.reader()?;
        if (buf.len() as u64) > available {
            return Err(StreamError::EndOfData {
                offset: pos,
                needed: buf.len() - available as usize,
            });
        }

        if let Err(err) = reader.read_exact(buf) {
            // read_exact may have consumed part of `buf`
            self.poisoned = true;
            return Err(err.into());
        }
        self.pos += buf.len() as u64;
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.mark = Some(self.pos);
    }

    fn rewind(&mut self) -> StreamResult<()> {
        let delta = self.mark.map(|mark| mark as i64 - self.pos as i64);
        let reader = self.reader()?;
        let delta = delta.ok_or(StreamError::NoCheckpoint)?;

        // Stay inside the current window when possible
        if let Err(err) = reader.seek_relative(delta) {
            self.poisoned = true;
            return Err(err.into());
        }
        self.pos = (self.pos as i64 + delta) as u64;
        Ok(())
    }

    fn close(&mut self) -> StreamResult<()> {
        self.reader = None;
        self.poisoned = false;
        self.mark = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file_with(bytes: &[u8]) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(bytes).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_small_window_reads_across_refills() {
        let bytes: Vec<u8> = (0u8..=255).collect();
        let temp_file = temp_file_with(&bytes);

        let mut stream = WindowedFileStream::open(temp_file.path(), 7).unwrap();
        assert_eq!(stream.len(), 256);
        let read = stream.read_bytes(200).unwrap();
        assert_eq!(read, bytes[..200].to_vec());
        assert_eq!(stream.position(), 200);
    }

    #[test]
    fn test_rewind_behind_window() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let temp_file = temp_file_with(&bytes);

        let mut stream = WindowedFileStream::open(temp_file.path(), 4).unwrap();
        stream.read_bytes(3).unwrap();
        stream.checkpoint();
        stream.read_bytes(40).unwrap();
        stream.rewind().unwrap();

        assert_eq!(stream.position(), 3);
        assert_eq!(stream.read_u8().unwrap(), 3);
    }

    #[test]
    fn test_end_of_data_and_close() {
        let temp_file = temp_file_with(&[9, 8]);
        let mut stream = WindowedFileStream::open(temp_file.path(), 16).unwrap();

        assert!(matches!(
            stream.read_u32(),
            Err(StreamError::EndOfData { offset: 0, needed: 2 })
        ));
        assert_eq!(stream.read_u16().unwrap(), 0x0908);
        assert!(!stream.has_remaining());

        stream.close().unwrap();
        assert!(stream.is_closed());
        assert!(matches!(stream.rewind(), Err(StreamError::Closed)));
    }

    /// In-memory source whose seeks fail once `broken` is set
    struct BrokenSeek {
        inner: std::io::Cursor<Vec<u8>>,
        broken: bool,
    }

    impl Read for BrokenSeek {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Seek for BrokenSeek {
        fn seek(&mut self, pos: std::io::SeekFrom) -> std::io::Result<u64> {
            if self.broken {
                return Err(std::io::Error::new(ErrorKind::Other, "seek unsupported"));
            }
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_failed_seek_makes_stream_unusable() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let source = BrokenSeek {
            inner: std::io::Cursor::new(bytes),
            broken: false,
        };
        let mut stream = WindowedStream::from_reader(source, 64, 4);
        stream.checkpoint();
        stream.read_bytes(20).unwrap();
        stream.reader.as_mut().unwrap().get_mut().broken = true;

        // Mark lies behind the buffered window, so the inner source has to seek
        assert!(matches!(stream.rewind(), Err(StreamError::Io(_))));
        assert_eq!(stream.position(), 20);
        assert!(stream.has_remaining());
        assert!(matches!(stream.read_u8(), Err(StreamError::Io(_))));
        assert!(matches!(stream.rewind(), Err(StreamError::Io(_))));

        stream.close().unwrap();
        assert!(matches!(stream.read_u8(), Err(StreamError::Closed)));
    }

    #[test]
    fn test_rewind_inside_window_needs_no_seek() {
        let bytes: Vec<u8> = (0u8..64).collect();
        let source = BrokenSeek {
            inner: std::io::Cursor::new(bytes),
            broken: true,
        };
        let mut stream = WindowedStream::from_reader(source, 64, 16);
        stream.read_bytes(2).unwrap();
        stream.checkpoint();
        stream.read_bytes(3).unwrap();

        stream.rewind().unwrap();
        assert_eq!(stream.position(), 2);
        assert_eq!(stream.read_u8().unwrap(), 2);
    }
}
