//! Frame-start resynchronization
//!
//! Scans forward one byte at a time through a 32-bit rolling window until the
//! window holds a recognized magic. There is no alignment assumption, so the scan
//! recovers after corruption or truncation. A four-byte run inside corrupted data
//! that happens to equal a magic is accepted as a frame start.

use crate::stream::{ByteStream, Endianness, StreamResult};
use crate::version::StorageVersion;

/// A frame start located by [`find_next_magic`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicMatch {
    /// Magic as read in the stream's configured order
    pub magic: u32,
    /// Offset of the magic's first byte
    pub offset: u64,
    /// Bytes discarded before the magic
    pub discarded: u64,
}

/// Advance the stream until it sits right after the next recognized magic
///
/// Fails with `EndOfData` if the data ends first; every byte scanned is consumed
/// either way.
pub fn find_next_magic<S: ByteStream + ?Sized>(stream: &mut S) -> StreamResult<MagicMatch> {
    let start = stream.position();
    let order = stream.order();
    let mut window: u32 = 0;
    let mut scanned: u64 = 0;

    loop {
        window = (window << 8) | stream.read_u8()? as u32;
        scanned += 1;

        if scanned < 4 {
            continue;
        }

        // The window holds bytes in arrival order; compare as a read in `order` would see them
        let candidate = match order {
            Endianness::Big => window,
            Endianness::Little => window.swap_bytes(),
        };
        if StorageVersion::is_valid_magic(candidate, order) {
            let discarded = scanned - 4;
            if discarded > 0 {
                log::debug!(
                    "Resynchronized at offset {} after discarding {} bytes",
                    start + discarded,
                    discarded
                );
            }
            return Ok(MagicMatch {
                magic: candidate,
                offset: start + discarded,
                discarded,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{SliceStream, StreamError};

    #[test]
    fn test_magic_at_start() {
        let mut stream = SliceStream::new(b"DLT\x01rest".to_vec());
        let found = find_next_magic(&mut stream).unwrap();

        assert_eq!(found.magic, StorageVersion::V1.magic(Endianness::Big));
        assert_eq!(found.offset, 0);
        assert_eq!(found.discarded, 0);
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn test_magic_after_garbage() {
        let mut stream = SliceStream::new(b"xxDLTzzDLT\x02".to_vec());
        let found = find_next_magic(&mut stream).unwrap();

        assert_eq!(found.magic, StorageVersion::V2.magic(Endianness::Big));
        assert_eq!(found.offset, 7);
        assert_eq!(found.discarded, 7);
        assert_eq!(stream.position(), 11);
    }

    #[test]
    fn test_little_endian_scan() {
        let mut stream = SliceStream::new(b"\x00DLT\x01".to_vec());
        stream.set_order(Endianness::Little);
        let found = find_next_magic(&mut stream).unwrap();

        assert_eq!(found.magic, StorageVersion::V1.magic(Endianness::Little));
        assert_eq!(found.offset, 1);
    }

    #[test]
    fn test_no_magic_consumes_everything() {
        let mut stream = SliceStream::new(b"DLT\x03no frame here".to_vec());
        let err = find_next_magic(&mut stream).unwrap_err();

        assert!(matches!(err, StreamError::EndOfData { .. }));
        assert!(!stream.has_remaining());
    }

    #[test]
    fn test_scan_starts_at_current_position() {
        let mut stream = SliceStream::new(b"DLT\x01DLT\x01".to_vec());
        find_next_magic(&mut stream).unwrap();
        let second = find_next_magic(&mut stream).unwrap();
        assert_eq!(second.offset, 4);
        assert_eq!(second.discarded, 0);
    }
}
