//! DLT storage format version 1
//!
//! ## Frame layout
//! ```text
//! [magic "DLT\x01" 4B]
//! [seconds u32 LE][microseconds u32 LE][ECU id 4B]      storage header
//! [HTYP u8][MCNT u8][LEN u16 BE]                         standard header
//! [ECU id 4B]? [session id u32 BE]? [timestamp u32 BE]?  as flagged in HTYP
//! [MSIN u8][NOAR u8][APID 4B][CTID 4B]?                  extended header (UEH)
//! [payload: LEN - standard/extended header bytes]
//! ```
//! `LEN` counts the standard header, the extended header and the payload, not the
//! storage header.

use crate::identifier::Identifier;
use crate::stream::{ByteStream, Endianness};
use crate::types::{DltMessage, ExtendedHeader, FrameError, StandardHeader, StorageHeader};
use crate::version::{MessageCodec, StorageVersion};

/// Size of the fixed part of the standard header
const STANDARD_HEADER_SIZE: u16 = 4;
/// Size of the extended header
const EXTENDED_HEADER_SIZE: u16 = 10;

/// Codec for storage version 1 frames
#[derive(Debug, Clone, Copy, Default)]
pub struct V1Codec;

impl MessageCodec for V1Codec {
    fn decode(
        &self,
        stream: &mut dyn ByteStream,
        frame_offset: u64,
    ) -> Result<DltMessage, FrameError> {
        // Storage header values are written in host (little-endian) order
        stream.set_order(Endianness::Little);
        let storage_header = StorageHeader {
            seconds: stream.read_u32()?,
            microseconds: stream.read_u32()?,
            ecu_id: read_identifier(stream)?,
        };

        stream.set_order(Endianness::Big);
        let header_type = stream.read_u8()?;
        let counter = stream.read_u8()?;
        let length = stream.read_u16()?;

        let headers_len = headers_len(header_type);
        if length < headers_len {
            return Err(FrameError::Malformed(format!(
                "length {} shorter than its headers ({} bytes, HTYP 0x{:02X})",
                length, headers_len, header_type
            )));
        }

        let ecu_id = if header_type & StandardHeader::WITH_ECU_ID != 0 {
            Some(read_identifier(stream)?)
        } else {
            None
        };
        let session_id = if header_type & StandardHeader::WITH_SESSION_ID != 0 {
            Some(stream.read_u32()?)
        } else {
            None
        };
        let timestamp = if header_type & StandardHeader::WITH_TIMESTAMP != 0 {
            Some(stream.read_u32()?)
        } else {
            None
        };

        let standard_header = StandardHeader {
            header_type,
            counter,
            length,
            ecu_id,
            session_id,
            timestamp,
        };

        let extended_header = if standard_header.has_extended_header() {
            Some(ExtendedHeader {
                message_info: stream.read_u8()?,
                argument_count: stream.read_u8()?,
                app_id: read_identifier(stream)?,
                context_id: read_identifier(stream)?,
            })
        } else {
            None
        };

        let payload = stream.read_bytes((length - headers_len) as usize)?;

        log::trace!(
            "V1 frame at offset {}: counter {}, {} payload bytes",
            frame_offset,
            counter,
            payload.len()
        );

        Ok(DltMessage {
            version: StorageVersion::V1,
            offset: frame_offset,
            storage_header,
            standard_header,
            extended_header,
            payload,
        })
    }
}

/// Bytes of standard and extended header announced by HTYP
fn headers_len(header_type: u8) -> u16 {
    let mut len = STANDARD_HEADER_SIZE;
    for flag in [
        StandardHeader::WITH_ECU_ID,
        StandardHeader::WITH_SESSION_ID,
        StandardHeader::WITH_TIMESTAMP,
    ] {
        if header_type & flag != 0 {
            len += 4;
        }
    }
    if header_type & StandardHeader::USE_EXTENDED_HEADER != 0 {
        len += EXTENDED_HEADER_SIZE;
    }
    len
}

fn read_identifier(stream: &mut dyn ByteStream) -> Result<Identifier, FrameError> {
    let mut bytes = [0u8; 4];
    stream.read_into(&mut bytes)?;
    Ok(Identifier::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::SliceStream;
    use crate::types::{LogLevel, MessageType};

    /// Frame body after the magic: storage header, standard header with ECU id and
    /// timestamp, extended header for a verbose info log, payload
    fn frame_body(payload: &[u8]) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(&1_700_000_000u32.to_le_bytes());
        body.extend_from_slice(&500u32.to_le_bytes());
        body.extend_from_slice(b"ECU1");

        let header_type = 0x20
            | StandardHeader::USE_EXTENDED_HEADER
            | StandardHeader::WITH_ECU_ID
            | StandardHeader::WITH_TIMESTAMP;
        let length = 4 + 4 + 4 + 10 + payload.len() as u16;
        body.push(header_type);
        body.push(7);
        body.extend_from_slice(&length.to_be_bytes());
        body.extend_from_slice(b"ECU2");
        body.extend_from_slice(&12345u32.to_be_bytes());

        body.push(0x41);
        body.push(1);
        body.extend_from_slice(b"APP\0");
        body.extend_from_slice(b"CTX1");
        body.extend_from_slice(payload);
        body
    }

    #[test]
    fn test_decode_full_frame() {
        let mut stream = SliceStream::new(frame_body(&[1, 2, 3]));
        let message = V1Codec.decode(&mut stream, 40).unwrap();

        assert_eq!(message.offset, 40);
        assert_eq!(message.version, StorageVersion::V1);
        assert_eq!(message.storage_header.seconds, 1_700_000_000);
        assert_eq!(message.storage_header.microseconds, 500);
        assert_eq!(message.storage_header.ecu_id.to_string(), "ECU1");
        assert_eq!(message.ecu_id().to_string(), "ECU2");
        assert_eq!(message.standard_header.counter, 7);
        assert_eq!(message.standard_header.version(), 1);
        assert_eq!(message.standard_header.timestamp, Some(12345));
        assert_eq!(message.standard_header.session_id, None);
        assert_eq!(message.standard_header.payload_order(), Endianness::Little);
        assert_eq!(message.app_id().unwrap().to_string(), "APP");
        assert_eq!(message.context_id().unwrap().to_string(), "CTX1");
        assert_eq!(message.message_type(), Some(MessageType::Log(LogLevel::Info)));
        assert!(message.extended_header.as_ref().unwrap().is_verbose());
        assert_eq!(message.payload, vec![1, 2, 3]);
        assert!(!stream.has_remaining());
    }

    #[test]
    fn test_minimal_frame_without_optional_headers() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0u8; 12]);
        body.extend_from_slice(&[0x20 | StandardHeader::MSB_FIRST, 0, 0, 6, 0xAA, 0xBB]);

        let mut stream = SliceStream::new(body);
        let message = V1Codec.decode(&mut stream, 0).unwrap();
        assert!(message.extended_header.is_none());
        assert!(message.log_level().is_none());
        assert_eq!(message.standard_header.payload_order(), Endianness::Big);
        assert_eq!(message.payload, vec![0xAA, 0xBB]);
    }

    #[test]
    fn test_length_shorter_than_headers() {
        let mut body = Vec::new();
        body.extend_from_slice(&[0u8; 12]);
        // extended header announced but length only covers the standard header
        body.extend_from_slice(&[0x21, 0, 0, 4]);

        let mut stream = SliceStream::new(body);
        let err = V1Codec.decode(&mut stream, 0).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn test_truncated_payload() {
        let mut body = frame_body(&[1, 2, 3, 4]);
        body.truncate(body.len() - 2);

        let mut stream = SliceStream::new(body);
        let err = V1Codec.decode(&mut stream, 0).unwrap_err();
        assert!(matches!(err, FrameError::Truncated { needed: 2, .. }));
    }

    #[test]
    fn test_headers_len() {
        assert_eq!(headers_len(0x20), 4);
        assert_eq!(headers_len(0x3D), 4 + 12 + 10);
    }
}
