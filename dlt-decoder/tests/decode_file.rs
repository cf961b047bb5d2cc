//! End-to-end decoding of DLT capture files through both byte sources

use dlt_decoder::{
    decode_file, decode_stream, DecodeStatus, Decoder, DecoderConfig, DecoderError, LogLevel,
    SliceStream, SourceStrategy,
};
use std::io::Write;
use tempfile::NamedTempFile;

/// V1 frame with ECU id and timestamp in the standard header and an extended header
fn v1_frame(app: &[u8; 4], level: u8, payload: &[u8]) -> Vec<u8> {
    let mut frame = b"DLT\x01".to_vec();
    frame.extend_from_slice(&1_700_000_000u32.to_le_bytes());
    frame.extend_from_slice(&123_456u32.to_le_bytes());
    frame.extend_from_slice(b"ECU1");

    frame.push(0x35); // version 1, UEH, WEID, WTMS
    frame.push(3);
    frame.extend_from_slice(&(22 + payload.len() as u16).to_be_bytes());
    frame.extend_from_slice(b"ECU1");
    frame.extend_from_slice(&42u32.to_be_bytes());

    frame.push((level << 4) | 0x01);
    frame.push(1);
    frame.extend_from_slice(app);
    frame.extend_from_slice(b"CTX1");
    frame.extend_from_slice(payload);
    frame
}

fn capture() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend(v1_frame(b"APP1", 4, b"first"));
    data.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF, 0x00]);
    data.extend(v1_frame(b"APP2", 2, b"second"));
    data.extend_from_slice(b"DLT\x02");
    data.extend(v1_frame(b"APP1", 5, b"third"));
    data
}

fn write_capture(bytes: &[u8]) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(bytes).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

fn collect(records: impl Iterator<Item = dlt_decoder::Result<DecodeStatus>>) -> Vec<DecodeStatus> {
    records.map(|record| record.unwrap()).collect()
}

fn assert_capture_records(records: &[DecodeStatus], file_size: u64) {
    assert_eq!(records.len(), 5);

    let first = records[0].decoded_message().unwrap();
    assert_eq!(first.app_id().unwrap().to_string(), "APP1");
    assert_eq!(first.log_level(), Some(LogLevel::Info));
    assert_eq!(first.payload, b"first".to_vec());
    assert_eq!(first.standard_header.session_id, None);
    assert_eq!(first.standard_header.timestamp, Some(42));
    assert_eq!(first.timestamp().unwrap().timestamp_subsec_micros(), 123_456);

    let resync = records[1].decode_error().unwrap();
    assert_eq!(resync.cause, "Resynchronized");
    assert_eq!(resync.offset, first.payload.len() as u64 + 38);

    let second = records[2].decoded_message().unwrap();
    assert_eq!(second.log_level(), Some(LogLevel::Error));

    assert_eq!(records[3].decode_error().unwrap().cause, "UnsupportedVersion");

    let third = records[4].decoded_message().unwrap();
    assert_eq!(third.log_level(), Some(LogLevel::Debug));
    assert_eq!(third.payload, b"third".to_vec());

    for (k, status) in records.iter().enumerate() {
        assert_eq!(status.index, k as u64);
        assert_eq!(status.success_count + status.error_count, k as u64 + 1);
        assert_eq!(status.file_size, Some(file_size));
    }
    assert_eq!(records[4].progress, Some(1.0));
    assert_eq!(records[4].success_count, 3);
    assert_eq!(records[4].error_count, 2);
}

#[test]
fn decode_memory_mapped_file() {
    let data = capture();
    let temp_file = write_capture(&data);

    let records = decode_file(temp_file.path(), SourceStrategy::MemoryMapped).unwrap();
    assert_capture_records(&collect(records), data.len() as u64);
}

#[test]
fn decode_windowed_file() {
    let data = capture();
    let temp_file = write_capture(&data);

    // Window smaller than a frame forces refills and rewinds across windows
    let decoder = Decoder::new(
        DecoderConfig::new()
            .with_source(SourceStrategy::Windowed)
            .with_window_size(16),
    );
    let records = decoder.decode_file(temp_file.path()).unwrap();
    assert_capture_records(&collect(records), data.len() as u64);
}

#[test]
fn both_sources_agree() {
    let data = capture();
    let temp_file = write_capture(&data);

    let mapped = collect(decode_file(temp_file.path(), SourceStrategy::MemoryMapped).unwrap());
    let windowed = collect(decode_file(temp_file.path(), SourceStrategy::Windowed).unwrap());
    let in_memory = collect(decode_stream(SliceStream::new(data.clone()), Some(data.len() as u64)));

    assert_eq!(mapped, windowed);
    assert_eq!(mapped, in_memory);
}

#[test]
fn empty_file_yields_no_records() {
    let temp_file = write_capture(&[]);
    for strategy in [SourceStrategy::MemoryMapped, SourceStrategy::Windowed] {
        let mut records = decode_file(temp_file.path(), strategy).unwrap();
        assert!(records.poll().unwrap().is_none());
        assert!(matches!(
            records.poll(),
            Err(DecoderError::Exhausted { records: 0 })
        ));
    }
}

#[test]
fn missing_file_is_an_open_error() {
    let result = decode_file(
        std::path::Path::new("does/not/exist.dlt"),
        SourceStrategy::Windowed,
    );
    assert!(matches!(result, Err(DecoderError::Open { .. })));
}

#[test]
fn status_wire_shape() {
    let mut data = vec![0u8; 3];
    data.extend(v1_frame(b"APP1", 4, b"x"));
    let records = collect(decode_stream(SliceStream::new(data), None));

    let error_json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(error_json["index"], 0);
    assert_eq!(error_json["errorCount"], 1);
    assert_eq!(error_json["successCount"], 0);
    assert_eq!(error_json["fileSize"], serde_json::Value::Null);
    assert_eq!(error_json["progress"], serde_json::Value::Null);
    assert_eq!(error_json["decodeError"]["offset"], 0);
    assert_eq!(error_json["decodeError"]["cause"], "Resynchronized");
    assert!(error_json.get("decodedMessage").is_none());

    let message_json = serde_json::to_value(&records[1]).unwrap();
    assert_eq!(message_json["filePosition"], 3 + 39);
    assert_eq!(message_json["decodedMessage"]["extendedHeader"]["appId"], "APP1");
    assert_eq!(message_json["decodedMessage"]["storageHeader"]["ecuId"], "ECU1");
    assert!(message_json.get("decodeError").is_none());
}
