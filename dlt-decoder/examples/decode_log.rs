//! Standalone DLT log decoder tool
//!
//! Decodes a DLT capture file and prints decoded messages, decode errors and a summary.
//!
//! Usage:
//!   decode_log <file.dlt> [--windowed] [--limit <count>]
//!
//! Example:
//!   decode_log trace.dlt --limit 100

use dlt_decoder::{DecodeStatus, Decoder, DecoderConfig, LogLevel, SourceStrategy};
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

struct DecoderStats {
    records: usize,
    messages: usize,
    errors: usize,
    payload_bytes: usize,
    per_app: HashMap<String, usize>,
    per_level: HashMap<LogLevel, usize>,
}

impl DecoderStats {
    fn new() -> Self {
        Self {
            records: 0,
            messages: 0,
            errors: 0,
            payload_bytes: 0,
            per_app: HashMap::new(),
            per_level: HashMap::new(),
        }
    }

    fn record(&mut self, status: &DecodeStatus) {
        self.records += 1;
        match status.decoded_message() {
            Some(message) => {
                self.messages += 1;
                self.payload_bytes += message.payload.len();
                let app = message
                    .app_id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "-".to_string());
                *self.per_app.entry(app).or_insert(0) += 1;
                if let Some(level) = message.log_level() {
                    *self.per_level.entry(level).or_insert(0) += 1;
                }
            }
            None => self.errors += 1,
        }
    }

    fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Records: {}", self.records);
        println!("Decoded messages: {}", self.messages);
        println!("Decode errors: {}", self.errors);
        println!("Payload bytes: {}", self.payload_bytes);

        if !self.per_level.is_empty() {
            println!("\nLog levels:");
            let mut levels: Vec<_> = self.per_level.iter().collect();
            levels.sort();
            for (level, count) in levels {
                println!("  {}: {}", level, count);
            }
        }

        if !self.per_app.is_empty() {
            println!("\nTop 10 applications:");
            let mut sorted: Vec<_> = self.per_app.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1));
            for (app, count) in sorted.iter().take(10) {
                println!("  {}: {} messages", app, count);
            }
        }
    }
}

fn print_status(status: &DecodeStatus) {
    match (status.decoded_message(), status.decode_error()) {
        (Some(message), _) => println!(
            "[{:>6}] {:<24} {:<4} {:<4} {:<4} {:>5} bytes",
            status.index,
            status.progress_text,
            message.ecu_id(),
            message.app_id().map(|id| id.to_string()).unwrap_or_default(),
            message.context_id().map(|id| id.to_string()).unwrap_or_default(),
            message.payload.len()
        ),
        (None, Some(err)) => println!("[{:>6}] {:<24} ERROR {}", status.index, status.progress_text, err),
        (None, None) => {}
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <file.dlt> [--windowed] [--limit <count>]", args[0]);
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let mut config = DecoderConfig::new();
    let mut limit: Option<usize> = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--windowed" => config = config.with_source(SourceStrategy::Windowed),
            "--limit" if i + 1 < args.len() => {
                i += 1;
                limit = args[i].parse().ok();
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let decoder = Decoder::new(config);
    let mut records = match decoder.decode_file(&path) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut stats = DecoderStats::new();
    for record in records.by_ref() {
        match record {
            Ok(status) => {
                print_status(&status);
                stats.record(&status);
            }
            Err(e) => {
                eprintln!("Fatal: {}", e);
                break;
            }
        }
        if limit.is_some_and(|max| stats.records >= max) {
            break;
        }
    }
    if let Err(e) = records.close() {
        eprintln!("Failed to close {:?}: {}", path, e);
    }

    stats.print_summary();
}
