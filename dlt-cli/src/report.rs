//! Record formatting and per-file summaries

use anyhow::{Context, Result};
use dlt_decoder::{DecodeOutcome, DecodeStatus, Decoder};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Totals for one decoded file
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub records: u64,
    pub messages: u64,
    pub errors: u64,
    /// Decoded log messages per level
    pub levels: BTreeMap<String, u64>,
    /// Decode errors per cause
    pub causes: BTreeMap<String, u64>,
    /// Set if decoding stopped on a fatal stream failure
    pub fatal: Option<String>,
}

impl FileSummary {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    fn add(&mut self, status: &DecodeStatus) {
        self.records += 1;
        if let Some(message) = status.decoded_message() {
            self.messages += 1;
            if let Some(level) = message.log_level() {
                *self.levels.entry(level.to_string()).or_insert(0) += 1;
            }
        }
        if let Some(err) = status.decode_error() {
            self.errors += 1;
            *self.causes.entry(err.cause.clone()).or_insert(0) += 1;
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{}: {} records, {} messages, {} errors",
            self.path.display(),
            self.records,
            self.messages,
            self.errors
        );
        for (level, count) in &self.levels {
            text.push_str(&format!("\n  {:<8} {}", level, count));
        }
        for (cause, count) in &self.causes {
            text.push_str(&format!("\n  ! {:<18} {}", cause, count));
        }
        if let Some(fatal) = &self.fatal {
            text.push_str(&format!("\n  aborted: {}", fatal));
        }
        text
    }
}

/// Decode a whole file, keeping only totals
pub fn summarize(path: &Path, decoder: &Decoder) -> Result<FileSummary> {
    let records = decoder
        .decode_file(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let mut summary = FileSummary::new(path);
    for record in records {
        match record {
            Ok(status) => summary.add(&status),
            Err(e) => summary.fatal = Some(e.to_string()),
        }
    }
    log::debug!("Summarized {:?}: {} records", path, summary.records);
    Ok(summary)
}

/// One-line text rendering of a record
pub fn format_status(status: &DecodeStatus) -> String {
    match &status.outcome {
        DecodeOutcome::DecodedMessage(message) => {
            let id_or_dash = |id: Option<dlt_decoder::Identifier>| {
                id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
            };
            let time = message
                .timestamp()
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string())
                .unwrap_or_else(|| "-".to_string());
            let level = message
                .log_level()
                .map(|level| level.to_string())
                .unwrap_or_else(|| "-".to_string());

            format!(
                "{:>7} {} {:<4} {:<4} {:<4} {:<7} {} bytes [{}]",
                status.index,
                time,
                message.ecu_id(),
                id_or_dash(message.app_id()),
                id_or_dash(message.context_id()),
                level,
                message.payload.len(),
                status.progress_text
            )
        }
        DecodeOutcome::DecodeError(err) => {
            format!("{:>7} ERROR {} [{}]", status.index, err, status.progress_text)
        }
    }
}
