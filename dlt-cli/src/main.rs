//! DLT Log Reader CLI Application
//!
//! This is the command-line interface for the DLT log decoder.
//! It uses the dlt-decoder library and adds:
//! - Text and JSON-lines rendering of decode records
//! - Per-file summaries, decoded in parallel across files
//! - TOML configuration with command-line overrides

use anyhow::{Context, Result};
use clap::Parser;
use dlt_decoder::{ByteStream, DecodeDriver, Decoder, SourceStrategy};
use rayon::prelude::*;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

mod config;
mod report;

use config::{AppConfig, OutputConfig, OutputFormat};

/// Byte source choice on the command line
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum StrategyArg {
    /// Memory-map the file
    Mmap,
    /// Read through a fixed-size window
    Windowed,
}

impl From<StrategyArg> for SourceStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Mmap => SourceStrategy::MemoryMapped,
            StrategyArg::Windowed => SourceStrategy::Windowed,
        }
    }
}

/// DLT Log Reader - Decode AUTOSAR DLT capture files
#[derive(Parser, Debug)]
#[command(name = "dlt-cli")]
#[command(about = "Decode DLT (Diagnostic Log and Trace) capture files", long_about = None)]
#[command(version)]
struct Args {
    /// DLT files to decode
    #[arg(value_name = "FILE")]
    files: Vec<PathBuf>,

    /// Byte source (default: platform dependent)
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Buffer size in bytes for the windowed source
    #[arg(long, value_name = "BYTES")]
    window_size: Option<usize>,

    /// Output format for records
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Only print records carrying a decode error
    #[arg(long)]
    errors_only: bool,

    /// Maximum number of records to decode per file
    #[arg(long, value_name = "COUNT")]
    max_records: Option<u64>,

    /// Print per-file totals instead of individual records
    #[arg(short, long)]
    summary: bool,

    /// Path to configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.verbose, args.quiet);

    log::info!("DLT Log Reader CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using decoder library v{}", dlt_decoder::VERSION);

    if args.files.is_empty() {
        println!("DLT Log Reader - No input specified");
        println!("\nQuick Start:");
        println!("  dlt-cli trace.dlt");
        println!("  dlt-cli --summary *.dlt");
        println!("  dlt-cli --format json --errors-only trace.dlt");
        println!("\nUse --help for more options");
        return Ok(());
    }

    let config = resolve_config(&args)?;
    log::debug!("Effective configuration: {:?}", config);
    let decoder = Decoder::new(config.decoder);

    if args.summary {
        summary_mode(&args.files, &decoder, config.output.format)
    } else {
        for path in &args.files {
            decode_mode(path, &decoder, &config.output)?;
        }
        Ok(())
    }
}

/// Config file values, overridden by command-line flags
fn resolve_config(args: &Args) -> Result<AppConfig> {
    let mut config = match &args.config {
        Some(path) => {
            log::info!("Loading configuration from: {:?}", path);
            config::load_config(path)?
        }
        None => AppConfig::default(),
    };

    if let Some(strategy) = args.strategy {
        config.decoder = config.decoder.with_source(strategy.into());
    }
    if let Some(window_size) = args.window_size {
        anyhow::ensure!(window_size > 0, "--window-size must be > 0");
        config.decoder = config.decoder.with_window_size(window_size);
    }
    if let Some(format) = args.format {
        config.output.format = format;
    }
    if args.errors_only {
        config.output.errors_only = true;
    }
    if args.max_records.is_some() {
        config.output.max_records = args.max_records;
    }
    Ok(config)
}

/// Print every record of one file
fn decode_mode(path: &Path, decoder: &Decoder, output: &OutputConfig) -> Result<()> {
    let mut records = decoder
        .decode_file(path)
        .with_context(|| format!("Failed to open {:?}", path))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_records(&mut records, output, &mut out)
        .with_context(|| format!("Decoding {:?} aborted", path))?;
    out.flush()?;

    let stats = records.stats();
    log::info!(
        "{:?}: {} records ({} decoded, {} errors)",
        path,
        stats.records,
        stats.success_count,
        stats.error_count
    );
    Ok(())
}

/// Render records until exhaustion or `max_records`, then close the stream
fn write_records<S: ByteStream, W: Write>(
    records: &mut DecodeDriver<S>,
    output: &OutputConfig,
    out: &mut W,
) -> Result<()> {
    loop {
        if let Some(max) = output.max_records {
            if records.stats().records >= max {
                log::info!("Stopping after {} records", max);
                break;
            }
        }
        let Some(record) = records.next() else {
            break;
        };
        let status = record?;

        if !output.errors_only || status.decode_error().is_some() {
            match output.format {
                OutputFormat::Text => writeln!(out, "{}", report::format_status(&status))?,
                OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&status)?)?,
            }
        }
    }

    // No-op when the driver already closed the stream at exhaustion
    records.close()?;
    Ok(())
}

/// Decode all files in parallel and print their totals
fn summary_mode(files: &[PathBuf], decoder: &Decoder, format: OutputFormat) -> Result<()> {
    let summaries: Vec<Result<report::FileSummary>> = files
        .par_iter()
        .map(|path| report::summarize(path, decoder))
        .collect();

    let mut failed = 0;
    for summary in summaries {
        match summary {
            Ok(summary) => match format {
                OutputFormat::Text => println!("{}", summary.to_text()),
                OutputFormat::Json => println!("{}", serde_json::to_string(&summary)?),
            },
            Err(e) => {
                failed += 1;
                log::error!("{:#}", e);
            }
        }
    }

    anyhow::ensure!(failed == 0, "{} of {} files could not be decoded", failed, files.len());
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;

    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
