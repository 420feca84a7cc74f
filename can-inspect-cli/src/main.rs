//! CAN Inspect CLI Application
//!
//! Command-line front end for the can-inspect-core library. Replays a
//! candump-style text trace through the ingestion pipeline and prints:
//! - Latest decoded signal values (given a JSON message catalog)
//! - The sniffer change table (per-byte diffs and directions)
//! - Reassembled multi-frame transport payloads for selected IDs

use anyhow::{Context, Result};
use can_inspect_core::{FramePipeline, MessageCatalog, RawFrame, Reassembler};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod report;
mod trace;

/// CAN Inspect - decode and diff CAN bus traces
#[derive(Parser, Debug)]
#[command(name = "can-inspect-cli")]
#[command(about = "Decode signals, diff frames, and reassemble transport payloads from a CAN trace", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a candump-style text trace to replay
    #[arg(short, long, value_name = "FILE")]
    trace: PathBuf,

    /// Path to a JSON message catalog
    #[arg(long, value_name = "FILE")]
    catalog: Option<PathBuf>,

    /// Path to a configuration file (config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reassemble transport payloads on this CAN ID (hex, repeatable)
    #[arg(long, value_name = "ID", value_parser = parse_hex_id)]
    cantp: Vec<u32>,

    /// Print the sniffer change table
    #[arg(long)]
    sniff: bool,

    /// Maximum number of frames to replay (for testing)
    #[arg(long, value_name = "COUNT")]
    max_frames: Option<usize>,

    /// Verbosity level (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_hex_id(text: &str) -> std::result::Result<u32, String> {
    let text = text.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(text, 16).map_err(|e| format!("bad CAN ID '{}': {}", text, e))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    log::info!("CAN Inspect CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using core library v{}", can_inspect_core::VERSION);

    // Configuration file is optional; flags fill the gaps
    let mut app_config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::AppConfig::default(),
    };
    app_config.cantp.ids.extend(&args.cantp);
    if args.sniff {
        app_config.report.sniffer = true;
    }

    // Build the pipeline
    let mut pipeline = FramePipeline::with_config(app_config.pipeline.clone());
    if let Some(catalog_path) = &args.catalog {
        let catalog = load_catalog(catalog_path)?;
        let stats = catalog.stats();
        println!(
            "Catalog loaded: {} messages, {} signals",
            stats.num_messages, stats.num_signals
        );
        pipeline.set_catalog(Some(Arc::new(catalog)));
    } else {
        println!("No catalog given - raw tracking only");
    }

    // Replay the trace
    let mut frames = trace::parse_trace_file(&args.trace)?;
    if let Some(max) = args.max_frames {
        frames.truncate(max);
    }
    let mut decoded_total = 0usize;
    for frame in &frames {
        decoded_total += pipeline.process_frame(frame).len();
    }
    println!(
        "Replayed {} frames ({} signal values decoded, {} IDs tracked)\n",
        pipeline.frames_processed(),
        decoded_total,
        pipeline.tracker().len()
    );

    // Reports
    if pipeline.catalog().is_some() {
        print!(
            "{}",
            report::render_latest_values(&pipeline.latest_values(), app_config.report.max_rows)
        );
        println!();
    }

    if app_config.report.sniffer {
        print!("{}", report::render_sniffer_table(&pipeline.tracker().snapshot()));
        println!();
    }

    for can_id in &app_config.cantp.ids {
        let batch: Vec<RawFrame> = frames
            .iter()
            .filter(|f| f.can_id == *can_id)
            .cloned()
            .collect();
        let assembled = Reassembler::reassemble(&batch);
        print!("{}", report::render_assembled(*can_id, &assembled));
    }

    Ok(())
}

/// Load a JSON message catalog
fn load_catalog(path: &Path) -> Result<MessageCatalog> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog file: {:?}", path))?;
    let mut catalog: MessageCatalog = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse catalog file: {:?}", path))?;
    catalog.reindex();
    Ok(catalog)
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: u8, quiet: bool) {
    use env_logger::Builder;
    use log::LevelFilter;
    use std::io::Write;

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
