//! # shmlink sender
//!
//! Producer side of the link: reads `FILE` and streams it, 56 bytes per
//! turn, to a running (or later started) `shmlink_receiver`.
//!
//! # Usage
//!
//! ```bash
//! shmlink_sender payload.bin
//!
//! # Custom key set / timeout, verbose logging
//! shmlink_sender --config shmlink.toml -v payload.bin
//! ```
//!
//! Exits 0 only after the receiver acknowledged end of stream.

use clap::Parser;
use shmlink_common::config::LinkConfig;
use shmlink_transport::{LinkError, TracingOptions, init_tracing, run_producer};
use std::fs::File;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};

/// shmlink sender - stream a file over shared memory
#[derive(Parser, Debug)]
#[command(name = "shmlink_sender")]
#[command(version)]
#[command(about = "Stream a file to shmlink_receiver over System V shared memory")]
struct Args {
    /// File to send.
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Optional TOML configuration (key set, timeout, log level).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging (DEBUG level).
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format.
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match LinkConfig::load_or_default(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("CONFIG ERROR: {e}");
            process::exit(1);
        }
    };
    setup_tracing(&args, &config);

    let service = if config.shared.service_name.is_empty() {
        "shmlink_sender"
    } else {
        config.shared.service_name.as_str()
    };
    info!("{} v{} starting", service, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        error!("{}: {}", e.kind().label(), e);
        process::exit(1);
    }
}

fn run(args: &Args, config: &LinkConfig) -> Result<(), LinkError> {
    let mut source = File::open(&args.file)?;
    info!("Sending {}", args.file.display());

    let stats = run_producer(&config.channel, &mut source)?;
    info!("Sent {} bytes in {} chunks", stats.bytes, stats.chunks);
    Ok(())
}

/// Setup tracing subscriber from CLI flags and config.
fn setup_tracing(args: &Args, config: &LinkConfig) {
    let level = if args.verbose {
        Level::DEBUG
    } else {
        config.shared.log_level.into()
    };

    init_tracing(TracingOptions {
        level,
        json: args.json,
    });
}
