//! # shmlink receiver
//!
//! Consumer side of the link: writes everything the sender streams to
//! standard output. Takes no positional arguments.
//!
//! # Usage
//!
//! ```bash
//! shmlink_receiver > copy.bin
//!
//! # JSON logs on stderr
//! shmlink_receiver --json > copy.bin
//! ```

use clap::Parser;
use shmlink_common::config::LinkConfig;
use shmlink_transport::{LinkError, TracingOptions, init_tracing, run_consumer};
use std::io;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};

/// shmlink receiver - write a shared memory stream to stdout
#[derive(Parser, Debug)]
#[command(name = "shmlink_receiver")]
#[command(version)]
#[command(about = "Receive a shmlink stream and write it to standard output")]
struct Args {
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
        "shmlink_receiver"
    } else {
        config.shared.service_name.as_str()
    };
    info!("{} v{} starting", service, env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&config) {
        error!("{}: {}", e.kind().label(), e);
        process::exit(1);
    }
}

fn run(config: &LinkConfig) -> Result<(), LinkError> {
    let mut sink = io::stdout().lock();
    let stats = run_consumer(&config.channel, &mut sink)?;
    info!("Received {} bytes in {} chunks", stats.bytes, stats.chunks);
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
