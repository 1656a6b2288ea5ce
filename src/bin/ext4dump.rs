//! Command-line front end (§4.12): reads an ext4 image from disk and writes
//! the labelled text dump to stdout, with progress and anomaly diagnostics
//! on stderr via `tracing`.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ext4_forensic_dump::{Driver, Ext4ParseError};

/// A read-only forensic dumper for ext4 filesystem images.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the raw ext4 image or partition to inspect.
    image: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::EnvFilter;

    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.image.exists() {
        return Err(Ext4ParseError::ImagePathNotFound(cli.image.display().to_string()).into());
    }

    let data = fs::read(&cli.image)
        .with_context(|| format!("reading image {}", cli.image.display()))?;

    let driver = Driver::open(&data)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    driver.dump(&mut handle)?;

    Ok(())
}
