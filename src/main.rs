//! # mzscan
//!
//! Command-line front end for importing mass spectrometry raw files.
//!
//! ## Usage
//!
//! ```bash
//! # Import an ANDI-MS file, keeping data points in a scratch file
//! mzscan import run01.cdf --store temp-file
//!
//! # Inspect the NetCDF header
//! mzscan info run01.cdf
//!
//! # Generate a synthetic file with every 10th scan missing
//! mzscan demo demo.cdf --missing-every 10
//! ```

use anyhow::Result;
use clap::Parser;

mod cli;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli::init_logging(cli.verbosity());
    cli::dispatch(cli)
}
