use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use mzscan::store::StoreKind;

mod config;
mod demo;
mod import;
mod info;

/// mzscan - mass spectrometry raw file importer
#[derive(Parser)]
#[command(name = "mzscan")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Where imported data points are kept.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum StoreArg {
    /// Process heap
    Memory,
    /// Scratch file on local disk
    TempFile,
    /// Embedded database in a scratch directory
    EmbeddedDb,
}

impl From<StoreArg> for StoreKind {
    fn from(arg: StoreArg) -> Self {
        match arg {
            StoreArg::Memory => StoreKind::Memory,
            StoreArg::TempFile => StoreKind::TempFile,
            StoreArg::EmbeddedDb => StoreKind::EmbeddedDb,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Import a raw data file and print a summary of its scans
    Import {
        /// Input raw data file (ANDI-MS .cdf)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Data point store backend (default: memory, or the config file's choice)
        #[arg(short = 's', long, value_enum)]
        store: Option<StoreArg>,

        /// Directory for temp-file and embedded-db scratch data
        #[arg(long, value_name = "DIR")]
        scratch_dir: Option<PathBuf>,

        /// Load settings from a TOML config file
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display the header of a NetCDF file
    Info {
        /// Input NetCDF file path
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Generate a synthetic ANDI-MS file for testing
    Demo {
        /// Output file path
        #[arg(value_name = "OUTPUT", default_value = "demo_gcms_run.cdf")]
        output: PathBuf,

        /// Number of scans
        #[arg(long, default_value = "600")]
        scans: usize,

        /// Profile points per scan
        #[arg(long, default_value = "400")]
        points: usize,

        /// Mark every Nth scan as missing (0 keeps all scans)
        #[arg(long, default_value = "0")]
        missing_every: usize,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Import {
            input,
            store,
            scratch_dir,
            config,
            json,
        } => import::run(input, store.map(StoreKind::from), scratch_dir, config, json),
        Commands::Info { file } => info::run(file),
        Commands::Demo {
            output,
            scans,
            points,
            missing_every,
        } => demo::run(output, scans, points, missing_every),
    }
}
