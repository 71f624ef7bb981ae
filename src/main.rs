//! CLI entry point for emg-daq.
//!
//! Collects acquisition parameters and runs one feature-collection session,
//! or lists what is available (serial ports, dataset tables).
//!
//! # Usage
//!
//! Record a session:
//! ```bash
//! emg-daq acquire --port /dev/ttyUSB0 --baud 115200 --variant a --reps 2
//! ```
//!
//! Inspect ports and the dataset:
//! ```bash
//! emg-daq list --dataset Feature_Data.h5
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use emg_daq::config::{AcquisitionConfig, BaudRate};
use emg_daq::link;
use emg_daq::protocol::ProtocolVariant;
use emg_daq::store::FeatureStore;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "emg-daq")]
#[command(about = "EMG feature acquisition over a serial link into an HDF5 dataset", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one feature-collection session.
    Acquire {
        /// Serial port identifier (e.g. /dev/ttyUSB0, COM3)
        #[arg(long)]
        port: String,

        /// Link baud rate
        #[arg(long, value_enum, default_value = "115200")]
        baud: BaudRate,

        /// Firmware protocol revision of the connected device
        #[arg(long, value_enum, default_value = "a")]
        variant: ProtocolVariant,

        /// Repetitions to record per gesture
        #[arg(long, default_value_t = 2)]
        reps: u32,

        /// Dataset file to append to (created if absent)
        #[arg(long, default_value = "Feature_Data.h5")]
        dataset: PathBuf,

        /// Optional TOML config file; CLI flags override its values
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List available serial ports and the dataset's tables.
    List {
        /// Dataset file to inspect
        #[arg(long, default_value = "Feature_Data.h5")]
        dataset: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .compact()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Acquire {
            port,
            baud,
            variant,
            reps,
            dataset,
            config,
        } => {
            let mut cfg = match config {
                Some(path) => AcquisitionConfig::from_file(&path)
                    .with_context(|| format!("failed to load config '{}'", path.display()))?,
                None => AcquisitionConfig::default(),
            };
            cfg.port = port;
            cfg.baud = baud;
            cfg.variant = variant;
            cfg.repetitions = reps;
            cfg.dataset_path = dataset;
            acquire(&cfg)
        }
        Commands::List { dataset } => list(&dataset),
    }
}

fn acquire(cfg: &AcquisitionConfig) -> Result<()> {
    let mut store = FeatureStore::open(&cfg.dataset_path)
        .with_context(|| format!("failed to open dataset '{}'", cfg.dataset_path.display()))?;

    // Open the link before creating the session table so a bad port never
    // leaves an empty table behind.
    let mut serial = link::open_link(&cfg.port, cfg.baud, cfg.variant)?;

    let result = emg_daq::run_session(cfg, serial.as_mut(), &mut store);

    // Store teardown happens on every exit path; the run itself already
    // flushed the table.
    store.close().context("failed to close dataset")?;

    let summary = result.context("acquisition run failed")?;
    info!(
        table_id = summary.table_id,
        records = summary.records_stored,
        "session stored"
    );
    Ok(())
}

fn list(dataset: &Path) -> Result<()> {
    let ports = link::available_port_names()?;
    if ports.is_empty() {
        println!("no serial ports detected");
    } else {
        println!("ports:");
        for port in ports {
            println!("  {port}");
        }
    }

    if !dataset.exists() {
        println!("dataset '{}' does not exist", dataset.display());
        return Ok(());
    }

    let store = FeatureStore::open(dataset)
        .with_context(|| format!("failed to open dataset '{}'", dataset.display()))?;
    println!("dataset '{}':", dataset.display());
    for id in store.table_ids() {
        let rows = store.row_count(id)?;
        println!("  fset_{id}: {rows} records");
    }
    store.close()?;
    Ok(())
}
