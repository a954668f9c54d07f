//! Fair Dispatch CLI
//!
//! Runs one allocation round from JSON snapshots and prints the
//! cluster → driver mapping on stdout.
//!
//! Usage:
//!   fair-dispatch --clusters <FILE> --drivers <FILE> [OPTIONS]
//!
//! Options:
//!   --config <FILE>          Allocator configuration (JSON, partial allowed)
//!   --write-drivers <FILE>   Write the updated driver state here
//!   --log-level <LEVEL>      Log filter when RUST_LOG is unset (default: info)
//!
//! Example:
//!   fair-dispatch --clusters today.json --drivers state.json --write-drivers state.json

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fair_dispatch::allocator::{AllocatorConfig, FairnessReport, GreedyAllocator};
use fair_dispatch::snapshot;

#[derive(Parser)]
#[command(name = "fair-dispatch")]
#[command(version, about = "Assign delivery clusters to drivers, balancing cumulative workload")]
struct Cli {
    /// Clusters to assign: {cluster_id: effort vector}
    #[arg(long)]
    clusters: PathBuf,

    /// Driver state: {driver_id: {cumulative_effort_vector, consecutive_heavy_days}}
    #[arg(long)]
    drivers: PathBuf,

    /// Allocator configuration (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the updated driver state
    #[arg(long)]
    write_drivers: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // stdout carries the mapping
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> fair_dispatch::Result<AllocatorConfig> {
    match path {
        Some(path) => AllocatorConfig::from_json_str(&std::fs::read_to_string(path)?),
        None => Ok(AllocatorConfig::default()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logging(&cli.log_level);

    let config = load_config(cli.config.as_ref())?;
    let clusters = snapshot::load_clusters(BufReader::new(File::open(&cli.clusters)?))?;
    let mut pool = snapshot::load_drivers(BufReader::new(File::open(&cli.drivers)?))?;
    info!(
        clusters = clusters.len(),
        drivers = pool.len(),
        "Loaded snapshots"
    );

    let heavy_day_limit = config.heavy.max_consecutive_heavy_days;
    let allocator = GreedyAllocator::new(config);
    let allocation = allocator.allocate(&clusters, &mut pool)?;

    let report = FairnessReport::calculate(&allocation, &pool, heavy_day_limit);
    info!(
        assigned = report.assigned,
        unassigned = report.unassigned,
        heavy_assigned = report.heavy_assigned,
        penalty_reduction = report.penalty_reduction(),
        workload_spread = report.workload_spread(),
        drivers_at_heavy_limit = report.drivers_at_heavy_limit,
        "Allocation report"
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    snapshot::write_assignments(&mut out, &allocation)?;
    writeln!(out)?;

    if let Some(path) = &cli.write_drivers {
        let mut writer = BufWriter::new(File::create(path)?);
        snapshot::write_drivers(&mut writer, &pool)?;
        writer.flush()?;
        info!(path = %path.display(), "Driver state written");
    }

    Ok(())
}
