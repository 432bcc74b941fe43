//! Command-line interface definitions.

pub mod audit;
pub mod output;
pub mod query;
pub mod reconcile;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::config::Config;

/// Gridflux - market telemetry reconciliation and smoothing pipeline.
#[derive(Parser, Debug)]
#[command(name = "gridflux")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file.
    #[arg(long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Audit per-day data coverage for an entity or source
    Audit(AuditArgs),

    /// Backfill missing days from the interval archive
    Reconcile(ReconcileArgs),

    /// Run the smoothed annual-energy query pipeline
    Query(QueryArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
pub struct AuditTarget {
    /// Audit a single declared entity.
    #[arg(long)]
    pub entity: Option<String>,

    /// Audit every entity fed by a source.
    #[arg(long)]
    pub source: Option<String>,
}

#[derive(Args, Debug)]
pub struct AuditArgs {
    #[command(flatten)]
    pub target: AuditTarget,

    /// First day of the audit range (inclusive, UTC).
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the audit range (inclusive, UTC).
    #[arg(long)]
    pub to: NaiveDate,

    /// Emit the report as JSON instead of a table.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Entity to reconcile.
    #[arg(long)]
    pub entity: Option<String>,

    /// Reconcile every entity fed by this source instead.
    #[arg(long, conflicts_with = "entity")]
    pub source: Option<String>,

    /// First day of the range (inclusive, UTC).
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the range (inclusive, UTC).
    #[arg(long)]
    pub to: NaiveDate,
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Entities to aggregate, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub entities: Vec<String>,

    /// First day of the query range (inclusive, UTC).
    #[arg(long)]
    pub from: NaiveDate,

    /// Last day of the query range (inclusive, UTC).
    #[arg(long)]
    pub to: NaiveDate,

    /// Target cadence in minutes.
    #[arg(long, default_value_t = 30)]
    pub cadence: u32,

    /// Smoothing method: "exponential" or "loess".
    #[arg(long, default_value = "exponential")]
    pub method: String,

    /// Span for exponential smoothing (samples).
    #[arg(long, default_value_t = 30)]
    pub span: usize,

    /// Neighborhood fraction for loess smoothing.
    #[arg(long, default_value_t = 0.25)]
    pub fraction: f64,

    /// Reference year length for annualisation (365 or 366).
    #[arg(long, default_value_t = 365)]
    pub year_days: u32,

    /// Unit divisor for annualisation (1e6 converts MW to TWh).
    #[arg(long, default_value_t = 1e6)]
    pub unit_scale: f64,
}

/// Dispatch the parsed command.
pub async fn execute(cli: Cli, config: Config) -> anyhow::Result<()> {
    match cli.command {
        Commands::Audit(args) => audit::run(args, &config).await,
        Commands::Reconcile(args) => reconcile::run(args, &config).await,
        Commands::Query(args) => query::run(args, &config).await,
    }
}
