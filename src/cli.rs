//! CLI argument definitions using clap
//!
//! Commands:
//! - influx-retention backup --host H --port P --db D --shard_dir DIR [--before N] [--shards ID...] --function NAME [--skip_function]
//! - influx-retention delete --host H --port P --db D --before N --measurements NAME...

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Default age, in minutes, of shards picked up by `backup` when no shard ids are given.
pub const DEFAULT_BACKUP_BEFORE_MINUTES: i64 = 10080;

/// Retention maintenance for InfluxDB: back up expired shards, delete old data
#[derive(Parser, Debug)]
#[command(name = "influx-retention")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve expired shard directories and hand them to a backup function
    Backup(BackupArgs),

    /// Delete measurement data older than a retention cutoff
    Delete(DeleteArgs),
}

/// Connection flags shared by every subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Optional JSON file providing connection defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Host name
    #[arg(long, env = "INFLUXDB_HOST")]
    pub host: Option<String>,

    /// Port number
    #[arg(long, env = "INFLUXDB_PORT")]
    pub port: Option<u16>,

    /// Database name
    #[arg(long, env = "INFLUXDB_DB")]
    pub db: Option<String>,

    #[arg(long, env = "INFLUXDB_USERNAME")]
    pub username: Option<String>,

    #[arg(long, env = "INFLUXDB_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Talk to the database over https
    #[arg(long)]
    pub ssl: bool,
}

#[derive(Args, Debug, Clone)]
pub struct BackupArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Directory whose immediate subdirectories are named by shard id
    #[arg(long = "shard_dir", env = "INFLUX_SHARD_DIR")]
    pub shard_dir: Option<PathBuf>,

    /// Select shards that expired more than this many minutes ago
    #[arg(long, default_value_t = DEFAULT_BACKUP_BEFORE_MINUTES, allow_negative_numbers = true)]
    pub before: i64,

    /// Select these shard ids instead; takes priority over --before
    #[arg(long, num_args = 1..)]
    pub shards: Option<Vec<u64>>,

    /// Registered backup function receiving the shard locations
    #[arg(long, alias = "backup_function")]
    pub function: String,

    /// Resolve locations but do not run the backup function
    #[arg(long = "skip_function", alias = "dry_run")]
    pub skip_function: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Delete data older than this many minutes
    #[arg(long, allow_negative_numbers = true)]
    pub before: i64,

    /// Measurement names, or `all` for every measurement in the database
    #[arg(long, num_args = 1.., required = true)]
    pub measurements: Vec<String>,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
