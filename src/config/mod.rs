// influxretention/src/config/mod.rs
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::{BackupArgs, ConnectionArgs, DeleteArgs};
use crate::delete::MeasurementSelection;
use crate::errors::AppError;

// Structs for deserializing the optional --config JSON file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: Option<bool>,
    pub shard_dir: Option<PathBuf>,
}

// Application's internal configuration structs
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("ssl", &self.ssl)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct BackupConfig {
    pub connection: ConnectionConfig,
    pub shard_dir: PathBuf,
    pub before: Option<i64>,
    pub shard_ids: Option<Vec<u64>>,
    pub function: String,
    pub skip_function: bool,
}

#[derive(Debug, Clone)]
pub struct DeleteConfig {
    pub connection: ConnectionConfig,
    pub before: i64,
    pub measurements: MeasurementSelection,
}

#[derive(Debug, Clone)]
pub enum OperationConfig {
    Backup(BackupConfig),
    Delete(DeleteConfig),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub operation: Option<OperationConfig>,
    pub raw_json_config: RawJsonConfig,
}

impl AppConfig {
    /// Reads the JSON config file if one was given; otherwise every value must
    /// come from flags or the environment.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let raw_json_config = match config_path {
            Some(path) => load_raw_json_config(path)?,
            None => RawJsonConfig::default(),
        };
        Ok(AppConfig {
            operation: None, // To be filled by main after parsing CLI args
            raw_json_config,
        })
    }
}

fn load_raw_json_config(config_path: &Path) -> Result<RawJsonConfig> {
    let config_content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
    serde_json::from_str(&config_content).with_context(|| {
        format!(
            "Failed to parse JSON from config file at {}",
            config_path.display()
        )
    })
}

/// Flags (and their env fallbacks) win over the config file.
pub fn resolve_connection(
    raw_config: &RawJsonConfig,
    args: &ConnectionArgs,
) -> Result<ConnectionConfig, AppError> {
    let host = args
        .host
        .clone()
        .or_else(|| raw_config.host.clone())
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| missing("host", "--host", "INFLUXDB_HOST"))?;
    let port = args
        .port
        .or(raw_config.port)
        .ok_or_else(|| missing("port", "--port", "INFLUXDB_PORT"))?;
    let database = args
        .db
        .clone()
        .or_else(|| raw_config.database.clone())
        .filter(|d| !d.trim().is_empty())
        .ok_or_else(|| missing("database", "--db", "INFLUXDB_DB"))?;

    Ok(ConnectionConfig {
        host,
        port,
        database,
        username: args.username.clone().or_else(|| raw_config.username.clone()),
        password: args.password.clone().or_else(|| raw_config.password.clone()),
        ssl: args.ssl || raw_config.ssl.unwrap_or(false),
    })
}

fn missing(what: &str, flag: &str, env: &str) -> AppError {
    AppError::Config(format!(
        "{} must be set with {}, the {} environment variable, or the config file",
        what, flag, env
    ))
}

pub fn load_backup_config(raw_config: &RawJsonConfig, args: &BackupArgs) -> Result<BackupConfig> {
    let connection = resolve_connection(raw_config, &args.connection)?;
    let shard_dir = args
        .shard_dir
        .clone()
        .or_else(|| raw_config.shard_dir.clone())
        .context("shard_dir must be set with --shard_dir, INFLUX_SHARD_DIR, or the config file")?;

    if shard_dir.to_string_lossy().is_empty() {
        return Err(anyhow::anyhow!("shard_dir cannot be empty."));
    }

    Ok(BackupConfig {
        connection,
        shard_dir,
        before: Some(args.before),
        shard_ids: args.shards.clone(),
        function: args.function.clone(),
        skip_function: args.skip_function,
    })
}

pub fn load_delete_config(raw_config: &RawJsonConfig, args: &DeleteArgs) -> Result<DeleteConfig> {
    let connection = resolve_connection(raw_config, &args.connection)?;
    let measurements = MeasurementSelection::from_args(&args.measurements)?;

    Ok(DeleteConfig {
        connection,
        before: args.before,
        measurements,
    })
}
