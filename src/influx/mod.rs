// influxretention/src/influx/mod.rs
pub(crate) mod client;
pub(crate) mod response;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::InfluxError;

pub use client::InfluxSession;

/// One row of the `SHOW SHARDS` catalog. Never mutated by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardRecord {
    pub id: u64,
    pub database: String,
    pub expiry_time: DateTime<Utc>,
}

/// The three statements the maintenance workflows need from the database.
///
/// `InfluxSession` is the production implementation; tests swap in a
/// recording fake.
#[async_trait]
pub trait InfluxApi: Send + Sync {
    /// Database the session is scoped to.
    fn database(&self) -> &str;

    /// Shard catalog rows in server order. Only the scoped database's rows
    /// are guaranteed to be present and well formed.
    async fn show_shards(&self) -> Result<Vec<ShardRecord>, InfluxError>;

    /// Measurement names in the scoped database.
    async fn show_measurements(&self) -> Result<Vec<String>, InfluxError>;

    /// Runs a mutating statement against the scoped database.
    async fn execute(&self, statement: &str) -> Result<(), InfluxError>;
}
