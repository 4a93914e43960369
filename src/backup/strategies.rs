// influxretention/src/backup/strategies.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::errors::AppError;

/// A named backup function that receives the resolved shard locations.
///
/// This tool never moves shard data itself; strategies decide what happens
/// to the locations.
#[async_trait]
pub trait BackupStrategy: Send + Sync {
    async fn run(&self, locations: &[PathBuf]) -> Result<()>;
}

/// Logs every location and nothing else.
pub struct LogLocations;

#[async_trait]
impl BackupStrategy for LogLocations {
    async fn run(&self, locations: &[PathBuf]) -> Result<()> {
        info!("Executing custom function");
        for location in locations {
            info!("shard location: {}", location.display());
        }
        Ok(())
    }
}

/// Prints the locations as a JSON array on stdout for an external copy tool.
pub struct JsonLocations;

impl JsonLocations {
    pub fn render(locations: &[PathBuf]) -> Result<String> {
        let paths: Vec<String> = locations
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        serde_json::to_string(&paths).context("Failed to serialize shard locations")
    }
}

#[async_trait]
impl BackupStrategy for JsonLocations {
    async fn run(&self, locations: &[PathBuf]) -> Result<()> {
        println!("{}", Self::render(locations)?);
        Ok(())
    }
}

/// Fixed name -> strategy table. Names from the command line are only ever
/// looked up here.
#[derive(Default)]
pub struct StrategyRegistry {
    strategies: BTreeMap<String, Arc<dyn BackupStrategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// The strategies shipped with the binary.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let log: Arc<dyn BackupStrategy> = Arc::new(LogLocations);
        registry.register("log", log.clone());
        registry.register("custom_function", log);
        registry.register("json", Arc::new(JsonLocations));
        registry
    }

    /// Last registration for a name wins.
    pub fn register(&mut self, name: &str, strategy: Arc<dyn BackupStrategy>) {
        self.strategies.insert(name.to_string(), strategy);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn BackupStrategy>, AppError> {
        self.strategies
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::UnknownStrategy {
                name: name.to_string(),
                known: self.names().join(", "),
            })
    }

    pub fn names(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }
}
