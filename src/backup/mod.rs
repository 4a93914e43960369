mod logic;
pub(crate) mod strategies;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::config::{AppConfig, OperationConfig};
use crate::influx::InfluxSession;
use crate::shards::ShardFilter;

pub use logic::{BackupOutcome, ensure_shard_dir, perform_backup};
pub use strategies::StrategyRegistry;

/// Public entry point for the backup process.
///
/// The backup function name, the shard directory and the range of `before`
/// are all checked before a connection is opened.
pub async fn run_backup_flow(
    app_config: &AppConfig,
    registry: &StrategyRegistry,
) -> Result<BackupOutcome> {
    let backup_config = match &app_config.operation {
        Some(OperationConfig::Backup(cfg)) => cfg,
        _ => anyhow::bail!("Backup operation selected but no backup configuration found."),
    };

    let strategy = registry.resolve(&backup_config.function)?;
    ensure_shard_dir(&backup_config.shard_dir)?;
    ShardFilter::choose(backup_config.before, backup_config.shard_ids.as_deref(), Utc::now())?;

    let session = InfluxSession::connect(&backup_config.connection)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to InfluxDB at {}:{}",
                backup_config.connection.host, backup_config.connection.port
            )
        })?;

    let outcome = perform_backup(&session, backup_config, strategy.as_ref(), Utc::now()).await?;

    session.close();
    Ok(outcome)
}
