// influxretention/src/backup/logic.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

use super::strategies::BackupStrategy;
use crate::config::BackupConfig;
use crate::errors::AppError;
use crate::influx::{InfluxApi, ShardRecord};
use crate::shards::{ShardFilter, get_eligible_shards};

/// What a backup run resolved, and whether the backup function ran.
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub filter: ShardFilter,
    pub eligible: Vec<ShardRecord>,
    pub locations: Vec<PathBuf>,
    pub strategy_ran: bool,
}

pub fn ensure_shard_dir(shard_dir: &Path) -> Result<(), AppError> {
    if !shard_dir.is_dir() {
        return Err(AppError::ShardDirMissing(shard_dir.to_path_buf()));
    }
    Ok(())
}

/// Names of the immediate subdirectories of `shard_dir`, sorted.
///
/// Entries that cannot be stat'ed (e.g. dangling symlinks) are logged and
/// skipped; only failing to read `shard_dir` itself is an error.
pub fn list_shard_dirs(shard_dir: &Path) -> Result<Vec<String>> {
    ensure_shard_dir(shard_dir)?;

    let mut names = Vec::new();
    for entry in WalkDir::new(shard_dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                warn!("Skipping unreadable entry in {}: {}", shard_dir.display(), e);
                continue;
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to walk directory: {}", shard_dir.display()));
            }
        };
        if entry.file_type().is_dir() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

/// `shard_dir/<id>` for every eligible shard that has a directory on disk,
/// in eligibility order.
pub fn shard_locations(shard_dir: &Path, eligible: &[ShardRecord], on_disk: &[String]) -> Vec<PathBuf> {
    eligible
        .iter()
        .map(|shard| shard.id.to_string())
        .filter(|id| on_disk.iter().any(|name| name == id))
        .map(|id| shard_dir.join(id))
        .collect()
}

/// Resolves eligible shard locations and hands them to `strategy` unless
/// `skip_function` is set.
pub async fn perform_backup<A: InfluxApi + ?Sized>(
    api: &A,
    config: &BackupConfig,
    strategy: &dyn BackupStrategy,
    now: DateTime<Utc>,
) -> Result<BackupOutcome> {
    let filter = ShardFilter::choose(config.before, config.shard_ids.as_deref(), now)?;
    let eligible = get_eligible_shards(api, &filter)
        .await
        .context("Failed to query the shard catalog")?;

    let actual_shard_list = list_shard_dirs(&config.shard_dir)?;
    info!("shard id folders inside shard_dir is {:?}", actual_shard_list);

    for shard in &eligible {
        info!(
            "eligible_shard is {{id: {}, database: {}, expiry_time: {}}}",
            shard.id,
            shard.database,
            shard.expiry_time.format("%Y-%m-%dT%H:%M:%SZ")
        );
    }
    let locations = shard_locations(&config.shard_dir, &eligible, &actual_shard_list);

    info!("Backup function called");
    info!("Host: {}", config.connection.host);
    info!("Port: {}", config.connection.port);
    info!("Database: {}", config.connection.database);
    info!("Shard Directory: {}", config.shard_dir.display());
    info!("Before: {:?}", filter.before());
    info!("Shard: {:?}", config.shard_ids);
    info!("Function: {}", config.function);
    info!("Skip Function: {}", config.skip_function);
    info!("eligible shard location list is {:?}", locations);

    let strategy_ran = if config.skip_function {
        false
    } else {
        strategy
            .run(&locations)
            .await
            .map_err(|e| AppError::Strategy {
                name: config.function.clone(),
                reason: format!("{:#}", e),
            })?;
        true
    };

    Ok(BackupOutcome {
        filter,
        eligible,
        locations,
        strategy_ran,
    })
}
