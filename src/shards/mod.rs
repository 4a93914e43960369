// influxretention/src/shards/mod.rs
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;
use tracing::info;

use crate::errors::{AppError, InfluxError};
use crate::influx::{InfluxApi, ShardRecord};

/// `now` minus `minutes`. Values that leave chrono's range are a config error.
pub fn retention_cutoff(now: DateTime<Utc>, minutes: i64) -> Result<DateTime<Utc>, AppError> {
    TimeDelta::try_minutes(minutes)
        .and_then(|delta| now.checked_sub_signed(delta))
        .ok_or_else(|| {
            AppError::Config(format!(
                "'before' of {} minutes is out of range for a timestamp",
                minutes
            ))
        })
}

/// The selection that was actually applied to the shard catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShardFilter {
    ExpiredBefore { minutes: i64, cutoff: DateTime<Utc> },
    ByIds(Vec<u64>),
}

impl ShardFilter {
    /// Explicit ids win whenever they are given; `before` is then ignored.
    pub fn choose(
        before: Option<i64>,
        shard_ids: Option<&[u64]>,
        now: DateTime<Utc>,
    ) -> Result<Self, AppError> {
        let filter = match (shard_ids, before) {
            (Some(ids), _) => ShardFilter::ByIds(ids.to_vec()),
            (None, Some(minutes)) => ShardFilter::ExpiredBefore {
                minutes,
                cutoff: retention_cutoff(now, minutes)?,
            },
            (None, None) => ShardFilter::ExpiredBefore {
                minutes: 0,
                cutoff: now,
            },
        };
        Ok(filter)
    }

    /// The `before` value used for filtering; `None` on the id path.
    pub fn before(&self) -> Option<i64> {
        match self {
            ShardFilter::ExpiredBefore { minutes, .. } => Some(*minutes),
            ShardFilter::ByIds(_) => None,
        }
    }

    pub fn matches(&self, shard: &ShardRecord) -> bool {
        match self {
            ShardFilter::ExpiredBefore { cutoff, .. } => shard.expiry_time < *cutoff,
            ShardFilter::ByIds(ids) => ids.contains(&shard.id),
        }
    }
}

impl fmt::Display for ShardFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardFilter::ExpiredBefore { minutes, cutoff } => write!(
                f,
                "expiry_time < {} (before = {} minutes)",
                cutoff.format("%Y-%m-%dT%H:%M:%SZ"),
                minutes
            ),
            ShardFilter::ByIds(ids) => write!(f, "shard id in {:?}", ids),
        }
    }
}

/// Keeps catalog rows of `database` that pass `filter`, in catalog order.
pub fn filter_shards(catalog: Vec<ShardRecord>, database: &str, filter: &ShardFilter) -> Vec<ShardRecord> {
    catalog
        .into_iter()
        .filter(|shard| shard.database == database && filter.matches(shard))
        .collect()
}

/// Runs one `SHOW SHARDS` and filters it client-side for the session's database.
pub async fn get_eligible_shards<A: InfluxApi + ?Sized>(
    api: &A,
    filter: &ShardFilter,
) -> Result<Vec<ShardRecord>, InfluxError> {
    let catalog = api.show_shards().await?;
    let total = catalog.len();
    let eligible = filter_shards(catalog, api.database(), filter);
    info!(
        "{} of {} shards in catalog are eligible for database {} ({})",
        eligible.len(),
        total,
        api.database(),
        filter
    );
    Ok(eligible)
}
