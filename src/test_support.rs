// Fakes shared by the workflow tests.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::delete::confirm::{Confirmation, is_affirmative};
use crate::errors::InfluxError;
use crate::influx::{InfluxApi, ShardRecord};

pub fn shard(id: u64, database: &str, expiry: &str) -> ShardRecord {
    ShardRecord {
        id,
        database: database.to_string(),
        expiry_time: DateTime::parse_from_rfc3339(expiry)
            .expect("valid test timestamp")
            .with_timezone(&Utc),
    }
}

/// In-memory `InfluxApi` that records every call.
pub struct FakeInflux {
    database: String,
    shards: Vec<ShardRecord>,
    measurements: Vec<String>,
    failing: HashSet<String>,
    executed: Mutex<Vec<String>>,
    shard_queries: AtomicUsize,
    measurement_queries: AtomicUsize,
}

impl FakeInflux {
    pub fn new(database: &str) -> Self {
        FakeInflux {
            database: database.to_string(),
            shards: Vec::new(),
            measurements: Vec::new(),
            failing: HashSet::new(),
            executed: Mutex::new(Vec::new()),
            shard_queries: AtomicUsize::new(0),
            measurement_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_shards(mut self, shards: Vec<ShardRecord>) -> Self {
        self.shards = shards;
        self
    }

    pub fn with_measurements(mut self, names: &[&str]) -> Self {
        self.measurements = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Statements mentioning `"<measurement>"` fail.
    pub fn failing_on(mut self, measurement: &str) -> Self {
        self.failing.insert(measurement.to_string());
        self
    }

    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().expect("executed lock").clone()
    }

    pub fn shard_queries(&self) -> usize {
        self.shard_queries.load(Ordering::SeqCst)
    }

    pub fn measurement_queries(&self) -> usize {
        self.measurement_queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InfluxApi for FakeInflux {
    fn database(&self) -> &str {
        &self.database
    }

    async fn show_shards(&self) -> Result<Vec<ShardRecord>, InfluxError> {
        self.shard_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.shards.clone())
    }

    async fn show_measurements(&self) -> Result<Vec<String>, InfluxError> {
        self.measurement_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.measurements.clone())
    }

    async fn execute(&self, statement: &str) -> Result<(), InfluxError> {
        self.executed
            .lock()
            .expect("executed lock")
            .push(statement.to_string());
        let target = self
            .failing
            .iter()
            .find(|m| statement.contains(&format!("\"{}\"", m)));
        match target {
            Some(m) => Err(InfluxError::Statement {
                statement: statement.to_string(),
                message: format!("shard for {} is read-only", m),
            }),
            None => Ok(()),
        }
    }
}

/// Answers every prompt with a fixed string and counts how often it was asked.
pub struct ScriptedConfirmation {
    answer: String,
    asked: AtomicUsize,
}

impl ScriptedConfirmation {
    pub fn answering(answer: &str) -> Self {
        ScriptedConfirmation {
            answer: answer.to_string(),
            asked: AtomicUsize::new(0),
        }
    }

    pub fn times_asked(&self) -> usize {
        self.asked.load(Ordering::SeqCst)
    }
}

impl Confirmation for ScriptedConfirmation {
    fn confirm(&self, _prompt: &str) -> anyhow::Result<bool> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        Ok(is_affirmative(&self.answer))
    }
}
