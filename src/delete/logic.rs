// influxretention/src/delete/logic.rs
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, warn};

use super::MeasurementSelection;
use super::confirm::{Confirmation, DELETE_PROMPT};
use crate::errors::{AppError, InfluxError};
use crate::influx::InfluxApi;
use crate::shards::retention_cutoff;

/// Roughly three months. Deleting anything younger is refused.
pub const MINIMUM_DELETE_BEFORE_MINUTES: i64 = 131400;

pub fn check_retention_guardrail(before: i64) -> Result<(), AppError> {
    if before < MINIMUM_DELETE_BEFORE_MINUTES {
        return Err(AppError::Guardrail {
            before,
            minimum: MINIMUM_DELETE_BEFORE_MINUTES,
        });
    }
    Ok(())
}

/// Timestamp literal used in delete predicates, e.g. `2024-03-02T06:00:00.000000Z`.
pub fn format_cutoff(cutoff: DateTime<Utc>) -> String {
    cutoff.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn delete_statement(measurement: &str, cutoff: DateTime<Utc>) -> String {
    format!(
        "DELETE FROM \"{}\" WHERE time < '{}'",
        measurement.replace('\\', "\\\\").replace('"', "\\\""),
        format_cutoff(cutoff)
    )
}

/// Per-measurement results of one delete run, in the order they were issued.
#[derive(Debug)]
pub struct DeleteReport {
    pub cutoff: DateTime<Utc>,
    pub outcomes: Vec<(String, Result<(), InfluxError>)>,
}

impl DeleteReport {
    pub fn succeeded(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, r)| r.is_ok())
            .map(|(m, _)| m.as_str())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&str, &InfluxError)> {
        self.outcomes
            .iter()
            .filter_map(|(m, r)| r.as_ref().err().map(|e| (m.as_str(), e)))
            .collect()
    }

    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|(_, r)| r.is_ok())
    }
}

#[derive(Debug)]
pub enum DeleteOutcome {
    /// The operator did not answer `yes`; nothing was deleted.
    Cancelled,
    Completed(DeleteReport),
}

/// Guardrail, confirmation, then one `DELETE` per measurement.
///
/// The cutoff is taken from `clock` once the operator has confirmed, so time
/// spent at the prompt is not counted. A failing measurement does not stop the
/// remaining ones; every outcome is collected in the returned report. Listing
/// measurements for `all` is the only database failure that aborts the run.
pub async fn perform_delete<A, C, F>(
    api: &A,
    confirmation: &C,
    before: i64,
    measurements: &MeasurementSelection,
    clock: F,
) -> Result<DeleteOutcome>
where
    A: InfluxApi + ?Sized,
    C: Confirmation + ?Sized,
    F: Fn() -> DateTime<Utc>,
{
    check_retention_guardrail(before)?;
    retention_cutoff(clock(), before)?;

    if !confirmation.confirm(DELETE_PROMPT)? {
        info!("Delete operation cancelled.");
        return Ok(DeleteOutcome::Cancelled);
    }

    let names = match measurements {
        MeasurementSelection::All => api
            .show_measurements()
            .await
            .with_context(|| format!("Failed to list measurements in {}", api.database()))?,
        MeasurementSelection::Named(names) => names.clone(),
    };
    info!("deleting measurements {:?}", names);
    if names.is_empty() {
        warn!("No measurements found in database {}; nothing to delete", api.database());
    }

    let cutoff = retention_cutoff(clock(), before)?;
    info!("Deleting data older than {} (before = {} minutes)", format_cutoff(cutoff), before);

    let mut outcomes = Vec::with_capacity(names.len());
    for measurement in names {
        let statement = delete_statement(&measurement, cutoff);
        let result = api.execute(&statement).await;
        match &result {
            Ok(()) => info!("✓ {}", statement),
            Err(e) => error!("❌ Failed to delete from {}: {}", measurement, e),
        }
        outcomes.push((measurement, result));
    }

    let report = DeleteReport { cutoff, outcomes };
    info!("Deleted measurements: {:?}", report.succeeded());
    if !report.is_success() {
        let failed: Vec<&str> = report.failed().iter().map(|(m, _)| *m).collect();
        error!("Failed measurements: {:?}", failed);
    }
    Ok(DeleteOutcome::Completed(report))
}
