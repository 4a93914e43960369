pub(crate) mod confirm;
mod logic;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::config::{AppConfig, DeleteConfig, OperationConfig};
use crate::errors::AppError;
use crate::influx::InfluxSession;
use crate::shards::retention_cutoff;

pub use confirm::{Confirmation, StdinConfirmation};
pub use logic::{DeleteOutcome, check_retention_guardrail, perform_delete};

/// Which measurements a delete run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementSelection {
    /// Every measurement the database lists when the run starts.
    All,
    Named(Vec<String>),
}

impl MeasurementSelection {
    /// `all` on its own selects everything; otherwise names are taken literally.
    pub fn from_args(names: &[String]) -> Result<Self, AppError> {
        match names {
            [] => Err(AppError::Config(
                "at least one measurement (or 'all') must be given".to_string(),
            )),
            [only] if only == "all" => Ok(MeasurementSelection::All),
            _ => Ok(MeasurementSelection::Named(names.to_vec())),
        }
    }
}

/// Public entry point for the delete process.
pub async fn run_delete_flow(
    app_config: &AppConfig,
    confirmation: &dyn Confirmation,
) -> Result<DeleteOutcome> {
    let delete_config = match &app_config.operation {
        Some(OperationConfig::Delete(cfg)) => cfg,
        _ => anyhow::bail!("Delete operation selected but no delete configuration found."),
    };
    delete(delete_config, confirmation).await
}

async fn delete(config: &DeleteConfig, confirmation: &dyn Confirmation) -> Result<DeleteOutcome> {
    // Refuse before touching the network.
    check_retention_guardrail(config.before)?;
    retention_cutoff(Utc::now(), config.before)?;

    let session = InfluxSession::connect(&config.connection)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to InfluxDB at {}:{}",
                config.connection.host, config.connection.port
            )
        })?;

    let outcome = perform_delete(
        &session,
        confirmation,
        config.before,
        &config.measurements,
        Utc::now,
    )
    .await?;

    for line in parameter_summary(&outcome, config) {
        info!("{}", line);
    }

    session.close();
    Ok(outcome)
}

/// Run parameters logged after a delete that went ahead; empty when cancelled.
fn parameter_summary(outcome: &DeleteOutcome, config: &DeleteConfig) -> Vec<String> {
    match outcome {
        DeleteOutcome::Cancelled => Vec::new(),
        DeleteOutcome::Completed(_) => vec![
            "Delete function called".to_string(),
            format!("Host: {}", config.connection.host),
            format!("Port: {}", config.connection.port),
            format!("Database: {}", config.connection.database),
            format!("Before: {}", config.before),
            format!("Measurements: {:?}", config.measurements),
        ],
    }
}
