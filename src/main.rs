//! InfluxDB retention maintenance tool
//!
//! Provides CLI interface for shard backup and old-data deletion

// influxretention/src/main.rs
mod backup;
mod cli;
mod config;
mod delete;
mod errors;
mod influx;
mod shards;
mod utils;

#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use cli::{Cli, Command};
use config::{AppConfig, OperationConfig, load_backup_config, load_delete_config};
use delete::{DeleteOutcome, StdinConfirmation};
use std::process::ExitCode;
use tracing::{error, info};

/// Main entry point for the retention tool
#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Missing .env is fine; flags and the environment still apply.
    dotenv::dotenv().ok();
    utils::logging::init_logging();

    let cli = Cli::parse_args();
    match run_app(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ Error: {:?}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_app(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Backup(args) => {
            info!("🚀 Starting Backup Process...");
            let mut app_config = AppConfig::load(args.connection.config.as_deref())
                .context("Failed to load application configuration")?;
            let backup_config = load_backup_config(&app_config.raw_json_config, &args)
                .context("Failed to load backup configuration")?;
            app_config.operation = Some(OperationConfig::Backup(backup_config));

            let registry = backup::StrategyRegistry::with_defaults();
            let outcome = backup::run_backup_flow(&app_config, &registry)
                .await
                .context("Backup process failed")?;
            info!(
                "✅ Backup completed: {} eligible shard(s) by {}, {} location(s), function ran: {}",
                outcome.eligible.len(),
                outcome.filter,
                outcome.locations.len(),
                outcome.strategy_ran
            );
        }
        Command::Delete(args) => {
            info!("🗑 Starting Delete Process...");
            let mut app_config = AppConfig::load(args.connection.config.as_deref())
                .context("Failed to load application configuration")?;
            let delete_config = load_delete_config(&app_config.raw_json_config, &args)
                .context("Failed to load delete configuration")?;
            app_config.operation = Some(OperationConfig::Delete(delete_config));

            let outcome = delete::run_delete_flow(&app_config, &StdinConfirmation)
                .await
                .context("Delete process failed")?;
            match outcome {
                DeleteOutcome::Cancelled => {}
                DeleteOutcome::Completed(report) if report.is_success() => {
                    info!(
                        "✅ Delete completed for {} measurement(s), cutoff {}",
                        report.succeeded().len(),
                        report.cutoff
                    );
                }
                DeleteOutcome::Completed(report) => {
                    let failed: Vec<&str> = report.failed().iter().map(|(m, _)| *m).collect();
                    anyhow::bail!(
                        "Delete failed for {} of {} measurement(s): {:?}",
                        failed.len(),
                        report.outcomes.len(),
                        failed
                    );
                }
            }
        }
    }
    Ok(())
}
