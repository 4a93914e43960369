use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("InfluxDB error: {0}")]
    Influx(#[from] InfluxError),

    #[error("The 'before' argument in the delete command must not be less than {minimum} (got {before}).")]
    Guardrail { before: i64, minimum: i64 },

    #[error("Shard directory does not exist or is not a directory: {}", .0.display())]
    ShardDirMissing(PathBuf),

    #[error("Unknown backup function '{name}'. Registered functions: {known}")]
    UnknownStrategy { name: String, known: String },

    #[error("Backup function '{name}' failed: {reason}")]
    Strategy { name: String, reason: String },
}

/// Failures talking to the database. Always fatal, never retried.
#[derive(Error, Debug)]
pub enum InfluxError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("InfluxDB returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Statement '{statement}' failed: {message}")]
    Statement { statement: String, message: String },

    #[error("Malformed response: {0}")]
    Decode(String),
}
