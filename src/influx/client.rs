// influxretention/src/influx/client.rs
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::response::{QueryResponse, measurement_names, shards_for_database};
use super::{InfluxApi, ShardRecord};
use crate::config::ConnectionConfig;
use crate::errors::{AppError, InfluxError};

/// A session scoped to one database.
///
/// Acquired with [`InfluxSession::connect`] and released with
/// [`InfluxSession::close`]. Dropping the session without closing it releases
/// it too, so `?` early returns never leak the underlying client.
pub struct InfluxSession {
    http: reqwest::Client,
    base_url: Url,
    database: String,
    credentials: Option<(String, String)>,
    released: bool,
}

impl InfluxSession {
    /// Builds the client for `host:port` and checks `/ping` once. No retry.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, AppError> {
        let scheme = if config.ssl { "https" } else { "http" };
        let base_url = Url::parse(&format!("{}://{}:{}/", scheme, config.host, config.port))?;
        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(password)) => Some((user.clone(), password.clone())),
            (Some(user), None) => Some((user.clone(), String::new())),
            _ => None,
        };

        let session = InfluxSession {
            http: reqwest::Client::new(),
            base_url,
            database: config.database.clone(),
            credentials,
            released: false,
        };
        session.ping().await?;
        info!(
            "Connected to InfluxDB at {}:{} (database: {})",
            config.host, config.port, config.database
        );
        Ok(session)
    }

    /// Releases the session. Consuming `self` makes a second release impossible.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            debug!("Closed InfluxDB session for database {}", self.database);
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, InfluxError> {
        self.base_url
            .join(path)
            .map_err(|e| InfluxError::Decode(format!("invalid endpoint {}: {}", path, e)))
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        match &self.credentials {
            Some((user, password)) => vec![("u", user.clone()), ("p", password.clone())],
            None => Vec::new(),
        }
    }

    async fn ping(&self) -> Result<(), InfluxError> {
        let response = self.http.get(self.endpoint("ping")?).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(InfluxError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// Read-only statement via GET. `scoped` adds the `db` parameter.
    async fn read(&self, statement: &str, scoped: bool) -> Result<QueryResponse, InfluxError> {
        let mut params = self.auth_params();
        params.push(("q", statement.to_string()));
        if scoped {
            params.push(("db", self.database.clone()));
        }
        let response = self
            .http
            .get(self.endpoint("query")?)
            .query(&params)
            .send()
            .await?;
        Self::decode(statement, response).await
    }

    async fn decode(
        statement: &str,
        response: reqwest::Response,
    ) -> Result<QueryResponse, InfluxError> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(InfluxError::Status {
                status: status.as_u16(),
                body,
            });
        }
        QueryResponse::parse(statement, &body)
    }
}

impl Drop for InfluxSession {
    fn drop(&mut self) {
        self.release();
    }
}

#[async_trait]
impl InfluxApi for InfluxSession {
    fn database(&self) -> &str {
        &self.database
    }

    async fn show_shards(&self) -> Result<Vec<ShardRecord>, InfluxError> {
        let response = self.read("SHOW SHARDS", false).await?;
        shards_for_database(&response, &self.database)
    }

    async fn show_measurements(&self) -> Result<Vec<String>, InfluxError> {
        let response = self.read("SHOW MEASUREMENTS", true).await?;
        Ok(measurement_names(&response))
    }

    async fn execute(&self, statement: &str) -> Result<(), InfluxError> {
        let mut params = self.auth_params();
        params.push(("db", self.database.clone()));
        let response = self
            .http
            .post(self.endpoint("query")?)
            .query(&params)
            .form(&[("q", statement)])
            .send()
            .await?;
        Self::decode(statement, response).await.map(|_| ())
    }
}
