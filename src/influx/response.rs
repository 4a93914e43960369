// influxretention/src/influx/response.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::ShardRecord;
use crate::errors::InfluxError;

// Body of a `/query` response.
#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatementResult {
    #[serde(default)]
    pub series: Vec<Series>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Series {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl QueryResponse {
    pub fn parse(statement: &str, body: &str) -> Result<Self, InfluxError> {
        let parsed: QueryResponse = serde_json::from_str(body)
            .map_err(|e| InfluxError::Decode(format!("{} (statement: {})", e, statement)))?;
        parsed.check(statement)?;
        Ok(parsed)
    }

    /// Surfaces a top-level or statement-level `error` field as an error.
    fn check(&self, statement: &str) -> Result<(), InfluxError> {
        let message = self
            .error
            .as_ref()
            .or_else(|| self.results.iter().find_map(|r| r.error.as_ref()));
        match message {
            Some(message) => Err(InfluxError::Statement {
                statement: statement.to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Flattens every series of every statement into column -> value maps.
    pub fn points(&self) -> Vec<Map<String, Value>> {
        self.results
            .iter()
            .flat_map(|r| r.series.iter())
            .flat_map(|series| {
                series.values.iter().map(move |row| {
                    series
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect::<Map<String, Value>>()
                })
            })
            .collect()
    }
}

pub(crate) fn shard_from_point(point: &Map<String, Value>) -> Result<ShardRecord, InfluxError> {
    let id = match point.get("id") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    }
    .ok_or_else(|| InfluxError::Decode(format!("shard row has no usable id: {:?}", point)))?;

    let database = point
        .get("database")
        .and_then(Value::as_str)
        .ok_or_else(|| InfluxError::Decode(format!("shard {} has no database", id)))?
        .to_string();

    let raw_expiry = point
        .get("expiry_time")
        .and_then(Value::as_str)
        .ok_or_else(|| InfluxError::Decode(format!("shard {} has no expiry_time", id)))?;
    let expiry_time = DateTime::parse_from_rfc3339(raw_expiry)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            InfluxError::Decode(format!(
                "shard {} has invalid expiry_time '{}': {}",
                id, raw_expiry, e
            ))
        })?;

    Ok(ShardRecord {
        id,
        database,
        expiry_time,
    })
}

/// Decodes the `SHOW SHARDS` rows that belong to `database`. Rows of other
/// databases are skipped without being decoded.
pub(crate) fn shards_for_database(
    response: &QueryResponse,
    database: &str,
) -> Result<Vec<ShardRecord>, InfluxError> {
    response
        .points()
        .iter()
        .filter(|point| point.get("database").and_then(Value::as_str) == Some(database))
        .map(shard_from_point)
        .collect()
}

pub(crate) fn measurement_names(response: &QueryResponse) -> Vec<String> {
    response
        .points()
        .iter()
        .filter_map(|p| p.get("name").and_then(Value::as_str).map(str::to_string))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SHOW_SHARDS_BODY: &str = r#"{
        "results": [{
            "statement_id": 0,
            "series": [
                {
                    "name": "telegraf",
                    "columns": ["id","database","retention_policy","shard_group","start_time","end_time","expiry_time","owners"],
                    "values": [
                        [3,"telegraf","autogen",3,"2024-01-01T00:00:00Z","2024-01-08T00:00:00Z","2024-01-08T00:00:00Z",""],
                        [4,"telegraf","autogen",4,"2024-01-08T00:00:00Z","2024-01-15T00:00:00Z","2024-01-15T00:00:00Z",""]
                    ]
                },
                {
                    "name": "_internal",
                    "columns": ["id","database","retention_policy","shard_group","start_time","end_time","expiry_time","owners"],
                    "values": [
                        [1,"_internal","monitor",1,"2024-01-01T00:00:00Z","2024-01-02T00:00:00Z","2024-01-09T00:00:00Z",""]
                    ]
                }
            ]
        }]
    }"#;

    #[test]
    fn test_show_shards_flattens_all_series() -> anyhow::Result<()> {
        let response = QueryResponse::parse("SHOW SHARDS", SHOW_SHARDS_BODY)?;
        let shards = response
            .points()
            .iter()
            .map(shard_from_point)
            .collect::<Result<Vec<_>, _>>()?;

        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].id, 3);
        assert_eq!(shards[0].database, "telegraf");
        assert_eq!(
            shards[0].expiry_time,
            Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap()
        );
        assert_eq!(shards[2].database, "_internal");
        Ok(())
    }

    #[test]
    fn test_other_databases_are_not_decoded() -> anyhow::Result<()> {
        let body = r#"{"results":[{"statement_id":0,"series":[
            {"name":"_internal","columns":["id","database","expiry_time"],"values":[[1,"_internal",""],["x","_internal",null]]},
            {"name":"telegraf","columns":["id","database","expiry_time"],"values":[[3,"telegraf","2024-01-08T00:00:00Z"]]}
        ]}]}"#;
        let response = QueryResponse::parse("SHOW SHARDS", body)?;

        let shards = shards_for_database(&response, "telegraf")?;

        assert_eq!(shards.len(), 1);
        assert_eq!(shards[0].id, 3);
        assert!(shards_for_database(&response, "_internal").is_err());
        Ok(())
    }

    #[test]
    fn test_statement_error_is_surfaced() {
        let body = r#"{"results":[{"statement_id":0,"error":"database not found: nope"}]}"#;
        let err = QueryResponse::parse("SHOW MEASUREMENTS", body).unwrap_err();
        match err {
            InfluxError::Statement { statement, message } => {
                assert_eq!(statement, "SHOW MEASUREMENTS");
                assert_eq!(message, "database not found: nope");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_top_level_error_is_surfaced() {
        let body = r#"{"error":"error parsing query: found EOF"}"#;
        assert!(matches!(
            QueryResponse::parse("DELETE", body),
            Err(InfluxError::Statement { .. })
        ));
    }

    #[test]
    fn test_measurement_names() -> anyhow::Result<()> {
        let body = r#"{"results":[{"statement_id":0,"series":[{"name":"measurements","columns":["name"],"values":[["cpu"],["mem"]]}]}]}"#;
        let response = QueryResponse::parse("SHOW MEASUREMENTS", body)?;
        assert_eq!(measurement_names(&response), vec!["cpu", "mem"]);
        Ok(())
    }

    #[test]
    fn test_empty_database_has_no_measurements() -> anyhow::Result<()> {
        let body = r#"{"results":[{"statement_id":0}]}"#;
        let response = QueryResponse::parse("SHOW MEASUREMENTS", body)?;
        assert!(measurement_names(&response).is_empty());
        Ok(())
    }

    #[test]
    fn test_bad_expiry_time_is_rejected() {
        let mut point = Map::new();
        point.insert("id".into(), Value::from(7));
        point.insert("database".into(), Value::from("telegraf"));
        point.insert("expiry_time".into(), Value::from("yesterday"));
        assert!(matches!(shard_from_point(&point), Err(InfluxError::Decode(_))));
    }
}
