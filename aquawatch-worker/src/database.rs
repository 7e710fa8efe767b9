//! Postgres data source
//!
//! Read-only query contract consumed from the surrounding system:
//! the latest reading per sensor, the limits table, and the global
//! alarm config singleton. Schema is owned by external collaborators;
//! only the config table name varies across deployments and is
//! therefore injected from configuration.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::time::Duration;

use aquawatch_core::{GlobalAlarmConfig, LimitEntry, SensorReading};

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
    config_table: String,
}

#[derive(sqlx::FromRow)]
struct ReadingRow {
    sensor_id: i64,
    tag: Option<String>,
    value: Option<f64>,
    ts: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LimitRow {
    tag: String,
    limit: f64,
}

impl Database {
    pub async fn connect(database_url: &str, config_table: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;

        Ok(Self {
            pool,
            config_table: config_table.to_string(),
        })
    }

    /// Most recent reading per sensor. Tag falls back from the
    /// measurement row to its JSON meta, then to the sensor's own tag.
    pub async fn latest_reading_per_sensor(&self) -> Result<Vec<SensorReading>> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT DISTINCT ON (s.id)
                s.id::bigint AS sensor_id,
                COALESCE(m.tag, m.meta->>'tag', s.tag) AS tag,
                m.value::float8 AS value,
                m.ts
            FROM eta.sensor s
            JOIN eta.measurement m ON m.sensor_id = s.id
            ORDER BY s.id, m.ts DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("querying latest reading per sensor")?;

        Ok(rows
            .into_iter()
            .map(|row| SensorReading {
                sensor_id: row.sensor_id,
                tag: row.tag.unwrap_or_default(),
                value: row.value,
                ts: row.ts,
            })
            .collect())
    }

    /// The persisted limits table, keyed by exact raw tag.
    pub async fn read_limits(&self) -> Result<Vec<LimitEntry>> {
        let rows = sqlx::query_as::<_, LimitRow>(
            r#"
            SELECT tag, limite::float8 AS "limit"
            FROM eta.config_limites
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("querying limits table")?;

        Ok(rows
            .into_iter()
            .map(|row| LimitEntry {
                tag: row.tag,
                limit: row.limit,
            })
            .collect())
    }

    /// The global alarm config singleton, or `None` when the row is
    /// absent. The caller applies the fail-closed policy on both
    /// absence and read failure.
    pub async fn read_global_config(&self) -> Result<Option<GlobalAlarmConfig>> {
        let query = format!(
            "SELECT alarms_enabled, limites_json FROM {} WHERE id = 1",
            self.config_table
        );

        let row = sqlx::query(&query)
            .fetch_optional(&self.pool)
            .await
            .context("querying global alarm config")?;

        let Some(row) = row else {
            return Ok(None);
        };

        let alarms_enabled: bool = row.try_get("alarms_enabled")?;
        let overrides_json: Option<serde_json::Value> = row.try_get("limites_json")?;
        let overrides = overrides_json.as_ref().map(parse_overrides);

        Ok(Some(GlobalAlarmConfig {
            alarms_enabled,
            overrides,
        }))
    }
}

/// Tolerant parse of the config row's override map: keys lowercased,
/// values accepted as JSON numbers or numeric strings, anything else
/// dropped.
pub fn parse_overrides(value: &serde_json::Value) -> HashMap<String, f64> {
    let Some(object) = value.as_object() else {
        return HashMap::new();
    };

    object
        .iter()
        .filter_map(|(tag, raw)| coerce_limit(raw).map(|limit| (tag.to_lowercase(), limit)))
        .collect()
}

fn coerce_limit(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_overrides_numbers_and_strings() {
        let overrides = parse_overrides(&json!({
            "Qualidade/PH": 7.5,
            "nivel/reservatorio": "21000",
            "bombeamento/vazao": "  350.5 ",
        }));

        assert_eq!(overrides.get("qualidade/ph"), Some(&7.5));
        assert_eq!(overrides.get("nivel/reservatorio"), Some(&21000.0));
        assert_eq!(overrides.get("bombeamento/vazao"), Some(&350.5));
    }

    #[test]
    fn test_parse_overrides_drops_garbage() {
        let overrides = parse_overrides(&json!({
            "qualidade/ph": "not-a-number",
            "decantacao/turbidez": null,
            "pressao/linha1": [1, 2],
            "qualidade/cloro": 400,
        }));

        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides.get("qualidade/cloro"), Some(&400.0));
    }

    #[test]
    fn test_parse_overrides_non_object_is_empty() {
        assert!(parse_overrides(&json!([1, 2, 3])).is_empty());
        assert!(parse_overrides(&json!("x")).is_empty());
    }
}
