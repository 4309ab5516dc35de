use crate::model::{DataPoint, Extrema, Factor, Snapshot};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Time-series store of environmental readings. Recording is not
/// idempotent: duplicate delivery produces duplicate rows, which the
/// at-least-once transport accepts.
#[async_trait]
pub trait EnvironmentalStore: Send + Sync {
    /// Most recent point within the store's recency window, if any.
    async fn latest(&self, site_id: Uuid, factor: Factor) -> Result<Option<DataPoint>>;

    /// All points in `(start, end)`, ascending by timestamp.
    async fn history(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>>;

    /// Min and max value in `(start, end)`; both bounds absent when the
    /// interval holds no points.
    async fn extrema(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Extrema>;

    /// Records the components present on the snapshot.
    async fn record(&self, snapshot: &Snapshot) -> Result<()>;
}

pub struct PgEnvironmentalStore {
    pool: PgPool,
    latest_window: Duration,
}

impl PgEnvironmentalStore {
    pub fn new(pool: PgPool, latest_window_hours: i64) -> Self {
        Self {
            pool,
            latest_window: Duration::hours(latest_window_hours),
        }
    }
}

#[async_trait]
impl EnvironmentalStore for PgEnvironmentalStore {
    async fn latest(&self, site_id: Uuid, factor: Factor) -> Result<Option<DataPoint>> {
        // Factor is a closed enum, so the column name is a static string.
        let column = factor.column();
        let since = Utc::now() - self.latest_window;
        let row = sqlx::query(&format!(
            r#"
            SELECT ts, {column} AS value
            FROM environment
            WHERE site_id = $1 AND {column} IS NOT NULL AND ts > $2
            ORDER BY ts DESC
            LIMIT 1
            "#,
        ))
        .bind(site_id)
        .bind(since)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(DataPoint {
                timestamp: row.try_get("ts")?,
                value: row.try_get("value")?,
            })),
            None => Ok(None),
        }
    }

    async fn history(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DataPoint>> {
        let column = factor.column();
        let rows = sqlx::query(&format!(
            r#"
            SELECT ts, {column} AS value
            FROM environment
            WHERE site_id = $1 AND {column} IS NOT NULL AND ts > $2 AND ts < $3
            ORDER BY ts ASC
            "#,
        ))
        .bind(site_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut points = Vec::with_capacity(rows.len());
        for row in rows {
            points.push(DataPoint {
                timestamp: row.try_get("ts")?,
                value: row.try_get("value")?,
            });
        }
        Ok(points)
    }

    async fn extrema(
        &self,
        site_id: Uuid,
        factor: Factor,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Extrema> {
        let column = factor.column();
        let row = sqlx::query(&format!(
            r#"
            SELECT min({column}) AS min_value, max({column}) AS max_value
            FROM environment
            WHERE site_id = $1 AND ts > $2 AND ts < $3
            "#,
        ))
        .bind(site_id)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(Extrema {
            min_value: row.try_get("min_value")?,
            max_value: row.try_get("max_value")?,
        })
    }

    async fn record(&self, snapshot: &Snapshot) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO environment (site_id, ts, temperature, humidity)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(snapshot.site_id)
        .bind(snapshot.timestamp)
        .bind(snapshot.temperature)
        .bind(snapshot.humidity)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
