use super::ReadingStore;
use crate::db::DbPool;
use crate::error::Result;
use crate::models::sample::{NewSample, Sample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

const SAMPLE_COLUMNS: &str =
    "id, device_id, ts, power_w, voltage, current_a, energy_wh, temperature_c";

#[derive(Clone)]
pub struct PgReadingRepository {
    pool: DbPool,
}

impl PgReadingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadingStore for PgReadingRepository {
    async fn append(&self, sample: NewSample) -> Result<Sample> {
        let stored = sqlx::query_as::<_, Sample>(&format!(
            r#"
            INSERT INTO plug_readings
                (device_id, ts, power_w, voltage, current_a, energy_wh, temperature_c)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            SAMPLE_COLUMNS
        ))
        .bind(&sample.device_id)
        .bind(sample.ts)
        .bind(sample.power_w)
        .bind(sample.voltage)
        .bind(sample.current_a)
        .bind(sample.energy_wh)
        .bind(sample.temperature_c)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn query_range(
        &self,
        device_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>> {
        let samples = sqlx::query_as::<_, Sample>(&format!(
            r#"
            SELECT {}
            FROM plug_readings
            WHERE device_id = $1 AND ts >= $2 AND ts < $3
            ORDER BY ts ASC, id ASC
            "#,
            SAMPLE_COLUMNS
        ))
        .bind(device_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(samples)
    }

    async fn query_last_before(
        &self,
        device_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<Sample>> {
        let sample = sqlx::query_as::<_, Sample>(&format!(
            r#"
            SELECT {}
            FROM plug_readings
            WHERE device_id = $1 AND ts < $2
            ORDER BY ts DESC, id DESC
            LIMIT 1
            "#,
            SAMPLE_COLUMNS
        ))
        .bind(device_id)
        .bind(instant)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sample)
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Sample>> {
        let samples = sqlx::query_as::<_, Sample>(&format!(
            "SELECT {} FROM plug_readings ORDER BY ts DESC, id DESC LIMIT $1",
            SAMPLE_COLUMNS
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(samples)
    }

    async fn since(&self, instant: DateTime<Utc>, device_id: Option<String>) -> Result<Vec<Sample>> {
        let samples = match device_id {
            Some(device_id) => {
                sqlx::query_as::<_, Sample>(&format!(
                    r#"
                    SELECT {}
                    FROM plug_readings
                    WHERE ts >= $1 AND device_id = $2
                    ORDER BY ts ASC, id ASC
                    "#,
                    SAMPLE_COLUMNS
                ))
                .bind(instant)
                .bind(device_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Sample>(&format!(
                    "SELECT {} FROM plug_readings WHERE ts >= $1 ORDER BY ts ASC, id ASC",
                    SAMPLE_COLUMNS
                ))
                .bind(instant)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(samples)
    }
}
