use crate::config::DatabaseConfig;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

pub type DbPool = Pool<Postgres>;

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}

/// Creates the readings table and its lookup index if missing.
pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS plug_readings (
            id BIGSERIAL NOT NULL,
            device_id TEXT NOT NULL,
            ts TIMESTAMPTZ NOT NULL,
            power_w DOUBLE PRECISION NOT NULL,
            voltage DOUBLE PRECISION,
            current_a DOUBLE PRECISION,
            energy_wh DOUBLE PRECISION,
            temperature_c DOUBLE PRECISION
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS plug_readings_device_ts_idx ON plug_readings (device_id, ts, id)",
    )
    .execute(pool)
    .await?;

    // Hypertable only when TimescaleDB is installed; plain Postgres works too.
    if let Err(e) =
        sqlx::query("SELECT create_hypertable('plug_readings', 'ts', if_not_exists => TRUE)")
            .execute(pool)
            .await
    {
        tracing::debug!(error = %e, "plug_readings left as a plain table");
    }

    Ok(())
}
