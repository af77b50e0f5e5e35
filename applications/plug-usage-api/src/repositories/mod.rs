pub mod memory;
pub mod readings;

pub use memory::InMemoryReadingStore;
pub use readings::PgReadingRepository;

use crate::error::Result;
use crate::models::sample::{NewSample, Sample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only per-device reading store.
///
/// Every method that returns several samples orders them by `(ts, id)`, where
/// `id` is the insertion sequence assigned by `append`. Failures surface as
/// `AppError::UpstreamUnavailable`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReadingStore: Send + Sync {
    async fn append(&self, sample: NewSample) -> Result<Sample>;

    /// Samples with `start <= ts < end`, ascending.
    async fn query_range(
        &self,
        device_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>>;

    /// The greatest `(ts, id)` with `ts < instant`.
    async fn query_last_before(
        &self,
        device_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<Sample>>;

    /// Newest first, across all devices.
    async fn latest(&self, limit: i64) -> Result<Vec<Sample>>;

    /// Samples with `ts >= instant`, ascending, optionally for one device.
    async fn since(&self, instant: DateTime<Utc>, device_id: Option<String>) -> Result<Vec<Sample>>;
}
