use super::ReadingStore;
use crate::error::Result;
use crate::models::sample::{NewSample, Sample};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Process-local store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryReadingStore {
    samples: RwLock<Vec<Sample>>,
}

impl InMemoryReadingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.samples.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.samples.read().await.is_empty()
    }
}

fn by_ts_then_id(a: &Sample, b: &Sample) -> std::cmp::Ordering {
    a.ts.cmp(&b.ts).then(a.id.cmp(&b.id))
}

#[async_trait]
impl ReadingStore for InMemoryReadingStore {
    async fn append(&self, sample: NewSample) -> Result<Sample> {
        let mut samples = self.samples.write().await;
        let id = samples.last().map(|s| s.id + 1).unwrap_or(1);
        let stored = sample.into_sample(id);
        samples.push(stored.clone());
        Ok(stored)
    }

    async fn query_range(
        &self,
        device_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Sample>> {
        let samples = self.samples.read().await;
        let mut hits: Vec<Sample> = samples
            .iter()
            .filter(|s| s.device_id == device_id && s.ts >= start && s.ts < end)
            .cloned()
            .collect();
        hits.sort_by(by_ts_then_id);
        Ok(hits)
    }

    async fn query_last_before(
        &self,
        device_id: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<Sample>> {
        let samples = self.samples.read().await;
        Ok(samples
            .iter()
            .filter(|s| s.device_id == device_id && s.ts < instant)
            .max_by(|a, b| by_ts_then_id(a, b))
            .cloned())
    }

    async fn latest(&self, limit: i64) -> Result<Vec<Sample>> {
        let samples = self.samples.read().await;
        let mut all: Vec<Sample> = samples.clone();
        all.sort_by(|a, b| by_ts_then_id(b, a));
        all.truncate(limit.max(0) as usize);
        Ok(all)
    }

    async fn since(&self, instant: DateTime<Utc>, device_id: Option<String>) -> Result<Vec<Sample>> {
        let samples = self.samples.read().await;
        let mut hits: Vec<Sample> = samples
            .iter()
            .filter(|s| s.ts >= instant)
            .filter(|s| device_id.as_deref().map_or(true, |d| s.device_id == d))
            .cloned()
            .collect();
        hits.sort_by(by_ts_then_id);
        Ok(hits)
    }
}
