use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use quorum_models::report::AnalysisReport;

/// In-memory cache of the latest run per market, backed by moka.
///
/// Entries are evicted after TTL; SQLite remains the record of truth.
pub struct MemoryCache {
    inner: Cache<String, Arc<AnalysisReport>>,
}

impl MemoryCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub async fn get(&self, market_id: &str) -> Option<Arc<AnalysisReport>> {
        self.inner.get(market_id).await
    }

    pub async fn insert(&self, market_id: String, report: Arc<AnalysisReport>) {
        self.inner.insert(market_id, report).await;
    }
}
