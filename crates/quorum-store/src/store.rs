use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use quorum_models::audit::AuditEntry;
use quorum_models::report::AnalysisReport;
use quorum_models::signal::AgentSignal;
use tracing::debug;

use crate::error::StoreError;
use crate::memory::MemoryCache;
use crate::sqlite::SqliteStore;

/// Receiver of finished analysis runs.
///
/// Implementations may be slow or unavailable; callers treat failures as non-fatal.
#[async_trait]
pub trait AnalysisSink: Send + Sync {
    async fn persist(&self, report: &AnalysisReport) -> Result<(), StoreError>;
}

/// Write-through store: SQLite for durability, moka for the latest run per market.
///
/// SQLite access is synchronized via `Mutex` since `rusqlite::Connection` is not `Sync`.
pub struct AnalysisStore {
    memory: MemoryCache,
    sqlite: Mutex<SqliteStore>,
}

impl AnalysisStore {
    pub fn new(sqlite: SqliteStore, max_capacity: u64, memory_ttl: Duration) -> Self {
        Self {
            memory: MemoryCache::new(max_capacity, memory_ttl),
            sqlite: Mutex::new(sqlite),
        }
    }

    fn with_sqlite<T>(
        &self,
        f: impl FnOnce(&mut SqliteStore) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut sqlite = self
            .sqlite
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("SQLite mutex poisoned: {e}")))?;
        f(&mut sqlite)
    }

    /// Latest run for a market. Checks moka first, then SQLite, promoting SQLite hits.
    pub async fn latest(&self, market_id: &str) -> Result<Option<Arc<AnalysisReport>>, StoreError> {
        if let Some(report) = self.memory.get(market_id).await {
            return Ok(Some(report));
        }

        let row = self.with_sqlite(|sqlite| sqlite.latest_for_market(market_id))?;
        if let Some(row) = row {
            let report: Arc<AnalysisReport> = Arc::new(serde_json::from_str(&row.report_json)?);
            self.memory
                .insert(market_id.to_string(), report.clone())
                .await;
            return Ok(Some(report));
        }

        Ok(None)
    }

    pub fn signals_for(&self, run_id: &str) -> Result<Vec<AgentSignal>, StoreError> {
        self.with_sqlite(|sqlite| sqlite.signals_for(run_id))
    }

    pub fn audit_for(&self, run_id: &str) -> Result<Vec<AuditEntry>, StoreError> {
        self.with_sqlite(|sqlite| sqlite.audit_for(run_id))
    }

    pub fn count_runs(&self) -> Result<usize, StoreError> {
        self.with_sqlite(|sqlite| sqlite.count_runs())
    }
}

#[async_trait]
impl AnalysisSink for AnalysisStore {
    async fn persist(&self, report: &AnalysisReport) -> Result<(), StoreError> {
        self.with_sqlite(|sqlite| sqlite.insert_report(report))?;
        self.memory
            .insert(report.market_id.clone(), Arc::new(report.clone()))
            .await;
        debug!(run_id = %report.run_id, market_id = %report.market_id, "Persisted analysis run");
        Ok(())
    }
}
