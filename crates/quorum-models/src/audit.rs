use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pipeline stage that produced an audit entry. Ordering follows the pipeline.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    Selection,
    Execution,
    Fusion,
    CrossExamination,
    Recommendation,
    Run,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Ok,
    Degraded,
    Excluded,
    Failed,
    NoAction,
    Canceled,
}

/// One append-only record of a stage decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Arrival order within the run, starting at 0.
    pub sequence: u64,
    pub stage: AuditStage,
    pub timestamp: DateTime<Utc>,
    pub status: AuditStatus,
    pub message: String,
    #[serde(default)]
    pub details: serde_json::Value,
}
