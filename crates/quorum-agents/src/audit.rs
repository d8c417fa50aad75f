use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::Utc;
use quorum_models::audit::{AuditEntry, AuditStage, AuditStatus};

/// Append-only audit log for one run.
///
/// Safe to share across concurrent agent tasks. Entries keep arrival order; `sequence`
/// is assigned under the lock so it always matches position in the log.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Mutex<Vec<AuditEntry>>,
    next_sequence: AtomicU64,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &self,
        stage: AuditStage,
        status: AuditStatus,
        message: impl Into<String>,
        details: serde_json::Value,
    ) {
        let message = message.into();
        // A poisoned lock still holds every entry appended so far.
        let mut entries = match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let sequence = self.next_sequence.fetch_add(1, Ordering::SeqCst);
        entries.push(AuditEntry {
            sequence,
            stage,
            timestamp: Utc::now(),
            status,
            message,
            details,
        });
    }

    pub fn ok(&self, stage: AuditStage, message: impl Into<String>, details: serde_json::Value) {
        self.record(stage, AuditStatus::Ok, message, details);
    }

    /// Snapshot in arrival order.
    pub fn entries(&self) -> Vec<AuditEntry> {
        match self.entries.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Snapshot re-sorted by logical stage, arrival order within a stage.
    pub fn sorted_by_stage(&self) -> Vec<AuditEntry> {
        let mut entries = self.entries();
        entries.sort_by_key(|e| (e.stage, e.sequence));
        entries
    }

    pub fn len(&self) -> usize {
        self.next_sequence.load(Ordering::SeqCst) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if any entry for `stage` carries `status`.
    pub fn contains(&self, stage: AuditStage, status: AuditStatus) -> bool {
        self.entries()
            .iter()
            .any(|e| e.stage == stage && e.status == status)
    }
}
