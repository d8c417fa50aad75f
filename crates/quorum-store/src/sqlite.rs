use chrono::Utc;
use quorum_models::audit::AuditEntry;
use quorum_models::report::AnalysisReport;
use quorum_models::signal::AgentSignal;
use quorum_models::store_schema::{RunRow, STORE_TABLE_DDL};
use rusqlite::Connection;

use crate::error::StoreError;

/// SQLite-backed record of analysis runs.
///
/// Each run is written once, in a single transaction, together with its signals and
/// audit entries. Rows are never updated afterward.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store file. Creates the schema and enables WAL mode.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(STORE_TABLE_DDL)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Useful for testing.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(STORE_TABLE_DDL)?;
        Ok(Self { conn })
    }

    /// Write a run with its signals and audit log.
    pub fn insert_report(&mut self, report: &AnalysisReport) -> Result<(), StoreError> {
        let report_json = serde_json::to_string(report)?;
        let run_id = report.run_id.to_string();
        let completed_at = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO analysis_runs \
             (run_id, market_id, outcome, report_json, started_at, completed_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            rusqlite::params![
                run_id,
                report.market_id,
                report.outcome.label(),
                report_json,
                report.started_at.to_rfc3339(),
                completed_at,
            ],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO agent_signals \
                 (run_id, agent_id, fair_probability, confidence, signal_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for signal in &report.signals {
                stmt.execute(rusqlite::params![
                    run_id,
                    signal.agent_id,
                    signal.fair_probability,
                    signal.confidence,
                    serde_json::to_string(signal)?,
                ])?;
            }
        }
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO audit_log (run_id, sequence, stage, status, entry_json) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for entry in &report.audit {
                stmt.execute(rusqlite::params![
                    run_id,
                    entry.sequence as i64,
                    serde_json::to_value(entry.stage)?.as_str().unwrap_or_default(),
                    serde_json::to_value(entry.status)?.as_str().unwrap_or_default(),
                    serde_json::to_string(entry)?,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Most recently completed run for a market.
    pub fn latest_for_market(&self, market_id: &str) -> Result<Option<RunRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT run_id, market_id, outcome, report_json, started_at, completed_at \
             FROM analysis_runs WHERE market_id = ?1 \
             ORDER BY rowid DESC LIMIT 1",
        )?;

        let result = stmt.query_row(rusqlite::params![market_id], map_run_row);
        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    pub fn get_run(&self, run_id: &str) -> Result<Option<RunRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT run_id, market_id, outcome, report_json, started_at, completed_at \
             FROM analysis_runs WHERE run_id = ?1",
        )?;

        let result = stmt.query_row(rusqlite::params![run_id], map_run_row);
        match result {
            Ok(row) => Ok(Some(row)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::Sqlite(e)),
        }
    }

    /// Signals of a run, ordered by agent id.
    pub fn signals_for(&self, run_id: &str) -> Result<Vec<AgentSignal>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT signal_json FROM agent_signals WHERE run_id = ?1 ORDER BY agent_id",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }

    /// Audit entries of a run in arrival order.
    pub fn audit_for(&self, run_id: &str) -> Result<Vec<AuditEntry>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT entry_json FROM audit_log WHERE run_id = ?1 ORDER BY sequence",
        )?;
        let rows = stmt
            .query_map(rusqlite::params![run_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|json| serde_json::from_str(json).map_err(StoreError::from))
            .collect()
    }

    pub fn count_runs(&self) -> Result<usize, StoreError> {
        let count: usize =
            self.conn
                .query_row("SELECT COUNT(*) FROM analysis_runs", [], |row| row.get(0))?;
        Ok(count)
    }
}

fn map_run_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRow> {
    Ok(RunRow {
        run_id: row.get(0)?,
        market_id: row.get(1)?,
        outcome: row.get(2)?,
        report_json: row.get(3)?,
        started_at: row.get(4)?,
        completed_at: row.get(5)?,
    })
}
