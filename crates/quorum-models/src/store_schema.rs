/// SQLite schema for persisted analysis runs.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS analysis_runs (
///     run_id          TEXT PRIMARY KEY,
///     market_id       TEXT NOT NULL,
///     outcome         TEXT NOT NULL,
///     report_json     TEXT NOT NULL,
///     started_at      TEXT NOT NULL,
///     completed_at    TEXT NOT NULL
/// );
///
/// CREATE TABLE IF NOT EXISTS agent_signals (
///     run_id          TEXT NOT NULL,
///     agent_id        TEXT NOT NULL,
///     fair_probability REAL NOT NULL,
///     confidence      REAL NOT NULL,
///     signal_json     TEXT NOT NULL,
///     PRIMARY KEY (run_id, agent_id)
/// );
///
/// CREATE TABLE IF NOT EXISTS audit_log (
///     run_id          TEXT NOT NULL,
///     sequence        INTEGER NOT NULL,
///     stage           TEXT NOT NULL,
///     status          TEXT NOT NULL,
///     entry_json      TEXT NOT NULL,
///     PRIMARY KEY (run_id, sequence)
/// );
/// ```
pub const STORE_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS analysis_runs (
    run_id          TEXT PRIMARY KEY,
    market_id       TEXT NOT NULL,
    outcome         TEXT NOT NULL,
    report_json     TEXT NOT NULL,
    started_at      TEXT NOT NULL,
    completed_at    TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS agent_signals (
    run_id           TEXT NOT NULL,
    agent_id         TEXT NOT NULL,
    fair_probability REAL NOT NULL,
    confidence       REAL NOT NULL,
    signal_json      TEXT NOT NULL,
    PRIMARY KEY (run_id, agent_id)
);
CREATE TABLE IF NOT EXISTS audit_log (
    run_id          TEXT NOT NULL,
    sequence        INTEGER NOT NULL,
    stage           TEXT NOT NULL,
    status          TEXT NOT NULL,
    entry_json      TEXT NOT NULL,
    PRIMARY KEY (run_id, sequence)
);
CREATE INDEX IF NOT EXISTS idx_runs_market ON analysis_runs(market_id, completed_at);
CREATE INDEX IF NOT EXISTS idx_audit_stage ON audit_log(stage);
";

/// A raw analysis_runs row as read from SQLite.
#[derive(Debug, Clone)]
pub struct RunRow {
    pub run_id: String,
    pub market_id: String,
    pub outcome: String,
    pub report_json: String,
    pub started_at: String,
    pub completed_at: String,
}
