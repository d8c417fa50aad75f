//! quorum - panel consensus for prediction markets
//!
//! Selects a panel of reasoning agents for a market briefing, runs them concurrently,
//! fuses their signals into a consensus, cross-examines outliers when the panel
//! disagrees, and turns an actionable edge into a trade recommendation.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use quorum::models::{MarketBriefing, QuorumConfig};
//! use quorum::agents::{Orchestrator, AgentCapability, AgentCatalog};
//! use quorum::store::{AnalysisStore, SqliteStore};
//! ```

pub use quorum_agents as agents;
pub use quorum_models as models;
pub use quorum_store as store;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use quorum_agents::{claude_panel, AgentCatalog, Orchestrator, PanelError, RemoteAnalyzer};
use quorum_models::briefing::MarketBriefing;
use quorum_models::config::{QuorumConfig, StoreConfig};
use quorum_models::remote::RemoteAnalysis;
use quorum_models::report::AnalysisReport;
use quorum_store::{AnalysisStore, SqliteStore};
use tokio_util::sync::CancellationToken;

pub fn load_config(path: impl AsRef<Path>) -> Result<QuorumConfig> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("Failed to parse config: {}", path.display()))
}

/// Open the SQLite-backed store, creating its parent directory if needed.
pub fn open_store(config: &StoreConfig) -> Result<Arc<AnalysisStore>> {
    if let Some(parent) = Path::new(&config.sqlite_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    let sqlite = SqliteStore::open(&config.sqlite_path)
        .with_context(|| format!("Failed to open store: {}", config.sqlite_path))?;
    Ok(Arc::new(AnalysisStore::new(
        sqlite,
        config.memory_max_capacity,
        Duration::from_secs(config.memory_ttl_seconds),
    )))
}

/// Build an Orchestrator over the default catalog with Claude-backed agents,
/// persisting every run to the configured store.
pub fn build_orchestrator(config: &QuorumConfig) -> Result<Orchestrator> {
    let store = open_store(&config.store)?;
    let catalog = AgentCatalog::default();
    let panel = claude_panel(&catalog, &config.agents);
    Ok(Orchestrator::new(config, catalog, panel).with_sink(store))
}

/// Analyze one briefing. Cancelling `cancel` stops the run and yields a canceled report.
pub async fn analyze(
    orchestrator: &Orchestrator,
    briefing: &MarketBriefing,
    cancel: CancellationToken,
) -> Result<AnalysisReport, PanelError> {
    orchestrator.analyze_with_cancel(briefing, cancel).await
}

/// Ask the configured remote endpoint to analyze a market.
pub async fn analyze_remote(config: &QuorumConfig, market_id: &str) -> Result<RemoteAnalysis> {
    let remote = config
        .remote
        .as_ref()
        .context("No [remote] section in config")?;
    let analyzer = RemoteAnalyzer::from_config(remote)?;
    Ok(analyzer.analyze(market_id).await?)
}

/// Latest stored report for a market, if any.
pub async fn latest_report(
    config: &QuorumConfig,
    market_id: &str,
) -> Result<Option<Arc<AnalysisReport>>> {
    let store = open_store(&config.store)?;
    Ok(store.latest(market_id).await?)
}
