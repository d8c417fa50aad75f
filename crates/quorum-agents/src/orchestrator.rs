use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use quorum_models::audit::{AuditStage, AuditStatus};
use quorum_models::briefing::MarketBriefing;
use quorum_models::config::{ConsensusConfig, QuorumConfig, SelectionConfig};
use quorum_models::consensus::ConsensusResult;
use quorum_models::report::{AnalysisReport, RunOutcome};
use quorum_models::signal::AgentSignal;
use quorum_store::AnalysisSink;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::capability::AgentCapability;
use crate::catalog::{AgentCatalog, BriefingDataOracle, DataAvailability};
use crate::coordinator::{build_request, successful, Coordinator};
use crate::cross_exam::{cross_examine, CrossExamPolicy, RoundContext};
use crate::error::{Halt, PanelError};
use crate::fusion::fuse;
use crate::recommendation::{build_recommendation, Decision};
use crate::selection::select_agents;

/// What the pipeline had produced when it stopped.
#[derive(Default)]
struct RunState {
    selected: Vec<String>,
    signals: Vec<AgentSignal>,
    consensus: Option<ConsensusResult>,
}

/// Runs the full selection → execution → fusion → cross-examination → recommendation
/// pipeline for one market at a time.
pub struct Orchestrator {
    catalog: AgentCatalog,
    oracle: Arc<dyn DataAvailability>,
    coordinator: Coordinator,
    sink: Option<Arc<dyn AnalysisSink>>,
    selection: SelectionConfig,
    consensus: ConsensusConfig,
    total_timeout: Duration,
    persist_timeout: Duration,
}

impl Orchestrator {
    pub fn new(
        config: &QuorumConfig,
        catalog: AgentCatalog,
        capabilities: impl IntoIterator<Item = Arc<dyn AgentCapability>>,
    ) -> Self {
        Self {
            catalog,
            oracle: Arc::new(BriefingDataOracle),
            coordinator: Coordinator::with_capabilities(
                capabilities,
                Duration::from_secs(config.agents.agent_timeout_seconds),
            ),
            sink: None,
            selection: config.selection.clone(),
            consensus: config.consensus.clone(),
            total_timeout: Duration::from_secs(config.agents.total_timeout_seconds),
            persist_timeout: Duration::from_secs(config.agents.persist_timeout_seconds),
        }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn DataAvailability>) -> Self {
        self.oracle = oracle;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn AnalysisSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Override the whole-run deadline.
    pub fn with_total_timeout(mut self, total_timeout: Duration) -> Self {
        self.total_timeout = total_timeout;
        self
    }

    pub fn catalog(&self) -> &AgentCatalog {
        &self.catalog
    }

    pub async fn analyze(&self, briefing: &MarketBriefing) -> Result<AnalysisReport, PanelError> {
        self.analyze_with_cancel(briefing, CancellationToken::new())
            .await
    }

    /// Analyze one market.
    ///
    /// Returns a report for recommended, no-action and canceled runs. The fatal kinds
    /// (invalid briefing, no agents, insufficient signals) come back as `Err` after a
    /// failed report has been handed to the sink.
    pub async fn analyze_with_cancel(
        &self,
        briefing: &MarketBriefing,
        cancel: CancellationToken,
    ) -> Result<AnalysisReport, PanelError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        info!(market_id = %briefing.market_id, %run_id, "Starting analysis");

        let audit = Arc::new(AuditLog::new());
        let run_cancel = cancel.child_token();
        let deadline = {
            let token = run_cancel.clone();
            let total = self.total_timeout;
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(total) => token.cancel(),
                    _ = token.cancelled() => {}
                }
            })
        };

        let mut state = RunState::default();
        let result = self
            .run_pipeline(run_id, briefing, &audit, &run_cancel, &mut state)
            .await;
        deadline.abort();

        let (outcome, fatal) = match result {
            Ok(outcome) => (outcome, None),
            Err(Halt::Canceled) => {
                let reason = if cancel.is_cancelled() {
                    "canceled by caller"
                } else {
                    "run deadline exceeded"
                };
                warn!(market_id = %briefing.market_id, %run_id, reason, "Analysis canceled");
                audit.record(
                    AuditStage::Run,
                    AuditStatus::Canceled,
                    reason,
                    json!({ "total_timeout_seconds": self.total_timeout.as_secs() }),
                );
                (RunOutcome::Canceled, None)
            }
            Err(Halt::Fatal(e)) => {
                error!(
                    market_id = %briefing.market_id,
                    %run_id,
                    kind = e.kind(),
                    error = %e,
                    "Analysis failed"
                );
                audit.record(
                    AuditStage::Run,
                    AuditStatus::Failed,
                    e.to_string(),
                    json!({ "kind": e.kind() }),
                );
                let outcome = RunOutcome::Failed {
                    kind: e.kind().to_string(),
                    message: e.to_string(),
                };
                (outcome, Some(e))
            }
        };

        let report = AnalysisReport {
            run_id,
            market_id: briefing.market_id.clone(),
            selected_agents: state.selected,
            outcome,
            consensus: state.consensus,
            signals: state.signals,
            audit: audit.entries(),
            started_at,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            market_id = %report.market_id,
            %run_id,
            outcome = report.outcome.label(),
            elapsed_ms = report.processing_time_ms,
            "Analysis complete"
        );

        self.persist(&report).await;
        match fatal {
            Some(e) => Err(e),
            None => Ok(report),
        }
    }

    async fn run_pipeline(
        &self,
        run_id: Uuid,
        briefing: &MarketBriefing,
        audit: &Arc<AuditLog>,
        cancel: &CancellationToken,
        state: &mut RunState,
    ) -> Result<RunOutcome, Halt> {
        briefing.validate().map_err(PanelError::InvalidBriefing)?;
        let min_agents = self.selection.min_agents_required;

        let selection = select_agents(
            briefing,
            &self.selection,
            &self.catalog,
            self.oracle.as_ref(),
            audit,
        )?;
        state.selected = selection.ids();

        let requests = selection
            .agents
            .iter()
            .map(|d| build_request(run_id, d, briefing, vec![], serde_json::Value::Null))
            .collect();
        let outcomes = self
            .coordinator
            .run_round(AuditStage::Execution, requests, audit, cancel)
            .await?;
        let attempted = outcomes.len();
        state.signals = successful(outcomes);
        let received = state.signals.len();
        audit.record(
            AuditStage::Execution,
            if received < attempted {
                AuditStatus::Degraded
            } else {
                AuditStatus::Ok
            },
            format!("{received} of {attempted} agents returned signals"),
            json!({ "attempted": attempted, "received": received }),
        );

        let initial = fuse(&state.signals, briefing.market_probability, min_agents).map_err(
            |e| {
                audit.record(
                    AuditStage::Fusion,
                    AuditStatus::Failed,
                    e.to_string(),
                    json!({ "required": min_agents, "received": received }),
                );
                e
            },
        )?;
        audit.ok(
            AuditStage::Fusion,
            format!(
                "consensus {:.3} vs market {:.3}",
                initial.consensus_probability, initial.market_probability
            ),
            json!({
                "consensus_probability": initial.consensus_probability,
                "edge": initial.edge,
                "disagreement": initial.disagreement,
                "confidence_band": initial.confidence_band,
                "contributing": initial.signal_count(),
            }),
        );
        state.consensus = Some(initial.clone());

        let policy = CrossExamPolicy {
            high_disagreement_threshold: self.consensus.high_disagreement_threshold,
            max_rounds: self.consensus.max_cross_exam_rounds,
            min_agents_required: min_agents,
        };
        let ctx = RoundContext {
            run_id,
            briefing,
            selection: &selection,
            coordinator: &self.coordinator,
            audit,
            cancel,
        };
        let consensus = cross_examine(initial, policy, &ctx).await?;
        if consensus.cross_examined {
            // Zero-confidence signals never contribute, so they are not revised either.
            let mut signals: Vec<AgentSignal> = state
                .signals
                .iter()
                .filter(|s| s.confidence <= 0.0)
                .cloned()
                .collect();
            signals.extend(consensus.signals.iter().cloned());
            state.signals = signals;
        }
        state.consensus = Some(consensus.clone());

        if cancel.is_cancelled() {
            return Err(Halt::Canceled);
        }

        match build_recommendation(&consensus, briefing, &self.consensus, min_agents)? {
            Decision::Trade(recommendation) => {
                info!(
                    market_id = %briefing.market_id,
                    direction = ?recommendation.direction,
                    edge = consensus.edge,
                    "Recommendation built"
                );
                audit.ok(
                    AuditStage::Recommendation,
                    format!("{:?} with edge {:+.3}", recommendation.direction, consensus.edge),
                    json!({
                        "direction": recommendation.direction,
                        "expected_value": recommendation.expected_value,
                        "liquidity_risk": recommendation.liquidity_risk,
                    }),
                );
                Ok(RunOutcome::Recommended {
                    recommendation: *recommendation,
                })
            }
            Decision::NoAction { edge, threshold } => {
                debug!(market_id = %briefing.market_id, edge, threshold, "No actionable edge");
                audit.record(
                    AuditStage::Recommendation,
                    AuditStatus::NoAction,
                    format!("edge {edge:+.3} below threshold {threshold:.3}"),
                    json!({ "edge": edge, "threshold": threshold }),
                );
                Ok(RunOutcome::NoAction { edge, threshold })
            }
        }
    }

    /// Hand the report to the sink. Never fails the run.
    async fn persist(&self, report: &AnalysisReport) {
        let Some(sink) = &self.sink else {
            return;
        };
        match tokio::time::timeout(self.persist_timeout, sink.persist(report)).await {
            Ok(Ok(())) => debug!(run_id = %report.run_id, "Analysis run persisted"),
            Ok(Err(e)) => {
                warn!(run_id = %report.run_id, error = %e, "Failed to persist analysis run")
            }
            Err(_) => warn!(
                run_id = %report.run_id,
                timeout_secs = self.persist_timeout.as_secs(),
                "Persisting analysis run timed out"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{make_briefing, FailingAgent, SlowAgent, StaticAgent};
    use async_trait::async_trait;
    use quorum_models::briefing::EventType;
    use quorum_store::StoreError;
    use std::sync::Mutex;

    /// Sink that keeps what it is given, or refuses everything.
    struct RecordingSink {
        reports: Mutex<Vec<AnalysisReport>>,
        fail: bool,
    }

    impl RecordingSink {
        fn new(fail: bool) -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl AnalysisSink for RecordingSink {
        async fn persist(&self, report: &AnalysisReport) -> Result<(), StoreError> {
            if self.fail {
                return Err(StoreError::Unavailable("sink down".to_string()));
            }
            self.reports.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn mvp_catalog_config() -> QuorumConfig {
        let mut config = QuorumConfig::default();
        config.selection.categories = quorum_models::config::CategoryToggles::all_disabled();
        config
    }

    fn mvp_agents(p: [f64; 3]) -> Vec<Arc<dyn AgentCapability>> {
        vec![
            Arc::new(StaticAgent::new("market_microstructure", p[0], 0.7)),
            Arc::new(StaticAgent::new("probability_baseline", p[1], 0.7)),
            Arc::new(StaticAgent::new("risk_assessment", p[2], 0.7)),
        ]
    }

    #[tokio::test]
    async fn recommended_run_is_persisted() {
        let sink = Arc::new(RecordingSink::new(false));
        let orchestrator = Orchestrator::new(
            &mvp_catalog_config(),
            AgentCatalog::default(),
            mvp_agents([0.62, 0.64, 0.60]),
        )
        .with_sink(sink.clone());

        let report = orchestrator
            .analyze(&make_briefing(EventType::Other, 0.50))
            .await
            .unwrap();

        assert_eq!(report.outcome.label(), "recommended");
        assert_eq!(report.selected_agents.len(), 3);
        assert_eq!(report.signals.len(), 3);
        let stages: Vec<_> = report.audit.iter().map(|e| e.stage).collect();
        assert!(stages.contains(&AuditStage::Selection));
        assert!(stages.contains(&AuditStage::Recommendation));
        assert_eq!(sink.reports.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insufficient_signals_is_fatal_and_persisted() {
        let sink = Arc::new(RecordingSink::new(false));
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(StaticAgent::new("market_microstructure", 0.6, 0.7)),
            Arc::new(FailingAgent::new("probability_baseline")),
            Arc::new(FailingAgent::new("risk_assessment")),
        ];
        let orchestrator =
            Orchestrator::new(&mvp_catalog_config(), AgentCatalog::default(), agents)
                .with_sink(sink.clone());

        let err = orchestrator
            .analyze(&make_briefing(EventType::Other, 0.5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "insufficient_signals");

        let persisted = sink.reports.lock().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].outcome.label(), "failed");
        assert!(persisted[0].recommendation().is_none());
    }

    #[tokio::test]
    async fn out_of_range_market_probability_is_fatal_and_persisted() {
        let sink = Arc::new(RecordingSink::new(false));
        let orchestrator = Orchestrator::new(
            &mvp_catalog_config(),
            AgentCatalog::default(),
            mvp_agents([0.6, 0.6, 0.6]),
        )
        .with_sink(sink.clone());

        let err = orchestrator
            .analyze(&make_briefing(EventType::Other, 1.7))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "invalid_briefing");

        let persisted = sink.reports.lock().unwrap();
        assert_eq!(persisted.len(), 1);
        assert_eq!(persisted[0].outcome.label(), "failed");
        assert!(persisted[0].recommendation().is_none());
        assert!(persisted[0].selected_agents.is_empty());
        assert!(persisted[0]
            .audit
            .iter()
            .any(|e| e.stage == AuditStage::Run && e.status == AuditStatus::Failed));
    }

    #[tokio::test]
    async fn sink_failure_does_not_fail_run() {
        let orchestrator = Orchestrator::new(
            &mvp_catalog_config(),
            AgentCatalog::default(),
            mvp_agents([0.51, 0.50, 0.52]),
        )
        .with_sink(Arc::new(RecordingSink::new(true)));

        let report = orchestrator
            .analyze(&make_briefing(EventType::Other, 0.50))
            .await
            .unwrap();
        assert_eq!(report.outcome.label(), "no_action");
    }

    #[tokio::test]
    async fn caller_cancel_reports_canceled() {
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(SlowAgent::new("market_microstructure", Duration::from_secs(30))),
            Arc::new(SlowAgent::new("probability_baseline", Duration::from_secs(30))),
            Arc::new(SlowAgent::new("risk_assessment", Duration::from_secs(30))),
        ];
        let orchestrator =
            Orchestrator::new(&mvp_catalog_config(), AgentCatalog::default(), agents);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let report = orchestrator
            .analyze_with_cancel(&make_briefing(EventType::Other, 0.5), cancel)
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Canceled);
        assert!(report
            .audit
            .iter()
            .any(|e| e.stage == AuditStage::Run && e.status == AuditStatus::Canceled));
    }

    #[tokio::test]
    async fn deadline_cancels_run() {
        let agents: Vec<Arc<dyn AgentCapability>> = vec![
            Arc::new(SlowAgent::new("market_microstructure", Duration::from_secs(30))),
            Arc::new(StaticAgent::new("probability_baseline", 0.6, 0.7)),
            Arc::new(StaticAgent::new("risk_assessment", 0.6, 0.7)),
        ];
        let orchestrator =
            Orchestrator::new(&mvp_catalog_config(), AgentCatalog::default(), agents)
                .with_total_timeout(Duration::from_millis(100));

        let start = Instant::now();
        let report = orchestrator
            .analyze(&make_briefing(EventType::Other, 0.5))
            .await
            .unwrap();
        assert_eq!(report.outcome, RunOutcome::Canceled);
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(report
            .audit
            .iter()
            .any(|e| e.message == "run deadline exceeded"));
    }
}
