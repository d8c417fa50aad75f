use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use quorum_models::audit::{AuditStage, AuditStatus};
use quorum_models::briefing::MarketBriefing;
use quorum_models::signal::{AgentRequest, AgentSignal};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::capability::AgentCapability;
use crate::catalog::AgentDescriptor;
use crate::error::AgentError;

/// The run was canceled while agents were in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Canceled;

/// Settled result of one agent invocation.
#[derive(Debug)]
pub struct AgentOutcome {
    pub agent_id: String,
    pub elapsed_ms: u64,
    pub result: Result<AgentSignal, AgentError>,
}

/// Successful signals of a round, in request order.
pub fn successful(outcomes: Vec<AgentOutcome>) -> Vec<AgentSignal> {
    outcomes.into_iter().filter_map(|o| o.result.ok()).collect()
}

pub fn build_request(
    run_id: Uuid,
    descriptor: &AgentDescriptor,
    briefing: &MarketBriefing,
    prior_signals: Vec<AgentSignal>,
    context: serde_json::Value,
) -> AgentRequest {
    AgentRequest {
        request_id: Uuid::new_v4(),
        run_id,
        agent_id: descriptor.id.clone(),
        category: descriptor.category,
        briefing: briefing.clone(),
        prior_signals,
        context,
    }
}

/// Runs agents concurrently, each isolated under its own timeout.
pub struct Coordinator {
    capabilities: HashMap<String, Arc<dyn AgentCapability>>,
    agent_timeout: Duration,
}

impl Coordinator {
    pub fn new(agent_timeout: Duration) -> Self {
        Self {
            capabilities: HashMap::new(),
            agent_timeout,
        }
    }

    pub fn with_capabilities(
        capabilities: impl IntoIterator<Item = Arc<dyn AgentCapability>>,
        agent_timeout: Duration,
    ) -> Self {
        let mut coordinator = Self::new(agent_timeout);
        for capability in capabilities {
            coordinator.register(capability);
        }
        coordinator
    }

    /// Register a capability under its own id, replacing any previous one.
    pub fn register(&mut self, capability: Arc<dyn AgentCapability>) {
        self.capabilities
            .insert(capability.id().to_string(), capability);
    }

    pub fn is_registered(&self, agent_id: &str) -> bool {
        self.capabilities.contains_key(agent_id)
    }

    pub fn agent_timeout(&self) -> Duration {
        self.agent_timeout
    }

    /// Fan out `requests` and wait for every one to settle.
    ///
    /// Failures never abort siblings; each is recorded in `audit` under `stage` as it
    /// arrives. If `cancel` fires first, in-flight tasks are aborted and nothing is returned.
    pub async fn run_round(
        &self,
        stage: AuditStage,
        requests: Vec<AgentRequest>,
        audit: &Arc<AuditLog>,
        cancel: &CancellationToken,
    ) -> Result<Vec<AgentOutcome>, Canceled> {
        if cancel.is_cancelled() {
            return Err(Canceled);
        }

        let ids: Vec<String> = requests.iter().map(|r| r.agent_id.clone()).collect();
        let mut handles = Vec::with_capacity(requests.len());
        for request in requests {
            let capability = self.capabilities.get(&request.agent_id).cloned();
            let timeout = self.agent_timeout;
            let audit = Arc::clone(audit);

            handles.push(tokio::spawn(async move {
                let start = Instant::now();
                let result = invoke_checked(capability, &request, timeout).await;
                let elapsed_ms = start.elapsed().as_millis() as u64;
                record_outcome(&audit, stage, &request.agent_id, elapsed_ms, &result);
                AgentOutcome {
                    agent_id: request.agent_id,
                    elapsed_ms,
                    result,
                }
            }));
        }
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();

        let settle = async {
            let mut outcomes = Vec::with_capacity(handles.len());
            for (agent_id, handle) in ids.into_iter().zip(handles) {
                match handle.await {
                    Ok(outcome) => outcomes.push(outcome),
                    Err(e) => {
                        error!(agent = %agent_id, error = %e, "Agent task panicked");
                        let result = Err(AgentError::Task(e.to_string()));
                        record_outcome(audit, stage, &agent_id, 0, &result);
                        outcomes.push(AgentOutcome {
                            agent_id,
                            elapsed_ms: 0,
                            result,
                        });
                    }
                }
            }
            outcomes
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                for handle in &abort_handles {
                    handle.abort();
                }
                warn!(?stage, in_flight = abort_handles.len(), "Round canceled, abandoning agents");
                Err(Canceled)
            }
            outcomes = settle => Ok(outcomes),
        }
    }
}

async fn invoke_checked(
    capability: Option<Arc<dyn AgentCapability>>,
    request: &AgentRequest,
    timeout: Duration,
) -> Result<AgentSignal, AgentError> {
    let capability =
        capability.ok_or_else(|| AgentError::Unregistered(request.agent_id.clone()))?;

    let signal = tokio::time::timeout(timeout, capability.invoke(request))
        .await
        .map_err(|_| AgentError::Timeout(timeout.as_secs()))??;

    if signal.agent_id != request.agent_id {
        return Err(AgentError::InvalidSignal(format!(
            "signal attributed to {} instead of {}",
            signal.agent_id, request.agent_id
        )));
    }
    signal.validate().map_err(AgentError::InvalidSignal)?;
    Ok(signal)
}

fn record_outcome(
    audit: &AuditLog,
    stage: AuditStage,
    agent_id: &str,
    elapsed_ms: u64,
    result: &Result<AgentSignal, AgentError>,
) {
    match result {
        Ok(signal) => {
            info!(
                agent = %agent_id,
                fair_probability = signal.fair_probability,
                confidence = signal.confidence,
                elapsed_ms,
                "Agent succeeded"
            );
            audit.ok(
                stage,
                format!("{agent_id}: signal received"),
                json!({
                    "agent": agent_id,
                    "fair_probability": signal.fair_probability,
                    "confidence": signal.confidence,
                    "elapsed_ms": elapsed_ms,
                }),
            );
        }
        Err(e) => {
            warn!(agent = %agent_id, error = %e, elapsed_ms, "Agent failed");
            audit.record(
                stage,
                AuditStatus::Failed,
                format!("{agent_id}: {e}"),
                json!({ "agent": agent_id, "error": e.to_string(), "elapsed_ms": elapsed_ms }),
            );
        }
    }
}
