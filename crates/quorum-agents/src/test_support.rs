//! Deterministic agent capabilities and fixtures for tests.
//!
//! `ScenarioMockAgent` reads the briefing and applies the same category rules the
//! system prompts describe, so panels built from it disagree in realistic ways.
//! The smaller mocks each isolate one behavior the coordinator has to handle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use quorum_models::briefing::{
    DataPresence, EventType, MarketBriefing, MarketStatus, BRIEFING_SCHEMA_VERSION,
};
use quorum_models::category::AgentCategory;
use quorum_models::signal::{AgentRequest, AgentSignal, SignalDirection};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::capability::AgentCapability;
use crate::catalog::AgentCatalog;
use crate::error::AgentError;

pub fn make_briefing(event_type: EventType, market_probability: f64) -> MarketBriefing {
    MarketBriefing {
        market_id: "test-market".to_string(),
        schema_version: BRIEFING_SCHEMA_VERSION,
        question: "Will the test event happen?".to_string(),
        event_type,
        market_probability,
        volume_24h: Decimal::from(25_000),
        liquidity: Decimal::from(60_000),
        status: MarketStatus::Active,
        data: DataPresence::default(),
        captured_at: Utc::now(),
    }
}

pub fn make_signal(agent_id: &str, fair_probability: f64, confidence: f64) -> AgentSignal {
    AgentSignal {
        agent_id: agent_id.to_string(),
        timestamp: Utc::now(),
        fair_probability,
        direction: SignalDirection::Neutral,
        confidence,
        key_drivers: vec![],
        risk_factors: vec![],
        metadata: serde_json::Value::Null,
    }
}

pub fn make_request(
    agent_id: &str,
    category: AgentCategory,
    briefing: MarketBriefing,
) -> AgentRequest {
    AgentRequest {
        request_id: Uuid::new_v4(),
        run_id: Uuid::nil(),
        agent_id: agent_id.to_string(),
        category,
        briefing,
        prior_signals: vec![],
        context: serde_json::Value::Null,
    }
}

fn direction_for(fair_probability: f64, market_probability: f64) -> SignalDirection {
    let delta = fair_probability - market_probability;
    if delta > 0.01 {
        SignalDirection::Yes
    } else if delta < -0.01 {
        SignalDirection::No
    } else {
        SignalDirection::Neutral
    }
}

/// Always returns the same estimate.
pub struct StaticAgent {
    pub id: String,
    pub fair_probability: f64,
    pub confidence: f64,
}

impl StaticAgent {
    pub fn new(id: &str, fair_probability: f64, confidence: f64) -> Self {
        Self {
            id: id.to_string(),
            fair_probability,
            confidence,
        }
    }
}

#[async_trait]
impl AgentCapability for StaticAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        let mut signal = make_signal(&self.id, self.fair_probability, self.confidence);
        signal.direction =
            direction_for(self.fair_probability, request.briefing.market_probability);
        Ok(signal)
    }
}

/// Always fails.
pub struct FailingAgent {
    pub id: String,
}

impl FailingAgent {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl AgentCapability for FailingAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        Err(AgentError::Cli("mock failure".to_string()))
    }
}

/// Sleeps before answering; used to trip timeouts and cancellation.
pub struct SlowAgent {
    pub id: String,
    pub delay: Duration,
}

impl SlowAgent {
    pub fn new(id: &str, delay: Duration) -> Self {
        Self {
            id: id.to_string(),
            delay,
        }
    }
}

#[async_trait]
impl AgentCapability for SlowAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        tokio::time::sleep(self.delay).await;
        Ok(make_signal(&self.id, 0.5, 0.5))
    }
}

/// Panics inside the agent task.
pub struct PanickingAgent {
    pub id: String,
}

impl PanickingAgent {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }
}

#[async_trait]
impl AgentCapability for PanickingAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, _request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        panic!("mock agent panic");
    }
}

/// Answers `initial` on the first pass and `revised` once it sees peer signals.
/// Counts invocations.
pub struct RevisingAgent {
    pub id: String,
    pub initial: f64,
    pub revised: f64,
    pub confidence: f64,
    calls: AtomicUsize,
}

impl RevisingAgent {
    pub fn new(id: &str, initial: f64, revised: f64, confidence: f64) -> Self {
        Self {
            id: id.to_string(),
            initial,
            revised,
            confidence,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AgentCapability for RevisingAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let p = if request.prior_signals.is_empty() {
            self.initial
        } else {
            self.revised
        };
        let mut signal = make_signal(&self.id, p, self.confidence);
        signal.direction = direction_for(p, request.briefing.market_probability);
        Ok(signal)
    }
}

/// Category-aware mock that leans away from the market by `lean`.
///
/// How far an agent follows the lean, and how confident it is, depends on its category
/// and on which data feeds the briefing reports. Under cross-examination it moves
/// halfway toward the mean of its peers.
pub struct ScenarioMockAgent {
    pub id: String,
    pub category: AgentCategory,
    pub lean: f64,
}

impl ScenarioMockAgent {
    pub fn new(id: &str, category: AgentCategory, lean: f64) -> Self {
        Self {
            id: id.to_string(),
            category,
            lean,
        }
    }

    /// One mock per catalog entry, all sharing the same lean.
    pub fn panel(catalog: &AgentCatalog, lean: f64) -> Vec<Arc<dyn AgentCapability>> {
        catalog
            .descriptors()
            .iter()
            .map(|d| Arc::new(Self::new(&d.id, d.category, lean)) as Arc<dyn AgentCapability>)
            .collect()
    }

    /// (lean scale, confidence, driver, risk) for this agent's category.
    fn profile(&self, briefing: &MarketBriefing) -> (f64, f64, &'static str, &'static str) {
        let data = &briefing.data;
        match self.category {
            AgentCategory::Mvp => {
                let confidence = if briefing.liquidity >= Decimal::from(50_000) {
                    0.7
                } else if briefing.liquidity < Decimal::from(10_000) {
                    0.35
                } else {
                    0.55
                };
                (
                    0.5,
                    confidence,
                    "Order book depth supports the estimate",
                    "Resolution wording is ambiguous",
                )
            }
            AgentCategory::PollingStatistical if data.polling => {
                (1.2, 0.75, "Polling aggregate shows a clear lead", "Historical polling error")
            }
            AgentCategory::EventIntelligence if data.news => {
                (
                    1.0,
                    0.65,
                    "Confirmed on-record developments",
                    "Scheduled hearing before resolution",
                )
            }
            AgentCategory::SentimentNarrative if data.news || data.social => {
                (0.8, 0.5, "Coverage tilted without new facts", "Narrative reversal")
            }
            AgentCategory::HistoricalPattern if data.historical => {
                (0.7, 0.55, "Reference class base rate", "Few comparable cases")
            }
            AgentCategory::EventScenario => {
                (0.9, 0.5, "YES-resolving scenarios dominate", "Low-probability reversal path")
            }
            AgentCategory::PriceAction => {
                (0.6, 0.4, "Informed flow on rising volume", "Thin book amplifies moves")
            }
            _ => (0.2, 0.2, "Little category-specific evidence", "Missing upstream data"),
        }
    }
}

#[async_trait]
impl AgentCapability for ScenarioMockAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        let briefing = &request.briefing;
        let (scale, confidence, driver, risk) = self.profile(briefing);
        let mut p = (briefing.market_probability + self.lean * scale).clamp(0.01, 0.99);

        let peers: Vec<f64> = request
            .prior_signals
            .iter()
            .filter(|s| s.agent_id != self.id)
            .map(|s| s.fair_probability)
            .collect();
        if !peers.is_empty() {
            let peer_mean = peers.iter().sum::<f64>() / peers.len() as f64;
            p = (p + peer_mean) / 2.0;
        }

        Ok(AgentSignal {
            agent_id: self.id.clone(),
            timestamp: Utc::now(),
            fair_probability: p,
            direction: direction_for(p, briefing.market_probability),
            confidence,
            key_drivers: vec![driver.to_string()],
            risk_factors: vec![risk.to_string()],
            metadata: serde_json::json!({
                "category": self.category,
                "revised": !peers.is_empty(),
            }),
        })
    }
}
