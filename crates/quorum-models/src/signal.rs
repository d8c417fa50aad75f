use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::briefing::MarketBriefing;
use crate::category::AgentCategory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalDirection {
    Yes,
    No,
    Neutral,
}

/// One agent's estimate for one analysis run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentSignal {
    pub agent_id: String,
    pub timestamp: DateTime<Utc>,
    /// Agent's fair probability of YES, 0.0 to 1.0.
    pub fair_probability: f64,
    pub direction: SignalDirection,
    /// 0.0 to 1.0. Zero-confidence signals never contribute to consensus.
    pub confidence: f64,
    #[serde(default)]
    pub key_drivers: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl AgentSignal {
    /// Check the numeric fields are finite and within [0, 1].
    pub fn validate(&self) -> Result<(), String> {
        if !self.fair_probability.is_finite() || !(0.0..=1.0).contains(&self.fair_probability) {
            return Err(format!(
                "fair_probability {} outside [0, 1]",
                self.fair_probability
            ));
        }
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!("confidence {} outside [0, 1]", self.confidence));
        }
        if self.agent_id.trim().is_empty() {
            return Err("agent_id is empty".to_string());
        }
        Ok(())
    }
}

/// Input handed to an agent capability.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRequest {
    pub request_id: Uuid,
    pub run_id: Uuid,
    pub agent_id: String,
    pub category: AgentCategory,
    pub briefing: MarketBriefing,
    /// Current panel signals. Empty on the first round, filled during cross-examination.
    #[serde(default)]
    pub prior_signals: Vec<AgentSignal>,
    /// Historical context supplied by the caller, passed through untouched.
    #[serde(default)]
    pub context: serde_json::Value,
}
