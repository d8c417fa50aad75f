use serde::{Deserialize, Serialize};

use crate::recommendation::TradeRecommendation;
use crate::signal::AgentSignal;

/// Body posted to a remote analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteRequest {
    pub market_id: String,
}

/// Validated response from a remote analysis endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAnalysis {
    pub recommendation: Option<TradeRecommendation>,
    pub agent_signals: Vec<AgentSignal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}
