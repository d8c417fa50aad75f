use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consensus::{ConfidenceBand, ConsensusRegime};

pub const OUTPUT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeDirection {
    LongYes,
    LongNo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityRisk {
    Low,
    Medium,
    High,
}

/// Probability interval on the YES price scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProbabilityZone {
    pub low: f64,
    pub high: f64,
}

impl From<ConfidenceBand> for ProbabilityZone {
    fn from(band: ConfidenceBand) -> Self {
        Self {
            low: band.low,
            high: band.high,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explanation {
    pub summary: String,
    pub core_thesis: String,
    pub catalysts: Vec<String>,
    pub failure_scenarios: Vec<String>,
}

/// Consensus values echoed onto the recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationMetadata {
    pub consensus_probability: f64,
    pub market_probability: f64,
    pub edge: f64,
    pub confidence_band: ConfidenceBand,
    pub disagreement: f64,
    pub regime: ConsensusRegime,
    pub contributing_agents: Vec<String>,
    pub cross_examined: bool,
}

/// Terminal artifact of one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecommendation {
    pub id: Uuid,
    pub schema_version: u32,
    pub market_id: String,
    pub direction: TradeDirection,
    pub entry_zone: ProbabilityZone,
    pub target_zone: ProbabilityZone,
    /// Expected profit per $1 contract bought at the market price of the chosen side:
    /// `win_probability` minus that price.
    pub expected_value: f64,
    pub win_probability: f64,
    pub liquidity_risk: LiquidityRisk,
    pub explanation: Explanation,
    pub metadata: RecommendationMetadata,
    pub created_at: DateTime<Utc>,
}
