use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::AuditEntry;
use crate::consensus::ConsensusResult;
use crate::recommendation::TradeRecommendation;
use crate::signal::AgentSignal;

/// How a run ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    Recommended { recommendation: TradeRecommendation },
    /// Consensus was built but |edge| stayed under the action threshold.
    NoAction { edge: f64, threshold: f64 },
    Canceled,
    /// A fatal error ended the run; `kind` is the stable error kind.
    Failed { kind: String, message: String },
}

impl RunOutcome {
    pub fn recommendation(&self) -> Option<&TradeRecommendation> {
        match self {
            RunOutcome::Recommended { recommendation } => Some(recommendation),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RunOutcome::Recommended { .. } => "recommended",
            RunOutcome::NoAction { .. } => "no_action",
            RunOutcome::Canceled => "canceled",
            RunOutcome::Failed { .. } => "failed",
        }
    }
}

/// Everything one analysis run produced. This is what gets persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisReport {
    pub run_id: Uuid,
    pub market_id: String,
    pub selected_agents: Vec<String>,
    pub outcome: RunOutcome,
    pub consensus: Option<ConsensusResult>,
    /// Final signal set (after cross-examination, if it ran).
    pub signals: Vec<AgentSignal>,
    pub audit: Vec<AuditEntry>,
    pub started_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl AnalysisReport {
    pub fn recommendation(&self) -> Option<&TradeRecommendation> {
        self.outcome.recommendation()
    }
}
