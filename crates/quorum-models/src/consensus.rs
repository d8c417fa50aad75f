use serde::{Deserialize, Serialize};

use crate::signal::AgentSignal;

/// Weighted one-standard-deviation interval around the consensus probability, clamped to [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceBand {
    pub low: f64,
    pub high: f64,
}

impl ConfidenceBand {
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsensusRegime {
    HighConfidence,
    ModerateConfidence,
    HighUncertainty,
}

impl ConsensusRegime {
    pub fn from_band(band: &ConfidenceBand) -> Self {
        let width = band.width();
        if width < 0.10 {
            ConsensusRegime::HighConfidence
        } else if width < 0.20 {
            ConsensusRegime::ModerateConfidence
        } else {
            ConsensusRegime::HighUncertainty
        }
    }
}

/// Fused estimate over one snapshot of the signal set.
///
/// Always rebuilt from scratch when the signal set changes; never patched in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConsensusResult {
    pub consensus_probability: f64,
    pub market_probability: f64,
    /// consensus - market.
    pub edge: f64,
    pub confidence_band: ConfidenceBand,
    /// Unweighted population standard deviation of contributing fair probabilities.
    pub disagreement: f64,
    pub regime: ConsensusRegime,
    /// Contributing signals, ordered by agent id.
    pub signals: Vec<AgentSignal>,
    pub cross_examined: bool,
    pub cross_exam_rounds: u32,
}

impl ConsensusResult {
    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn agent_ids(&self) -> Vec<String> {
        self.signals.iter().map(|s| s.agent_id.clone()).collect()
    }
}
