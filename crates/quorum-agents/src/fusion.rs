use quorum_models::consensus::{ConfidenceBand, ConsensusRegime, ConsensusResult};
use quorum_models::signal::AgentSignal;

use crate::error::PanelError;

/// Fuse a signal set into a fresh consensus.
///
/// Zero-confidence signals are dropped before anything else, including the
/// minimum-agent gate. Contributing signals are ordered by agent id so the result is
/// independent of arrival order.
pub fn fuse(
    signals: &[AgentSignal],
    market_probability: f64,
    min_agents_required: usize,
) -> Result<ConsensusResult, PanelError> {
    let mut contributing: Vec<AgentSignal> = signals
        .iter()
        .filter(|s| s.confidence > 0.0)
        .cloned()
        .collect();
    contributing.sort_by(|a, b| {
        a.agent_id
            .cmp(&b.agent_id)
            .then(a.fair_probability.total_cmp(&b.fair_probability))
    });

    let required = min_agents_required.max(1);
    if contributing.len() < required {
        return Err(PanelError::InsufficientSignals {
            required,
            available: contributing.len(),
        });
    }

    let consensus = weighted_mean(&contributing);
    let spread = weighted_std(&contributing, consensus);
    let confidence_band = ConfidenceBand {
        low: (consensus - spread).clamp(0.0, 1.0),
        high: (consensus + spread).clamp(0.0, 1.0),
    };

    Ok(ConsensusResult {
        consensus_probability: consensus,
        market_probability,
        edge: consensus - market_probability,
        regime: ConsensusRegime::from_band(&confidence_band),
        confidence_band,
        disagreement: disagreement(&contributing),
        signals: contributing,
        cross_examined: false,
        cross_exam_rounds: 0,
    })
}

/// Confidence-weighted mean, pinned inside the observed range.
fn weighted_mean(signals: &[AgentSignal]) -> f64 {
    let total_weight: f64 = signals.iter().map(|s| s.confidence).sum();
    let weighted: f64 = signals
        .iter()
        .map(|s| s.confidence * s.fair_probability)
        .sum();
    let (min, max) = probability_range(signals);
    (weighted / total_weight).clamp(min, max)
}

fn weighted_std(signals: &[AgentSignal], mean: f64) -> f64 {
    let total_weight: f64 = signals.iter().map(|s| s.confidence).sum();
    let variance: f64 = signals
        .iter()
        .map(|s| s.confidence * (s.fair_probability - mean).powi(2))
        .sum::<f64>()
        / total_weight;
    variance.max(0.0).sqrt()
}

/// Unweighted population standard deviation of the raw estimates.
pub fn disagreement(signals: &[AgentSignal]) -> f64 {
    if signals.is_empty() {
        return 0.0;
    }
    let n = signals.len() as f64;
    let mean = signals.iter().map(|s| s.fair_probability).sum::<f64>() / n;
    let variance = signals
        .iter()
        .map(|s| (s.fair_probability - mean).powi(2))
        .sum::<f64>()
        / n;
    variance.max(0.0).sqrt()
}

fn probability_range(signals: &[AgentSignal]) -> (f64, f64) {
    signals.iter().fold((1.0f64, 0.0f64), |(lo, hi), s| {
        (lo.min(s.fair_probability), hi.max(s.fair_probability))
    })
}
