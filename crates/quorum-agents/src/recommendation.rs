use std::collections::HashSet;

use chrono::Utc;
use quorum_models::briefing::MarketBriefing;
use quorum_models::config::ConsensusConfig;
use quorum_models::consensus::ConsensusResult;
use quorum_models::recommendation::{
    Explanation, LiquidityRisk, ProbabilityZone, RecommendationMetadata, TradeDirection,
    TradeRecommendation, OUTPUT_SCHEMA_VERSION,
};
use quorum_models::signal::AgentSignal;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::PanelError;

const DEEP_LIQUIDITY: Decimal = Decimal::from_parts(50_000, 0, 0, false, 0);
const DEEP_VOLUME: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
const THIN_LIQUIDITY: Decimal = Decimal::from_parts(10_000, 0, 0, false, 0);
const THIN_VOLUME: Decimal = Decimal::from_parts(1_000, 0, 0, false, 0);

/// What the builder made of a consensus.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Trade(Box<TradeRecommendation>),
    /// |edge| below the threshold. A valid outcome, not an error.
    NoAction { edge: f64, threshold: f64 },
}

/// Liquidity tier from fixed USD bands, independent of the probability model.
pub fn liquidity_risk(briefing: &MarketBriefing) -> LiquidityRisk {
    if briefing.liquidity >= DEEP_LIQUIDITY && briefing.volume_24h >= DEEP_VOLUME {
        LiquidityRisk::Low
    } else if briefing.liquidity < THIN_LIQUIDITY || briefing.volume_24h < THIN_VOLUME {
        LiquidityRisk::High
    } else {
        LiquidityRisk::Medium
    }
}

/// Turn a final consensus into a recommendation, or decide there is nothing to trade.
pub fn build_recommendation(
    consensus: &ConsensusResult,
    briefing: &MarketBriefing,
    config: &ConsensusConfig,
    min_agents_required: usize,
) -> Result<Decision, PanelError> {
    let required = min_agents_required.max(1);
    if consensus.signal_count() < required {
        return Err(PanelError::InsufficientSignals {
            required,
            available: consensus.signal_count(),
        });
    }

    let edge = consensus.edge;
    if edge.abs() < config.min_edge_threshold {
        return Ok(Decision::NoAction {
            edge,
            threshold: config.min_edge_threshold,
        });
    }

    let direction = if edge > 0.0 {
        TradeDirection::LongYes
    } else {
        TradeDirection::LongNo
    };
    let (win_probability, entry_price) = match direction {
        TradeDirection::LongYes => (
            consensus.consensus_probability,
            consensus.market_probability,
        ),
        TradeDirection::LongNo => (
            1.0 - consensus.consensus_probability,
            1.0 - consensus.market_probability,
        ),
    };

    let entry_zone = ProbabilityZone::from(consensus.confidence_band);
    let shift = match direction {
        TradeDirection::LongYes => config.target_offset,
        TradeDirection::LongNo => -config.target_offset,
    };
    let target_zone = ProbabilityZone {
        low: (entry_zone.low + shift).clamp(0.0, 1.0),
        high: (entry_zone.high + shift).clamp(0.0, 1.0),
    };

    let recommendation = TradeRecommendation {
        id: Uuid::new_v4(),
        schema_version: OUTPUT_SCHEMA_VERSION,
        market_id: briefing.market_id.clone(),
        direction,
        entry_zone,
        target_zone,
        // Per $1 contract bought at the side's market price.
        expected_value: win_probability - entry_price,
        win_probability,
        liquidity_risk: liquidity_risk(briefing),
        explanation: explain(consensus, briefing, direction, config.max_explanation_items),
        metadata: RecommendationMetadata {
            consensus_probability: consensus.consensus_probability,
            market_probability: consensus.market_probability,
            edge,
            confidence_band: consensus.confidence_band,
            disagreement: consensus.disagreement,
            regime: consensus.regime,
            contributing_agents: consensus.agent_ids(),
            cross_examined: consensus.cross_examined,
        },
        created_at: Utc::now(),
    };
    Ok(Decision::Trade(Box::new(recommendation)))
}

/// Signals by confidence, highest first. Ties keep agent-id order.
fn by_confidence(signals: &[AgentSignal]) -> Vec<&AgentSignal> {
    let mut ordered: Vec<&AgentSignal> = signals.iter().collect();
    ordered.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    ordered
}

fn collect_ranked<'a>(
    ordered: &[&'a AgentSignal],
    items: impl Fn(&'a AgentSignal) -> &'a [String],
    limit: usize,
) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    ordered
        .iter()
        .flat_map(|s| items(*s).iter())
        .filter(|item| seen.insert(*item))
        .take(limit)
        .cloned()
        .collect()
}

fn explain(
    consensus: &ConsensusResult,
    briefing: &MarketBriefing,
    direction: TradeDirection,
    limit: usize,
) -> Explanation {
    let ordered = by_confidence(&consensus.signals);
    let catalysts = collect_ranked(&ordered, |s| s.key_drivers.as_slice(), limit);
    let failure_scenarios = collect_ranked(&ordered, |s| s.risk_factors.as_slice(), limit);

    let side = match direction {
        TradeDirection::LongYes => "YES",
        TradeDirection::LongNo => "NO",
    };
    let summary = format!(
        "Buy {side} on \"{}\": panel consensus {:.1}% vs market {:.1}% ({:+.1} pts) from {} agents",
        briefing.question,
        consensus.consensus_probability * 100.0,
        consensus.market_probability * 100.0,
        consensus.edge * 100.0,
        consensus.signal_count(),
    );
    let core_thesis = match catalysts.first() {
        Some(lead) => format!(
            "Market underprices {side}: {lead}. Disagreement {:.3}{}",
            consensus.disagreement,
            if consensus.cross_examined {
                " after cross-examination"
            } else {
                ""
            }
        ),
        None => format!(
            "Market underprices {side} by {:.1} pts with disagreement {:.3}",
            consensus.edge.abs() * 100.0,
            consensus.disagreement
        ),
    };

    Explanation {
        summary,
        core_thesis,
        catalysts,
        failure_scenarios,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::fuse;
    use crate::test_support::{make_briefing, make_signal};
    use quorum_models::briefing::EventType;
    use rust_decimal_macros::dec;

    fn signal(id: &str, p: f64, confidence: f64, drivers: &[&str], risks: &[&str]) -> AgentSignal {
        let mut s = make_signal(id, p, confidence);
        s.key_drivers = drivers.iter().map(|d| d.to_string()).collect();
        s.risk_factors = risks.iter().map(|r| r.to_string()).collect();
        s
    }

    fn consensus_at(p: f64, market: f64) -> ConsensusResult {
        fuse(
            &[make_signal("a", p, 0.7), make_signal("b", p, 0.7)],
            market,
            2,
        )
        .unwrap()
    }

    #[test]
    fn small_edge_is_no_action() {
        let briefing = make_briefing(EventType::Election, 0.50);
        let consensus = consensus_at(0.52, 0.50);
        let config = ConsensusConfig {
            min_edge_threshold: 0.05,
            ..ConsensusConfig::default()
        };

        match build_recommendation(&consensus, &briefing, &config, 2).unwrap() {
            Decision::NoAction { edge, threshold } => {
                assert!((edge - 0.02).abs() < 1e-9);
                assert_eq!(threshold, 0.05);
            }
            other => panic!("expected no action, got {other:?}"),
        }
    }

    #[test]
    fn positive_edge_goes_long_yes() {
        let briefing = make_briefing(EventType::Election, 0.50);
        let consensus = consensus_at(0.62, 0.50);
        let Decision::Trade(rec) =
            build_recommendation(&consensus, &briefing, &ConsensusConfig::default(), 2).unwrap()
        else {
            panic!("expected trade");
        };

        assert_eq!(rec.direction, TradeDirection::LongYes);
        assert!((rec.win_probability - 0.62).abs() < 1e-9);
        assert!((rec.expected_value - 0.12).abs() < 1e-9);
        assert_eq!(rec.entry_zone, ProbabilityZone::from(consensus.confidence_band));
        assert!((rec.target_zone.low - (rec.entry_zone.low + 0.10)).abs() < 1e-9);
        assert_eq!(rec.metadata.contributing_agents, vec!["a", "b"]);
    }

    #[test]
    fn negative_edge_goes_long_no() {
        let briefing = make_briefing(EventType::Court, 0.70);
        let consensus = consensus_at(0.40, 0.70);
        let Decision::Trade(rec) =
            build_recommendation(&consensus, &briefing, &ConsensusConfig::default(), 2).unwrap()
        else {
            panic!("expected trade");
        };

        assert_eq!(rec.direction, TradeDirection::LongNo);
        assert!((rec.win_probability - 0.60).abs() < 1e-9);
        assert!((rec.expected_value - 0.30).abs() < 1e-9);
        assert!(rec.target_zone.high < rec.entry_zone.high);
    }

    #[test]
    fn expected_value_is_per_dollar_contract() {
        for (p, market) in [(0.99, 0.01), (0.01, 0.99), (0.75, 0.60), (0.20, 0.45)] {
            let briefing = make_briefing(EventType::Economic, market);
            let consensus = consensus_at(p, market);
            let Decision::Trade(rec) =
                build_recommendation(&consensus, &briefing, &ConsensusConfig::default(), 2)
                    .unwrap()
            else {
                panic!("expected trade at {p} vs {market}");
            };
            let price = match rec.direction {
                TradeDirection::LongYes => market,
                TradeDirection::LongNo => 1.0 - market,
            };
            assert!((rec.expected_value - (rec.win_probability - price)).abs() < 1e-9);
            assert!((-1.0..=1.0).contains(&rec.expected_value));
            assert!(rec.expected_value > 0.0);
        }
    }

    #[test]
    fn target_zone_is_clamped() {
        let briefing = make_briefing(EventType::Other, 0.60);
        let consensus = consensus_at(0.97, 0.60);
        let Decision::Trade(rec) =
            build_recommendation(&consensus, &briefing, &ConsensusConfig::default(), 2).unwrap()
        else {
            panic!("expected trade");
        };
        assert_eq!(rec.target_zone.high, 1.0);
        assert!(rec.target_zone.low <= rec.target_zone.high);
    }

    #[test]
    fn under_sampled_consensus_is_rejected() {
        let briefing = make_briefing(EventType::Other, 0.5);
        let consensus = consensus_at(0.8, 0.5);
        assert!(matches!(
            build_recommendation(&consensus, &briefing, &ConsensusConfig::default(), 3),
            Err(PanelError::InsufficientSignals { required: 3, available: 2 })
        ));
    }

    #[test]
    fn liquidity_tiers() {
        let mut briefing = make_briefing(EventType::Other, 0.5);
        briefing.liquidity = dec!(80000);
        briefing.volume_24h = dec!(20000);
        assert_eq!(liquidity_risk(&briefing), LiquidityRisk::Low);

        briefing.volume_24h = dec!(5000);
        assert_eq!(liquidity_risk(&briefing), LiquidityRisk::Medium);

        briefing.volume_24h = dec!(999);
        assert_eq!(liquidity_risk(&briefing), LiquidityRisk::High);

        briefing.volume_24h = dec!(20000);
        briefing.liquidity = dec!(9999.99);
        assert_eq!(liquidity_risk(&briefing), LiquidityRisk::High);
    }

    #[test]
    fn explanation_is_ranked_and_deduplicated() {
        let briefing = make_briefing(EventType::Election, 0.40);
        let signals = vec![
            signal("a", 0.6, 0.5, &["shared driver", "a driver"], &["a risk"]),
            signal("b", 0.6, 0.9, &["b driver", "shared driver"], &["b risk", "a risk"]),
            signal("c", 0.6, 0.7, &["c driver"], &[]),
        ];
        let consensus = fuse(&signals, 0.40, 2).unwrap();
        let config = ConsensusConfig {
            max_explanation_items: 3,
            ..ConsensusConfig::default()
        };
        let Decision::Trade(rec) = build_recommendation(&consensus, &briefing, &config, 2).unwrap()
        else {
            panic!("expected trade");
        };

        assert_eq!(
            rec.explanation.catalysts,
            vec!["b driver", "shared driver", "c driver"]
        );
        assert_eq!(rec.explanation.failure_scenarios, vec!["b risk", "a risk"]);
        assert!(rec.explanation.core_thesis.contains("b driver"));
        assert!(rec.explanation.summary.starts_with("Buy YES"));
    }
}
