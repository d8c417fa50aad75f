use std::fmt;

use serde::{Deserialize, Serialize};

use crate::briefing::EventType;

/// Capability category of an analysis agent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "kebab-case")]
pub enum AgentCategory {
    /// Baseline agents that run for every market and are never subject to the budget.
    Mvp,
    EventIntelligence,
    PollingStatistical,
    HistoricalPattern,
    SentimentNarrative,
    PriceAction,
    EventScenario,
}

impl AgentCategory {
    /// Every non-mvp category, in budget priority order.
    pub const ADVANCED_BY_PRIORITY: [AgentCategory; 6] = [
        AgentCategory::EventIntelligence,
        AgentCategory::PollingStatistical,
        AgentCategory::SentimentNarrative,
        AgentCategory::EventScenario,
        AgentCategory::HistoricalPattern,
        AgentCategory::PriceAction,
    ];

    pub fn is_mvp(self) -> bool {
        self == AgentCategory::Mvp
    }

    /// Position in the budget priority order; lower runs first. Mvp sorts ahead of everything.
    pub fn priority(self) -> usize {
        match self {
            AgentCategory::Mvp => 0,
            other => {
                1 + Self::ADVANCED_BY_PRIORITY
                    .iter()
                    .position(|c| *c == other)
                    .unwrap_or(Self::ADVANCED_BY_PRIORITY.len())
            }
        }
    }

    /// Advanced categories relevant to an event type. Mvp is always added on top by selection.
    pub fn for_event_type(event_type: EventType) -> Vec<AgentCategory> {
        match event_type {
            EventType::Election => vec![
                AgentCategory::PollingStatistical,
                AgentCategory::SentimentNarrative,
                AgentCategory::EventIntelligence,
            ],
            EventType::Court => vec![
                AgentCategory::EventIntelligence,
                AgentCategory::HistoricalPattern,
            ],
            EventType::Policy => vec![
                AgentCategory::EventIntelligence,
                AgentCategory::SentimentNarrative,
                AgentCategory::EventScenario,
            ],
            EventType::Economic => vec![
                AgentCategory::EventIntelligence,
                AgentCategory::HistoricalPattern,
            ],
            EventType::Geopolitical => vec![
                AgentCategory::EventIntelligence,
                AgentCategory::SentimentNarrative,
                AgentCategory::EventScenario,
            ],
            EventType::Other => Self::ADVANCED_BY_PRIORITY.to_vec(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AgentCategory::Mvp => "mvp",
            AgentCategory::EventIntelligence => "event-intelligence",
            AgentCategory::PollingStatistical => "polling-statistical",
            AgentCategory::HistoricalPattern => "historical-pattern",
            AgentCategory::SentimentNarrative => "sentiment-narrative",
            AgentCategory::PriceAction => "price-action",
            AgentCategory::EventScenario => "event-scenario",
        }
    }
}

impl fmt::Display for AgentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&AgentCategory::PollingStatistical).unwrap(),
            "\"polling-statistical\""
        );
        let parsed: AgentCategory = serde_json::from_str("\"price-action\"").unwrap();
        assert_eq!(parsed, AgentCategory::PriceAction);
    }

    #[test]
    fn priority_order() {
        assert!(AgentCategory::Mvp.priority() < AgentCategory::EventIntelligence.priority());
        assert!(
            AgentCategory::EventIntelligence.priority()
                < AgentCategory::PollingStatistical.priority()
        );
        assert!(
            AgentCategory::SentimentNarrative.priority() < AgentCategory::EventScenario.priority()
        );
        assert!(AgentCategory::EventScenario.priority() < AgentCategory::PriceAction.priority());
    }

    #[test]
    fn other_maps_to_every_advanced_category() {
        let categories = AgentCategory::for_event_type(EventType::Other);
        assert_eq!(categories.len(), AgentCategory::ADVANCED_BY_PRIORITY.len());
        assert!(!categories.contains(&AgentCategory::Mvp));
    }

    #[test]
    fn election_mapping() {
        let categories = AgentCategory::for_event_type(EventType::Election);
        assert!(categories.contains(&AgentCategory::PollingStatistical));
        assert!(categories.contains(&AgentCategory::SentimentNarrative));
        assert!(categories.contains(&AgentCategory::EventIntelligence));
        assert!(!categories.contains(&AgentCategory::PriceAction));
    }
}
