use serde::{Deserialize, Serialize};

use crate::category::AgentCategory;

/// Top-level configuration for quorum.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct QuorumConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub selection: SelectionConfig,
    #[serde(default)]
    pub consensus: ConsensusConfig,
    #[serde(default)]
    pub agents: AgentsConfig,
    pub remote: Option<RemoteConfig>,
}

/// Configuration for the persistence layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite file holding analysis runs.
    pub sqlite_path: String,
    /// Maximum number of markets kept in the in-memory moka cache.
    pub memory_max_capacity: u64,
    /// How long the latest run for a market stays in memory.
    pub memory_ttl_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/quorum.db".to_string(),
            memory_max_capacity: 1_000,
            memory_ttl_seconds: 300,
        }
    }
}

/// Per-category enable flags for advanced agents. Mvp agents have no flag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CategoryToggles {
    pub event_intelligence: bool,
    pub polling_statistical: bool,
    pub historical_pattern: bool,
    pub sentiment_narrative: bool,
    pub event_scenario: bool,
    pub price_action: bool,
}

impl CategoryToggles {
    pub fn all_disabled() -> Self {
        Self {
            event_intelligence: false,
            polling_statistical: false,
            historical_pattern: false,
            sentiment_narrative: false,
            event_scenario: false,
            price_action: false,
        }
    }

    pub fn is_enabled(&self, category: AgentCategory) -> bool {
        match category {
            AgentCategory::Mvp => true,
            AgentCategory::EventIntelligence => self.event_intelligence,
            AgentCategory::PollingStatistical => self.polling_statistical,
            AgentCategory::HistoricalPattern => self.historical_pattern,
            AgentCategory::SentimentNarrative => self.sentiment_narrative,
            AgentCategory::EventScenario => self.event_scenario,
            AgentCategory::PriceAction => self.price_action,
        }
    }
}

impl Default for CategoryToggles {
    fn default() -> Self {
        Self {
            event_intelligence: true,
            polling_statistical: true,
            historical_pattern: true,
            sentiment_narrative: true,
            event_scenario: true,
            price_action: true,
        }
    }
}

/// Which agents may run for a market.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SelectionConfig {
    pub categories: CategoryToggles,
    /// Budget for non-mvp agents.
    pub max_advanced_agents: usize,
    /// Fusion refuses to produce a consensus from fewer signals than this.
    pub min_agents_required: usize,
    /// Agents removed regardless of category, mvp included.
    pub disabled_agents: Vec<String>,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            categories: CategoryToggles::default(),
            max_advanced_agents: 10,
            min_agents_required: 2,
            disabled_agents: Vec::new(),
        }
    }
}

/// Thresholds for fusion, cross-examination and the recommendation builder.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Disagreement above this triggers cross-examination.
    pub high_disagreement_threshold: f64,
    pub max_cross_exam_rounds: u32,
    /// |edge| below this yields no recommendation.
    pub min_edge_threshold: f64,
    /// Distance of the target zone beyond the entry zone.
    pub target_offset: f64,
    /// Cap on catalysts / failure scenarios in the explanation.
    pub max_explanation_items: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            high_disagreement_threshold: 0.15,
            max_cross_exam_rounds: 2,
            min_edge_threshold: 0.05,
            target_offset: 0.10,
            max_explanation_items: 5,
        }
    }
}

/// Configuration for agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AgentsConfig {
    /// Per-invocation timeout in seconds.
    pub agent_timeout_seconds: u64,
    /// Deadline for the whole run in seconds.
    pub total_timeout_seconds: u64,
    /// Upper bound on waiting for the persistence collaborator.
    pub persist_timeout_seconds: u64,
    /// Default model for LLM-backed agents.
    pub agent_model: String,
    pub overrides: Vec<AgentOverride>,
}

impl AgentsConfig {
    pub fn model_for(&self, agent_id: &str) -> String {
        self.overrides
            .iter()
            .find(|o| o.id == agent_id)
            .map(|o| o.model.clone())
            .unwrap_or_else(|| self.agent_model.clone())
    }
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            agent_timeout_seconds: 45,
            total_timeout_seconds: 180,
            persist_timeout_seconds: 5,
            agent_model: "claude-3-5-haiku-latest".to_string(),
            overrides: Vec::new(),
        }
    }
}

/// Model override for a single agent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentOverride {
    pub id: String,
    pub model: String,
}

/// Remote execution endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    pub endpoint: String,
    /// Environment variable holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
    #[serde(default = "default_remote_timeout")]
    pub timeout_seconds: u64,
}

fn default_token_env() -> String {
    "QUORUM_REMOTE_TOKEN".to_string()
}
fn default_remote_timeout() -> u64 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_quorum_config() {
        let config = QuorumConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: QuorumConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn all_disabled_keeps_mvp() {
        let toggles = CategoryToggles::all_disabled();
        assert!(toggles.is_enabled(AgentCategory::Mvp));
        assert!(AgentCategory::ADVANCED_BY_PRIORITY
            .iter()
            .all(|c| !toggles.is_enabled(*c)));
    }

    #[test]
    fn model_override_falls_back_to_default() {
        let agents = AgentsConfig {
            overrides: vec![AgentOverride {
                id: "breaking_news".to_string(),
                model: "claude-sonnet-4-5-20250929".to_string(),
            }],
            ..AgentsConfig::default()
        };
        assert_eq!(agents.model_for("breaking_news"), "claude-sonnet-4-5-20250929");
        assert_eq!(agents.model_for("momentum"), "claude-3-5-haiku-latest");
    }

    #[test]
    fn config_from_toml() {
        let toml_str = r#"
[store]
sqlite_path = "/tmp/quorum_test.db"
memory_max_capacity = 50
memory_ttl_seconds = 30

[selection]
max_advanced_agents = 4
min_agents_required = 3
disabled_agents = ["risk_assessment"]

[selection.categories]
price_action = false

[consensus]
high_disagreement_threshold = 0.2
max_cross_exam_rounds = 1

[agents]
agent_timeout_seconds = 20
agent_model = "claude-3-5-haiku-latest"

[[agents.overrides]]
id = "breaking_news"
model = "claude-sonnet-4-5-20250929"

[remote]
endpoint = "https://analysis.example.com/analyze"
"#;

        let config: QuorumConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.store.sqlite_path, "/tmp/quorum_test.db");
        assert_eq!(config.selection.max_advanced_agents, 4);
        assert!(!config.selection.categories.price_action);
        assert!(config.selection.categories.event_intelligence);
        assert_eq!(config.consensus.max_cross_exam_rounds, 1);
        assert_eq!(config.consensus.min_edge_threshold, 0.05);
        assert_eq!(config.agents.total_timeout_seconds, 180);
        let remote = config.remote.unwrap();
        assert_eq!(remote.token_env, "QUORUM_REMOTE_TOKEN");
        assert_eq!(remote.timeout_seconds, 300);
    }

    #[test]
    fn empty_toml_is_default() {
        let config: QuorumConfig = toml::from_str("").unwrap();
        assert_eq!(config, QuorumConfig::default());
    }
}
