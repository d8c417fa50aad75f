use quorum_models::briefing::MarketBriefing;
use quorum_models::category::AgentCategory;
use rust_decimal::Decimal;

/// Minimum 24h volume (USD) for price-action agents to have anything to read.
pub const PRICE_ACTION_MIN_VOLUME: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Upstream data an agent needs before it is worth invoking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataRequirement {
    None,
    MinVolume24h(Decimal),
    Polling,
    News,
    Social,
    NewsOrSocial,
    Historical,
}

/// Answers whether a requirement is satisfied for a briefing.
pub trait DataAvailability: Send + Sync {
    fn is_available(&self, requirement: DataRequirement, briefing: &MarketBriefing) -> bool;
}

/// Oracle that reads the presence flags ingestion stamped on the briefing.
#[derive(Debug, Default, Clone, Copy)]
pub struct BriefingDataOracle;

impl DataAvailability for BriefingDataOracle {
    fn is_available(&self, requirement: DataRequirement, briefing: &MarketBriefing) -> bool {
        let data = &briefing.data;
        match requirement {
            DataRequirement::None => true,
            DataRequirement::MinVolume24h(floor) => briefing.volume_24h >= floor,
            DataRequirement::Polling => data.polling,
            DataRequirement::News => data.news,
            DataRequirement::Social => data.social,
            DataRequirement::NewsOrSocial => data.news || data.social,
            DataRequirement::Historical => data.historical,
        }
    }
}

/// Static description of one agent.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDescriptor {
    pub id: String,
    pub category: AgentCategory,
    pub requirement: DataRequirement,
    /// Rank within the category; lower runs first.
    pub rank: u32,
}

impl AgentDescriptor {
    pub fn new(
        id: &str,
        category: AgentCategory,
        requirement: DataRequirement,
        rank: u32,
    ) -> Self {
        Self {
            id: id.to_string(),
            category,
            requirement,
            rank,
        }
    }
}

/// Process-wide registry of agents. Declaration order breaks selection ties.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentCatalog {
    descriptors: Vec<AgentDescriptor>,
}

impl AgentCatalog {
    pub fn new(descriptors: Vec<AgentDescriptor>) -> Self {
        Self { descriptors }
    }

    pub fn descriptors(&self) -> &[AgentDescriptor] {
        &self.descriptors
    }

    pub fn get(&self, id: &str) -> Option<&AgentDescriptor> {
        self.descriptors.iter().find(|d| d.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn mvp(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.descriptors.iter().filter(|d| d.category.is_mvp())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl Default for AgentCatalog {
    fn default() -> Self {
        use AgentCategory::*;
        use DataRequirement as Req;

        Self::new(vec![
            AgentDescriptor::new("market_microstructure", Mvp, Req::None, 1),
            AgentDescriptor::new("probability_baseline", Mvp, Req::None, 2),
            AgentDescriptor::new("risk_assessment", Mvp, Req::None, 3),
            AgentDescriptor::new("breaking_news", EventIntelligence, Req::News, 1),
            AgentDescriptor::new("event_impact", EventIntelligence, Req::None, 2),
            AgentDescriptor::new("polling_intelligence", PollingStatistical, Req::Polling, 1),
            AgentDescriptor::new("historical_pattern", HistoricalPattern, Req::Historical, 1),
            AgentDescriptor::new("media_sentiment", SentimentNarrative, Req::News, 1),
            AgentDescriptor::new("social_sentiment", SentimentNarrative, Req::Social, 2),
            AgentDescriptor::new("narrative_velocity", SentimentNarrative, Req::NewsOrSocial, 3),
            AgentDescriptor::new("catalyst", EventScenario, Req::None, 1),
            AgentDescriptor::new("tail_risk", EventScenario, Req::None, 2),
            AgentDescriptor::new(
                "momentum",
                PriceAction,
                Req::MinVolume24h(PRICE_ACTION_MIN_VOLUME),
                1,
            ),
            AgentDescriptor::new(
                "mean_reversion",
                PriceAction,
                Req::MinVolume24h(PRICE_ACTION_MIN_VOLUME),
                2,
            ),
        ])
    }
}
