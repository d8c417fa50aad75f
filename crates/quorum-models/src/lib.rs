pub mod audit;
pub mod briefing;
pub mod category;
pub mod config;
pub mod consensus;
pub mod recommendation;
pub mod remote;
pub mod report;
pub mod signal;
pub mod store_schema;

pub use audit::{AuditEntry, AuditStage, AuditStatus};
pub use briefing::{DataPresence, EventType, MarketBriefing, MarketStatus};
pub use category::AgentCategory;
pub use config::{
    AgentOverride, AgentsConfig, CategoryToggles, ConsensusConfig, QuorumConfig, RemoteConfig,
    SelectionConfig, StoreConfig,
};
pub use consensus::{ConfidenceBand, ConsensusRegime, ConsensusResult};
pub use recommendation::{
    Explanation, LiquidityRisk, ProbabilityZone, RecommendationMetadata, TradeDirection,
    TradeRecommendation,
};
pub use remote::{RemoteAnalysis, RemoteRequest};
pub use report::{AnalysisReport, RunOutcome};
pub use signal::{AgentRequest, AgentSignal, SignalDirection};
pub use store_schema::RunRow;
