pub mod audit;
pub mod capability;
pub mod catalog;
pub mod claude_cli;
pub mod coordinator;
pub mod cross_exam;
pub mod error;
pub mod fusion;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod recommendation;
pub mod remote;
pub mod selection;

pub mod test_support;

pub use audit::AuditLog;
pub use capability::{claude_panel, AgentCapability, ClaudeAgent};
pub use catalog::{
    AgentCatalog, AgentDescriptor, BriefingDataOracle, DataAvailability, DataRequirement,
};
pub use coordinator::Coordinator;
pub use error::{AgentError, PanelError, ValidationError};
pub use fusion::fuse;
pub use orchestrator::Orchestrator;
pub use recommendation::{build_recommendation, Decision};
pub use remote::{validate_remote_response, RemoteAnalyzer};
pub use selection::{select_agents, Selection};
