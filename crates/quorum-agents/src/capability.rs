use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use quorum_models::config::AgentsConfig;
use quorum_models::signal::{AgentRequest, AgentSignal};

use crate::catalog::AgentCatalog;
use crate::claude_cli::ClaudeCli;
use crate::error::AgentError;
use crate::parser::parse_agent_signal;
use crate::prompts::system_prompt;

/// One panel agent. Given a request, produce a signal or fail.
///
/// The coordinator owns timeouts and validation; implementations only do the work.
#[async_trait]
pub trait AgentCapability: Send + Sync {
    fn id(&self) -> &str;

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentSignal, AgentError>;
}

/// Agent backed by the `claude` CLI.
pub struct ClaudeAgent {
    pub id: String,
    pub cli: ClaudeCli,
}

impl ClaudeAgent {
    pub fn new(id: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            id: id.into(),
            cli: ClaudeCli::new(model, timeout),
        }
    }
}

#[async_trait]
impl AgentCapability for ClaudeAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn invoke(&self, request: &AgentRequest) -> Result<AgentSignal, AgentError> {
        let system = system_prompt(request.category);
        let user = serde_json::to_string(request)?;
        let raw = self.cli.invoke(&system, &user).await?;
        parse_agent_signal(&raw, &self.id, request.briefing.market_probability)
    }
}

/// One `ClaudeAgent` per catalog entry, using per-agent model overrides.
pub fn claude_panel(
    catalog: &AgentCatalog,
    config: &AgentsConfig,
) -> Vec<Arc<dyn AgentCapability>> {
    let timeout = Duration::from_secs(config.agent_timeout_seconds);
    catalog
        .descriptors()
        .iter()
        .map(|d| {
            Arc::new(ClaudeAgent::new(&d.id, config.model_for(&d.id), timeout))
                as Arc<dyn AgentCapability>
        })
        .collect()
}
