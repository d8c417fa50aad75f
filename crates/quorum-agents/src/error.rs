use thiserror::Error;

/// Failure of a single agent invocation. Always absorbed by the coordinator.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Claude CLI error: {0}")]
    Cli(String),

    #[error("Agent response parse error: {0}")]
    Parse(String),

    #[error("Agent timed out after {0} seconds")]
    Timeout(u64),

    #[error("Agent returned an invalid signal: {0}")]
    InvalidSignal(String),

    #[error("No capability registered for agent: {0}")]
    Unregistered(String),

    #[error("Agent task failed: {0}")]
    Task(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field-level detail of a rejected remote response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Run-level failure surfaced to the caller.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("No agents available for market {0}")]
    NoAgentsAvailable(String),

    #[error("Insufficient signals: {available} contributing, {required} required")]
    InsufficientSignals { required: usize, available: usize },

    #[error("Remote response validation failed: {0}")]
    Validation(ValidationError),

    #[error("Invalid market briefing: {0}")]
    InvalidBriefing(String),

    #[error("Remote analysis error: {0}")]
    Remote(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PanelError {
    /// Stable identifier for alerting.
    pub fn kind(&self) -> &'static str {
        match self {
            PanelError::NoAgentsAvailable(_) => "no_agents_available",
            PanelError::InsufficientSignals { .. } => "insufficient_signals",
            PanelError::InvalidBriefing(_) => "invalid_briefing",
            PanelError::Validation(_) => "validation",
            PanelError::Remote(_) => "remote",
            PanelError::Http(_) => "http",
            PanelError::Json(_) => "json",
        }
    }
}

/// Why a pipeline stage stopped without a result.
#[derive(Debug)]
pub enum Halt {
    Canceled,
    Fatal(PanelError),
}

impl From<PanelError> for Halt {
    fn from(e: PanelError) -> Self {
        Halt::Fatal(e)
    }
}

impl From<crate::coordinator::Canceled> for Halt {
    fn from(_: crate::coordinator::Canceled) -> Self {
        Halt::Canceled
    }
}
