use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::AgentError;

/// Handle on the `claude` CLI for one model.
#[derive(Debug, Clone)]
pub struct ClaudeCli {
    pub binary: String,
    pub model: String,
    pub timeout: Duration,
}

impl ClaudeCli {
    pub fn new(model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: "claude".to_string(),
            model: model.into(),
            timeout,
        }
    }

    /// Run one prompt and return stdout.
    ///
    /// The child is killed if this future is dropped, so aborted agent tasks do not
    /// leave CLI processes behind.
    pub async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AgentError> {
        debug!(model = %self.model, "Invoking claude CLI");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new(&self.binary)
                .args([
                    "-p",
                    user_prompt,
                    "--system-prompt",
                    system_prompt,
                    "--model",
                    &self.model,
                    "--output-format",
                    "text",
                ])
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| AgentError::Timeout(self.timeout.as_secs()))?
        .map_err(|e| AgentError::Cli(format!("Failed to spawn {}: {e}", self.binary)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, stderr = %stderr, "Claude CLI failed");
            return Err(AgentError::Cli(format!(
                "{} exited {}: {}",
                self.binary, output.status, stderr
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(AgentError::Cli("Claude returned empty response".to_string()));
        }
        Ok(stdout)
    }

    /// Whether the binary can be launched at all.
    pub async fn is_available(&self) -> bool {
        matches!(
            Command::new(&self.binary).arg("--version").output().await,
            Ok(output) if output.status.success()
        )
    }
}
