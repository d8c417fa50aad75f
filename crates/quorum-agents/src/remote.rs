use std::time::Duration;

use quorum_models::config::RemoteConfig;
use quorum_models::recommendation::TradeRecommendation;
use quorum_models::remote::{RemoteAnalysis, RemoteRequest};
use quorum_models::signal::AgentSignal;
use reqwest::Client;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{PanelError, ValidationError};

/// Client for a pipeline deployed behind an HTTP endpoint.
pub struct RemoteAnalyzer {
    client: Client,
    endpoint: String,
    token: String,
}

impl RemoteAnalyzer {
    pub fn new(endpoint: &str, token: &str, timeout: Duration) -> Result<Self, PanelError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            token: token.to_string(),
        })
    }

    /// Build from config, reading the bearer token from the configured env var.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, PanelError> {
        let token = std::env::var(&config.token_env)
            .map_err(|_| PanelError::Remote(format!("{} is not set", config.token_env)))?;
        Self::new(
            &config.endpoint,
            &token,
            Duration::from_secs(config.timeout_seconds),
        )
    }

    /// Run the whole pipeline remotely for one market.
    pub async fn analyze(&self, market_id: &str) -> Result<RemoteAnalysis, PanelError> {
        info!(market_id, endpoint = %self.endpoint, "Requesting remote analysis");

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&RemoteRequest {
                market_id: market_id.to_string(),
            })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(market_id, status = status.as_u16(), "Remote analysis rejected");
            return Err(PanelError::Remote(format!("HTTP {status}: {body}")));
        }

        let body: Value = resp.json().await?;
        validate_remote_response(&body)
    }
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> PanelError {
    PanelError::Validation(ValidationError::new(field, message))
}

/// Strict shape check of a remote response. Nothing is coerced.
pub fn validate_remote_response(body: &Value) -> Result<RemoteAnalysis, PanelError> {
    let object = body
        .as_object()
        .ok_or_else(|| invalid("$", "expected a JSON object"))?;

    let recommendation = match object.get("recommendation") {
        None => return Err(invalid("recommendation", "missing")),
        Some(Value::Null) => None,
        Some(value) => Some(
            serde_json::from_value::<TradeRecommendation>(value.clone())
                .map_err(|e| invalid("recommendation", e.to_string()))?,
        ),
    };

    let raw_signals = match object.get("agentSignals") {
        Some(Value::Array(items)) => items,
        Some(_) => return Err(invalid("agentSignals", "expected an array")),
        None => return Err(invalid("agentSignals", "missing")),
    };
    let mut agent_signals = Vec::with_capacity(raw_signals.len());
    for (i, raw) in raw_signals.iter().enumerate() {
        let field = format!("agentSignals[{i}]");
        let signal: AgentSignal = serde_json::from_value(raw.clone())
            .map_err(|e| invalid(field.as_str(), e.to_string()))?;
        signal
            .validate()
            .map_err(|message| invalid(field.as_str(), message))?;
        agent_signals.push(signal);
    }

    let cost = match object.get("cost") {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => n.as_f64(),
        Some(_) => return Err(invalid("cost", "expected a number")),
    };

    Ok(RemoteAnalysis {
        recommendation,
        agent_signals,
        cost,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::make_signal;
    use serde_json::json;

    fn field_of(err: PanelError) -> String {
        match err {
            PanelError::Validation(v) => v.field,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_null_recommendation() {
        let body = json!({
            "recommendation": null,
            "agentSignals": [make_signal("catalyst", 0.55, 0.6)],
            "cost": 0.42
        });
        let analysis = validate_remote_response(&body).unwrap();
        assert!(analysis.recommendation.is_none());
        assert_eq!(analysis.agent_signals.len(), 1);
        assert_eq!(analysis.cost, Some(0.42));
    }

    #[test]
    fn missing_recommendation_is_fatal() {
        let body = json!({ "agentSignals": [] });
        let err = validate_remote_response(&body).unwrap_err();
        assert_eq!(err.kind(), "validation");
        assert_eq!(field_of(err), "recommendation");
    }

    #[test]
    fn non_array_signals_is_fatal() {
        let body = json!({ "recommendation": null, "agentSignals": {"a": 1} });
        assert_eq!(
            field_of(validate_remote_response(&body).unwrap_err()),
            "agentSignals"
        );

        let body = json!({ "recommendation": null });
        assert_eq!(
            field_of(validate_remote_response(&body).unwrap_err()),
            "agentSignals"
        );
    }

    #[test]
    fn bad_signal_reports_index() {
        let mut bad = serde_json::to_value(make_signal("b", 0.5, 0.6)).unwrap();
        bad["fair_probability"] = json!(1.7);
        let body = json!({
            "recommendation": null,
            "agentSignals": [make_signal("a", 0.5, 0.6), bad]
        });
        assert_eq!(
            field_of(validate_remote_response(&body).unwrap_err()),
            "agentSignals[1]"
        );
    }

    #[test]
    fn malformed_recommendation_and_cost() {
        let body = json!({ "recommendation": {"direction": "SIDEWAYS"}, "agentSignals": [] });
        assert_eq!(
            field_of(validate_remote_response(&body).unwrap_err()),
            "recommendation"
        );

        let body = json!({ "recommendation": null, "agentSignals": [], "cost": "free" });
        assert_eq!(field_of(validate_remote_response(&body).unwrap_err()), "cost");
    }

    #[test]
    fn non_object_body() {
        assert_eq!(field_of(validate_remote_response(&json!([])).unwrap_err()), "$");
    }

    #[test]
    fn missing_token_env_is_remote_error() {
        let config = RemoteConfig {
            endpoint: "http://127.0.0.1:9/analyze".to_string(),
            token_env: "QUORUM_TEST_TOKEN_THAT_IS_NEVER_SET".to_string(),
            timeout_seconds: 1,
        };
        assert!(matches!(
            RemoteAnalyzer::from_config(&config),
            Err(PanelError::Remote(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_http_error() {
        let analyzer =
            RemoteAnalyzer::new("http://127.0.0.1:9/analyze", "token", Duration::from_secs(2))
                .unwrap();
        assert!(matches!(
            analyzer.analyze("m-1").await,
            Err(PanelError::Http(_))
        ));
    }
}
