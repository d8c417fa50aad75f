use chrono::Utc;
use quorum_models::signal::{AgentSignal, SignalDirection};
use serde::Deserialize;

use crate::error::AgentError;

/// Pull the first JSON object out of model output.
///
/// Accepts bare JSON, a fenced ```json block, or an object preceded by prose.
pub fn extract_json(text: &str) -> Result<&str, AgentError> {
    let trimmed = text.trim();
    let is_object =
        |s: &str| serde_json::from_str::<serde_json::Value>(s).is_ok_and(|v| v.is_object());

    if trimmed.starts_with('{') && is_object(trimmed) {
        return Ok(trimmed);
    }

    let candidates = [fenced_block(trimmed), first_balanced_object(trimmed)];
    candidates
        .into_iter()
        .flatten()
        .find(|candidate| is_object(candidate))
        .ok_or_else(|| {
            AgentError::Parse(format!(
                "No JSON object found in response (length={})",
                text.len()
            ))
        })
}

fn fenced_block(text: &str) -> Option<&str> {
    const OPENERS: [&str; 4] = ["```json\n", "```json\r\n", "```\n", "```\r\n"];
    OPENERS.iter().find_map(|opener| {
        let body_start = text.find(opener)? + opener.len();
        let body_len = text[body_start..].find("```")?;
        Some(text[body_start..body_start + body_len].trim())
    })
}

/// First `{ ... }` with balanced braces, ignoring braces inside strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Signal fields as the model writes them. Identity and timestamp are stamped by us.
#[derive(Debug, Deserialize)]
struct RawSignal {
    #[serde(alias = "probability", alias = "fairProbability")]
    fair_probability: f64,
    direction: Option<String>,
    confidence: f64,
    #[serde(default, alias = "keyDrivers")]
    key_drivers: Vec<String>,
    #[serde(default, alias = "riskFactors")]
    risk_factors: Vec<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

fn parse_direction(
    raw: Option<&str>,
    fair_probability: f64,
    market: f64,
) -> Result<SignalDirection, AgentError> {
    match raw.map(|d| d.trim().to_ascii_uppercase()) {
        Some(d) if d == "YES" => Ok(SignalDirection::Yes),
        Some(d) if d == "NO" => Ok(SignalDirection::No),
        Some(d) if d == "NEUTRAL" => Ok(SignalDirection::Neutral),
        Some(other) => Err(AgentError::Parse(format!("Unknown direction: {other}"))),
        None if fair_probability > market => Ok(SignalDirection::Yes),
        None if fair_probability < market => Ok(SignalDirection::No),
        None => Ok(SignalDirection::Neutral),
    }
}

/// Parse an `AgentSignal` from raw CLI output for `agent_id`.
///
/// A missing direction is inferred against `market_probability`.
pub fn parse_agent_signal(
    raw: &str,
    agent_id: &str,
    market_probability: f64,
) -> Result<AgentSignal, AgentError> {
    let json = extract_json(raw)?;
    let parsed: RawSignal = serde_json::from_str(json)
        .map_err(|e| AgentError::Parse(format!("Failed to parse signal: {e}\nJSON: {json}")))?;

    Ok(AgentSignal {
        agent_id: agent_id.to_string(),
        timestamp: Utc::now(),
        direction: parse_direction(
            parsed.direction.as_deref(),
            parsed.fair_probability,
            market_probability,
        )?,
        fair_probability: parsed.fair_probability,
        confidence: parsed.confidence,
        key_drivers: parsed.key_drivers,
        risk_factors: parsed.risk_factors,
        metadata: parsed.metadata,
    })
}
