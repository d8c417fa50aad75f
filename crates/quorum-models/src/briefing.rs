use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const BRIEFING_SCHEMA_VERSION: u32 = 1;

/// Event type of the question a market resolves on.
///
/// Unrecognized values deserialize to `Other`, which maps to every agent category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Election,
    Court,
    Policy,
    Economic,
    Geopolitical,
    #[default]
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum MarketStatus {
    #[default]
    Active,
    Closed,
    Resolved,
}

/// Which upstream data feeds produced something for this market.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DataPresence {
    pub polling: bool,
    pub news: bool,
    pub social: bool,
    pub historical: bool,
}

impl DataPresence {
    pub fn all() -> Self {
        Self {
            polling: true,
            news: true,
            social: true,
            historical: true,
        }
    }
}

/// Immutable snapshot of a market, produced by ingestion and read by every stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketBriefing {
    pub market_id: String,
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub question: String,
    #[serde(default)]
    pub event_type: EventType,
    /// Market-implied probability of YES, 0.0 to 1.0.
    pub market_probability: f64,
    /// 24h traded volume in USD.
    pub volume_24h: Decimal,
    /// Resting liquidity in USD.
    pub liquidity: Decimal,
    #[serde(default)]
    pub status: MarketStatus,
    #[serde(default)]
    pub data: DataPresence,
    pub captured_at: DateTime<Utc>,
}

impl MarketBriefing {
    /// Check the market probability is finite and within [0, 1] and the market is named.
    pub fn validate(&self) -> Result<(), String> {
        if !self.market_probability.is_finite() || !(0.0..=1.0).contains(&self.market_probability)
        {
            return Err(format!(
                "market_probability {} outside [0, 1]",
                self.market_probability
            ));
        }
        if self.volume_24h.is_sign_negative() || self.liquidity.is_sign_negative() {
            return Err("volume_24h and liquidity must be non-negative".to_string());
        }
        if self.market_id.trim().is_empty() {
            return Err("market_id is empty".to_string());
        }
        Ok(())
    }
}

fn default_schema_version() -> u32 {
    BRIEFING_SCHEMA_VERSION
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roundtrip_briefing() {
        let briefing = MarketBriefing {
            market_id: "0xabc".to_string(),
            schema_version: BRIEFING_SCHEMA_VERSION,
            question: "Will the incumbent win the 2028 election?".to_string(),
            event_type: EventType::Election,
            market_probability: 0.42,
            volume_24h: dec!(50000),
            liquidity: dec!(120000),
            status: MarketStatus::Active,
            data: DataPresence::all(),
            captured_at: Utc::now(),
        };

        let json = serde_json::to_string(&briefing).unwrap();
        let deserialized: MarketBriefing = serde_json::from_str(&json).unwrap();
        assert_eq!(briefing, deserialized);
    }

    fn sample_briefing() -> MarketBriefing {
        MarketBriefing {
            market_id: "0xabc".to_string(),
            schema_version: BRIEFING_SCHEMA_VERSION,
            question: "Will the bill pass?".to_string(),
            event_type: EventType::Policy,
            market_probability: 0.5,
            volume_24h: dec!(1000),
            liquidity: dec!(5000),
            status: MarketStatus::Active,
            data: DataPresence::default(),
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn validate_accepts_probability_bounds() {
        let mut briefing = sample_briefing();
        briefing.market_probability = 0.0;
        assert!(briefing.validate().is_ok());
        briefing.market_probability = 1.0;
        assert!(briefing.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_briefings() {
        let mut briefing = sample_briefing();
        briefing.market_probability = 1.7;
        assert!(briefing.validate().unwrap_err().contains("market_probability"));

        let mut briefing = sample_briefing();
        briefing.market_probability = f64::NAN;
        assert!(briefing.validate().is_err());

        let mut briefing = sample_briefing();
        briefing.liquidity = dec!(-1);
        assert!(briefing.validate().is_err());

        let mut briefing = sample_briefing();
        briefing.market_id = "  ".to_string();
        assert!(briefing.validate().is_err());
    }

    #[test]
    fn unknown_event_type_is_other() {
        let parsed: EventType = serde_json::from_str("\"sports\"").unwrap();
        assert_eq!(parsed, EventType::Other);
    }

    #[test]
    fn minimal_briefing_uses_defaults() {
        let json = r#"{
            "market_id": "m-1",
            "question": "Will the court rule by June?",
            "market_probability": 0.3,
            "volume_24h": "1500",
            "liquidity": "8000",
            "captured_at": "2026-01-05T12:00:00Z"
        }"#;
        let briefing: MarketBriefing = serde_json::from_str(json).unwrap();
        assert_eq!(briefing.event_type, EventType::Other);
        assert_eq!(briefing.status, MarketStatus::Active);
        assert_eq!(briefing.data, DataPresence::default());
        assert_eq!(briefing.schema_version, BRIEFING_SCHEMA_VERSION);
    }
}
