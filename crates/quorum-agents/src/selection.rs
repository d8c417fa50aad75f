use quorum_models::audit::{AuditStage, AuditStatus};
use quorum_models::briefing::MarketBriefing;
use quorum_models::category::AgentCategory;
use quorum_models::config::SelectionConfig;
use serde_json::json;
use tracing::{info, warn};

use crate::audit::AuditLog;
use crate::catalog::{AgentCatalog, AgentDescriptor, DataAvailability};
use crate::error::PanelError;

/// Agents chosen for one run. Mvp agents come first in catalog order, then advanced
/// agents in budget priority order.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub agents: Vec<AgentDescriptor>,
    /// True when no advanced candidate survived configuration and the run is mvp-only.
    pub degraded: bool,
}

impl Selection {
    pub fn ids(&self) -> Vec<String> {
        self.agents.iter().map(|d| d.id.clone()).collect()
    }

    pub fn advanced_count(&self) -> usize {
        self.agents.iter().filter(|d| !d.category.is_mvp()).count()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Choose the agents to run for `briefing`.
///
/// Four stages, each narrowing the previous survivors: event-type candidates,
/// configuration filter, data availability, then the advanced-agent budget.
/// Every exclusion is written to `audit`.
pub fn select_agents(
    briefing: &MarketBriefing,
    config: &SelectionConfig,
    catalog: &AgentCatalog,
    oracle: &dyn DataAvailability,
    audit: &AuditLog,
) -> Result<Selection, PanelError> {
    // Stage 1: mvp plus the categories mapped from the event type.
    let wanted = AgentCategory::for_event_type(briefing.event_type);
    let candidates: Vec<(usize, &AgentDescriptor)> = catalog
        .descriptors()
        .iter()
        .enumerate()
        .filter(|(_, d)| d.category.is_mvp() || wanted.contains(&d.category))
        .collect();

    // Stage 2: category toggles and explicit per-agent disables.
    let mut configured = Vec::with_capacity(candidates.len());
    for (index, descriptor) in candidates {
        if config.disabled_agents.iter().any(|id| *id == descriptor.id) {
            exclude(audit, descriptor, "agent disabled in configuration");
        } else if !config.categories.is_enabled(descriptor.category) {
            exclude(audit, descriptor, "category disabled in configuration");
        } else {
            configured.push((index, descriptor));
        }
    }

    let degraded = !configured.iter().any(|(_, d)| !d.category.is_mvp());
    if degraded {
        warn!(
            market_id = %briefing.market_id,
            event_type = ?briefing.event_type,
            "No advanced candidates after configuration, falling back to mvp agents"
        );
        audit.record(
            AuditStage::Selection,
            AuditStatus::Degraded,
            "no advanced candidates; mvp-only selection",
            json!({ "event_type": briefing.event_type }),
        );
    }

    // Stage 3: data availability.
    let mut available = Vec::with_capacity(configured.len());
    for (index, descriptor) in configured {
        if oracle.is_available(descriptor.requirement, briefing) {
            available.push((index, descriptor));
        } else {
            exclude(audit, descriptor, "required data unavailable");
        }
    }

    // Stage 4: mvp agents bypass the budget; advanced agents are kept greedily.
    let (mvp, mut advanced): (Vec<_>, Vec<_>) =
        available.into_iter().partition(|(_, d)| d.category.is_mvp());
    advanced.sort_by_key(|(index, d)| (d.category.priority(), d.rank, *index));

    let budget = config.max_advanced_agents;
    if advanced.len() > budget {
        for (_, descriptor) in &advanced[budget..] {
            exclude(audit, descriptor, "advanced agent budget exhausted");
        }
        advanced.truncate(budget);
    }

    let agents: Vec<AgentDescriptor> = mvp
        .into_iter()
        .chain(advanced)
        .map(|(_, d)| d.clone())
        .collect();

    if agents.is_empty() {
        audit.record(
            AuditStage::Selection,
            AuditStatus::Failed,
            "no agents available",
            serde_json::Value::Null,
        );
        return Err(PanelError::NoAgentsAvailable(briefing.market_id.clone()));
    }

    let selection = Selection { agents, degraded };
    info!(
        market_id = %briefing.market_id,
        selected = selection.len(),
        advanced = selection.advanced_count(),
        "Agent selection complete"
    );
    audit.ok(
        AuditStage::Selection,
        format!("selected {} agents", selection.len()),
        json!({
            "agents": selection.ids(),
            "advanced": selection.advanced_count(),
            "budget": budget,
        }),
    );
    Ok(selection)
}

fn exclude(audit: &AuditLog, descriptor: &AgentDescriptor, reason: &str) {
    audit.record(
        AuditStage::Selection,
        AuditStatus::Excluded,
        format!("{}: {reason}", descriptor.id),
        json!({ "agent": descriptor.id, "category": descriptor.category, "reason": reason }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BriefingDataOracle, DataRequirement};
    use crate::test_support::make_briefing;
    use quorum_models::briefing::{DataPresence, EventType};
    use quorum_models::config::CategoryToggles;
    use rust_decimal_macros::dec;

    fn select(briefing: &MarketBriefing, config: &SelectionConfig) -> (Selection, AuditLog) {
        let audit = AuditLog::new();
        let selection = select_agents(
            briefing,
            config,
            &AgentCatalog::default(),
            &BriefingDataOracle,
            &audit,
        )
        .unwrap();
        (selection, audit)
    }

    #[test]
    fn election_with_full_data() {
        let mut briefing = make_briefing(EventType::Election, 0.5);
        briefing.volume_24h = dec!(50000);
        briefing.data = DataPresence::all();
        let config = SelectionConfig {
            max_advanced_agents: 10,
            ..SelectionConfig::default()
        };

        let (selection, _) = select(&briefing, &config);
        let ids = selection.ids();
        assert!(ids.len() <= 10);
        for mvp in ["market_microstructure", "probability_baseline", "risk_assessment"] {
            assert!(ids.contains(&mvp.to_string()));
        }
        let categories: Vec<_> = selection.agents.iter().map(|d| d.category).collect();
        assert!(categories.contains(&AgentCategory::PollingStatistical));
        assert!(categories.contains(&AgentCategory::SentimentNarrative));
        assert!(categories.contains(&AgentCategory::EventIntelligence));
        assert!(!categories.contains(&AgentCategory::PriceAction));
        assert!(!selection.degraded);
    }

    #[test]
    fn all_categories_disabled_is_mvp_only() {
        let briefing = make_briefing(EventType::Other, 0.5);
        let config = SelectionConfig {
            categories: CategoryToggles::all_disabled(),
            ..SelectionConfig::default()
        };

        let (selection, audit) = select(&briefing, &config);
        assert_eq!(selection.len(), 3);
        assert!(selection.agents.iter().all(|d| d.category.is_mvp()));
        assert!(selection.degraded);
        assert!(audit.contains(AuditStage::Selection, AuditStatus::Degraded));
    }

    #[test]
    fn every_event_type_keeps_mvp() {
        for event_type in [
            EventType::Election,
            EventType::Court,
            EventType::Policy,
            EventType::Economic,
            EventType::Geopolitical,
            EventType::Other,
        ] {
            let briefing = make_briefing(event_type, 0.5);
            let (selection, _) = select(&briefing, &SelectionConfig::default());
            let mvp = selection.agents.iter().filter(|d| d.category.is_mvp()).count();
            assert_eq!(mvp, 3, "{event_type:?}");
        }
    }

    #[test]
    fn budget_keeps_top_k_by_priority() {
        let mut briefing = make_briefing(EventType::Other, 0.5);
        briefing.volume_24h = dec!(50000);
        briefing.data = DataPresence::all();

        let (unbounded, _) = select(
            &briefing,
            &SelectionConfig {
                max_advanced_agents: 100,
                ..SelectionConfig::default()
            },
        );
        let ranked: Vec<_> = unbounded
            .agents
            .iter()
            .filter(|d| !d.category.is_mvp())
            .map(|d| d.id.clone())
            .collect();

        for k in 0..=ranked.len() {
            let (selection, _) = select(
                &briefing,
                &SelectionConfig {
                    max_advanced_agents: k,
                    ..SelectionConfig::default()
                },
            );
            let advanced: Vec<_> = selection
                .agents
                .iter()
                .filter(|d| !d.category.is_mvp())
                .map(|d| d.id.clone())
                .collect();
            assert!(advanced.len() <= k);
            assert_eq!(advanced, ranked[..k].to_vec());
        }
    }

    #[test]
    fn budget_order_follows_category_priority() {
        let mut briefing = make_briefing(EventType::Other, 0.5);
        briefing.volume_24h = dec!(50000);
        briefing.data = DataPresence::all();
        let config = SelectionConfig {
            max_advanced_agents: 3,
            ..SelectionConfig::default()
        };

        let (selection, audit) = select(&briefing, &config);
        let advanced: Vec<_> = selection
            .agents
            .iter()
            .filter(|d| !d.category.is_mvp())
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(
            advanced,
            vec!["breaking_news", "event_impact", "polling_intelligence"]
        );
        assert!(audit
            .entries()
            .iter()
            .any(|e| e.status == AuditStatus::Excluded && e.message.starts_with("momentum")));
    }

    #[test]
    fn data_filter_drops_unsupported_agents() {
        let mut briefing = make_briefing(EventType::Other, 0.5);
        briefing.volume_24h = dec!(10);
        briefing.data = DataPresence::default();

        let (selection, _) = select(&briefing, &SelectionConfig::default());
        let ids = selection.ids();
        assert!(!ids.contains(&"momentum".to_string()));
        assert!(!ids.contains(&"polling_intelligence".to_string()));
        assert!(!ids.contains(&"narrative_velocity".to_string()));
        assert!(ids.contains(&"event_impact".to_string()));
        assert!(ids.contains(&"catalyst".to_string()));
    }

    #[test]
    fn explicitly_disabled_mvp_agent_is_removed() {
        let briefing = make_briefing(EventType::Court, 0.5);
        let config = SelectionConfig {
            disabled_agents: vec!["risk_assessment".to_string()],
            ..SelectionConfig::default()
        };

        let (selection, _) = select(&briefing, &config);
        assert!(!selection.ids().contains(&"risk_assessment".to_string()));
        assert!(selection.ids().contains(&"probability_baseline".to_string()));
    }

    #[test]
    fn empty_selection_is_an_error() {
        let briefing = make_briefing(EventType::Other, 0.5);
        let catalog = AgentCatalog::new(vec![AgentDescriptor::new(
            "momentum",
            AgentCategory::PriceAction,
            DataRequirement::Polling,
            1,
        )]);
        let audit = AuditLog::new();

        let result = select_agents(
            &briefing,
            &SelectionConfig::default(),
            &catalog,
            &BriefingDataOracle,
            &audit,
        );
        assert!(matches!(result, Err(PanelError::NoAgentsAvailable(_))));
        assert!(audit.contains(AuditStage::Selection, AuditStatus::Failed));
    }

    #[test]
    fn selection_is_subset_of_catalog() {
        let mut briefing = make_briefing(EventType::Other, 0.5);
        briefing.data = DataPresence::all();
        let catalog = AgentCatalog::default();
        let (selection, _) = select(&briefing, &SelectionConfig::default());
        assert!(selection.ids().iter().all(|id| catalog.contains(id)));
    }
}
