use std::collections::HashSet;
use std::sync::Arc;

use quorum_models::audit::{AuditStage, AuditStatus};
use quorum_models::briefing::MarketBriefing;
use quorum_models::consensus::ConsensusResult;
use quorum_models::signal::AgentSignal;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::AuditLog;
use crate::coordinator::{build_request, Coordinator};
use crate::error::Halt;
use crate::fusion::fuse;
use crate::selection::Selection;

/// Bounds of the reconciliation loop.
#[derive(Debug, Clone, Copy)]
pub struct CrossExamPolicy {
    pub high_disagreement_threshold: f64,
    pub max_rounds: u32,
    pub min_agents_required: usize,
}

/// Everything a round needs besides the consensus itself.
pub struct RoundContext<'a> {
    pub run_id: Uuid,
    pub briefing: &'a MarketBriefing,
    pub selection: &'a Selection,
    pub coordinator: &'a Coordinator,
    pub audit: &'a Arc<AuditLog>,
    pub cancel: &'a CancellationToken,
}

/// Signals further from consensus than one disagreement unit.
pub fn outliers<'a>(consensus: &'a ConsensusResult) -> impl Iterator<Item = &'a AgentSignal> {
    consensus.signals.iter().filter(move |s| {
        (s.fair_probability - consensus.consensus_probability).abs() > consensus.disagreement
    })
}

/// Re-invoke outlier agents until disagreement falls to the threshold, no agent is left
/// to examine, or the round limit is hit.
///
/// Each agent is re-examined at most once. An outlier whose re-invocation fails is
/// dropped. Every round rebuilds the consensus from scratch, so the minimum-agent gate
/// applies again.
pub async fn cross_examine(
    initial: ConsensusResult,
    policy: CrossExamPolicy,
    ctx: &RoundContext<'_>,
) -> Result<ConsensusResult, Halt> {
    let threshold = policy.high_disagreement_threshold;
    if initial.disagreement <= threshold {
        return Ok(initial);
    }

    info!(
        market_id = %ctx.briefing.market_id,
        disagreement = initial.disagreement,
        threshold,
        "Disagreement above threshold, starting cross-examination"
    );

    let mut current = initial;
    let mut examined: HashSet<String> = HashSet::new();
    let mut rounds = 0u32;

    while rounds < policy.max_rounds && current.disagreement > threshold {
        let targets: Vec<String> = outliers(&current)
            .filter(|s| !examined.contains(&s.agent_id))
            .map(|s| s.agent_id.clone())
            .collect();
        if targets.is_empty() {
            debug!(round = rounds + 1, "No outliers left to examine");
            ctx.audit.ok(
                AuditStage::CrossExamination,
                "no eligible outliers; stopping",
                json!({ "disagreement": current.disagreement }),
            );
            break;
        }
        rounds += 1;

        let context = json!({
            "cross_examination": true,
            "round": rounds,
            "consensus_probability": current.consensus_probability,
            "disagreement": current.disagreement,
        });
        let requests = ctx
            .selection
            .agents
            .iter()
            .filter(|d| targets.contains(&d.id))
            .map(|d| {
                build_request(
                    ctx.run_id,
                    d,
                    ctx.briefing,
                    current.signals.clone(),
                    context.clone(),
                )
            })
            .collect();

        let outcomes = ctx
            .coordinator
            .run_round(AuditStage::CrossExamination, requests, ctx.audit, ctx.cancel)
            .await?;
        examined.extend(targets.iter().cloned());

        let mut next: Vec<AgentSignal> = current
            .signals
            .iter()
            .filter(|s| !targets.contains(&s.agent_id))
            .cloned()
            .collect();
        let mut dropped = Vec::new();
        for outcome in outcomes {
            match outcome.result {
                Ok(revised) => next.push(revised),
                Err(_) => dropped.push(outcome.agent_id),
            }
        }
        for agent_id in &dropped {
            ctx.audit.record(
                AuditStage::CrossExamination,
                AuditStatus::Excluded,
                format!("{agent_id}: outlier dropped after failed re-examination"),
                json!({ "agent": agent_id, "round": rounds }),
            );
        }

        let previous = current.disagreement;
        current = fuse(&next, current.market_probability, policy.min_agents_required)?;
        current.cross_examined = true;
        current.cross_exam_rounds = rounds;

        info!(
            round = rounds,
            examined = targets.len(),
            dropped = dropped.len(),
            before = previous,
            after = current.disagreement,
            "Cross-examination round complete"
        );
        ctx.audit.ok(
            AuditStage::CrossExamination,
            format!("round {rounds} complete"),
            json!({
                "round": rounds,
                "examined": targets,
                "dropped": dropped,
                "disagreement_before": previous,
                "disagreement_after": current.disagreement,
                "consensus_probability": current.consensus_probability,
            }),
        );
    }

    Ok(current)
}
