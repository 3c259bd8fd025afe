//! The six-stage state graph.
//!
//! Compiled once at startup; nodes execute sequentially and return patches
//! the engine merges. Two conditional edges: `matcher_fast` skips discovery
//! when there are no cache misses, and `confidence_validator` may route back
//! to `news_monitor` under the bounded loop. Given identical external inputs
//! the engine produces identical state.

use crate::application::analysis::ValidationDecision;
use crate::application::workflow::nodes::{
    AlertNode, ClassifyNode, DiscoverNode, ImpactNode, MatchFastNode, MonitorNode, ValidateNode,
    WorkflowNode,
};
use crate::application::workflow::state::WorkflowState;
use crate::domain::errors::WorkflowError;
use crate::domain::portfolio::PortfolioSnapshot;
use crate::domain::repositories::AgentLogRepository;
use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Monitor,
    Classify,
    MatchFast,
    Discover,
    Impact,
    Validate,
    Alert,
}

pub struct WorkflowEngine {
    monitor: MonitorNode,
    classify: ClassifyNode,
    match_fast: MatchFastNode,
    discover: DiscoverNode,
    impact: ImpactNode,
    validate: ValidateNode,
    alert: AlertNode,
    agent_logs: Arc<dyn AgentLogRepository>,
    max_loops: u32,
}

impl WorkflowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        monitor: MonitorNode,
        classify: ClassifyNode,
        match_fast: MatchFastNode,
        discover: DiscoverNode,
        impact: ImpactNode,
        validate: ValidateNode,
        alert: AlertNode,
        agent_logs: Arc<dyn AgentLogRepository>,
        max_loops: u32,
    ) -> Self {
        Self {
            monitor,
            classify,
            match_fast,
            discover,
            impact,
            validate,
            alert,
            agent_logs,
            max_loops,
        }
    }

    fn node(&self, kind: NodeKind) -> &dyn WorkflowNode {
        match kind {
            NodeKind::Monitor => &self.monitor,
            NodeKind::Classify => &self.classify,
            NodeKind::MatchFast => &self.match_fast,
            NodeKind::Discover => &self.discover,
            NodeKind::Impact => &self.impact,
            NodeKind::Validate => &self.validate,
            NodeKind::Alert => &self.alert,
        }
    }

    /// The compiled edge table. `None` is the terminal.
    fn next(&self, current: NodeKind, state: &WorkflowState) -> Option<NodeKind> {
        match current {
            NodeKind::Monitor => Some(NodeKind::Classify),
            NodeKind::Classify => Some(NodeKind::MatchFast),
            NodeKind::MatchFast => {
                if state.cache_misses().is_empty() {
                    Some(NodeKind::Impact)
                } else {
                    Some(NodeKind::Discover)
                }
            }
            NodeKind::Discover => Some(NodeKind::Impact),
            NodeKind::Impact => Some(NodeKind::Validate),
            NodeKind::Validate => {
                let wants_loop = state
                    .validation
                    .as_ref()
                    .map(|v| v.decision == ValidationDecision::RequestMoreData)
                    .unwrap_or(false);

                // The validator owns the loop decision, but the bound is
                // enforced here too: past it, a best-effort alert goes out.
                if wants_loop && state.loop_count <= self.max_loops {
                    info!(
                        "Re-entering monitor (loop {}/{})",
                        state.loop_count, self.max_loops
                    );
                    Some(NodeKind::Monitor)
                } else {
                    Some(NodeKind::Alert)
                }
            }
            NodeKind::Alert => None,
        }
    }

    /// One full traversal. A returned error marks the run as errored: no
    /// alert was emitted and only durably-written earlier stages persist.
    pub async fn run(&self, portfolio: PortfolioSnapshot) -> Result<WorkflowState> {
        let mut state = WorkflowState::new(portfolio);

        if state.portfolio.is_empty() {
            warn!("Empty portfolio; workflow terminates without an alert");
            state.completed_at = Some(Utc::now());
            return Ok(state);
        }

        info!(
            "Workflow run started for user {} ({} holdings)",
            state.user_id,
            state.portfolio.holdings.len()
        );

        let mut current = NodeKind::Monitor;
        loop {
            let node = self.node(current);

            let patch = match node.run(&state).await {
                Ok(patch) => patch,
                Err(e) => {
                    error!("Node '{}' failed; run errored: {}", node.name(), e);
                    state.errors.push(
                        WorkflowError::Persistence {
                            node: node.name().to_string(),
                            reason: e.to_string(),
                        }
                        .to_string(),
                    );
                    return Err(e);
                }
            };

            self.agent_logs
                .append(node.name(), "workflow", &summarize(&patch, &state))
                .await?;

            state.apply(patch);

            match self.next(current, &state) {
                Some(next) => current = next,
                None => break,
            }
        }

        state.completed_at = Some(Utc::now());
        info!(
            "Workflow run complete for user {} (loops: {}, errors: {})",
            state.user_id,
            state.loop_count,
            state.errors.len()
        );
        Ok(state)
    }
}

fn summarize(
    patch: &crate::application::workflow::state::StatePatch,
    state: &WorkflowState,
) -> String {
    if let Some(m) = &patch.monitor {
        format!("fetched {} articles (loop {})", m.articles.len(), state.loop_count)
    } else if let Some(c) = &patch.classify {
        format!("classified {} articles", c.classifications.len())
    } else if let Some(m) = &patch.matching {
        format!("{} hits, {} misses", m.cache_hits.len(), m.cache_misses.len())
    } else if let Some(d) = &patch.discovery {
        format!("discovered for {} tickers", d.discovered.len())
    } else if let Some(i) = &patch.impact {
        format!(
            "{} impacts, portfolio {:+.2}%",
            i.impacts.len(),
            i.portfolio_impact.impact_pct
        )
    } else if let Some(v) = &patch.validation {
        format!("score {:.2}, {:?}", v.confidence_score, v.decision)
    } else if let Some(a) = &patch.alert {
        match &a.alert_id {
            Some(id) => format!("alert {} persisted", id),
            None => "no alert emitted".to_string(),
        }
    } else {
        "no output".to_string()
    }
}
