//! Per-run workflow state.
//!
//! One record carries the portfolio snapshot, the loop counter, and the
//! incremental output of each stage as an `Option`-valued sub-record. Nodes
//! never mutate state; they return a [`StatePatch`] the engine merges.

use crate::application::analysis::impact::{ImpactRecord, PortfolioImpact};
use crate::application::analysis::validator::ValidationOutcome;
use crate::application::discovery::DiscoveryOutcome;
use crate::domain::alert::ReasoningStep;
use crate::domain::article::Article;
use crate::domain::classification::Classification;
use crate::domain::portfolio::PortfolioSnapshot;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct MonitorOutput {
    pub articles: Vec<Article>,
    pub last_fetch_time: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ClassifyOutput {
    pub classifications: Vec<Classification>,
    /// Article ids with |sentiment_score| > 0.5.
    pub high_priority: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MatchOutput {
    pub cache_hits: Vec<String>,
    pub cache_misses: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DiscoverOutput {
    pub discovered: Vec<DiscoveryOutcome>,
}

#[derive(Debug, Clone)]
pub struct ImpactOutput {
    pub impacts: Vec<ImpactRecord>,
    pub portfolio_impact: PortfolioImpact,
    pub reasoning_trail: Vec<ReasoningStep>,
}

#[derive(Debug, Clone)]
pub struct AlertOutput {
    pub alert_id: Option<String>,
}

#[derive(Debug)]
pub struct WorkflowState {
    pub user_id: String,
    pub portfolio: PortfolioSnapshot,
    pub loop_count: u32,
    pub monitor: Option<MonitorOutput>,
    pub classify: Option<ClassifyOutput>,
    pub matching: Option<MatchOutput>,
    pub discovery: Option<DiscoverOutput>,
    pub impact: Option<ImpactOutput>,
    pub validation: Option<ValidationOutcome>,
    pub alert: Option<AlertOutput>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub errors: Vec<String>,
}

/// What one node contributes to the run. Unset fields leave the state
/// untouched; a loop re-entry overwrites earlier stage outputs wholesale.
#[derive(Debug, Default)]
pub struct StatePatch {
    pub monitor: Option<MonitorOutput>,
    pub classify: Option<ClassifyOutput>,
    pub matching: Option<MatchOutput>,
    pub discovery: Option<DiscoverOutput>,
    pub impact: Option<ImpactOutput>,
    pub validation: Option<ValidationOutcome>,
    pub alert: Option<AlertOutput>,
    pub errors: Vec<String>,
}

impl WorkflowState {
    pub fn new(portfolio: PortfolioSnapshot) -> Self {
        Self {
            user_id: portfolio.user_id.clone(),
            portfolio,
            loop_count: 0,
            monitor: None,
            classify: None,
            matching: None,
            discovery: None,
            impact: None,
            validation: None,
            alert: None,
            started_at: Utc::now(),
            completed_at: None,
            errors: Vec::new(),
        }
    }

    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(validation) = &patch.validation {
            self.loop_count = validation.loop_count;
        }
        if patch.monitor.is_some() {
            self.monitor = patch.monitor;
        }
        if patch.classify.is_some() {
            self.classify = patch.classify;
        }
        if patch.matching.is_some() {
            self.matching = patch.matching;
        }
        if patch.discovery.is_some() {
            self.discovery = patch.discovery;
        }
        if patch.impact.is_some() {
            self.impact = patch.impact;
        }
        if patch.validation.is_some() {
            self.validation = patch.validation;
        }
        if patch.alert.is_some() {
            self.alert = patch.alert;
        }
        self.errors.extend(patch.errors);
    }

    pub fn articles(&self) -> &[Article] {
        self.monitor.as_ref().map(|m| m.articles.as_slice()).unwrap_or(&[])
    }

    pub fn classifications(&self) -> &[Classification] {
        self.classify
            .as_ref()
            .map(|c| c.classifications.as_slice())
            .unwrap_or(&[])
    }

    pub fn cache_misses(&self) -> &[String] {
        self.matching
            .as_ref()
            .map(|m| m.cache_misses.as_slice())
            .unwrap_or(&[])
    }

    pub fn discovered(&self) -> &[DiscoveryOutcome] {
        self.discovery
            .as_ref()
            .map(|d| d.discovered.as_slice())
            .unwrap_or(&[])
    }

    pub fn refined_queries(&self) -> &[String] {
        self.validation
            .as_ref()
            .map(|v| v.refined_queries.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::analysis::validator::ValidationDecision;

    #[test]
    fn test_patch_merge_preserves_untouched_stages() {
        let mut state = WorkflowState::new(PortfolioSnapshot::empty("u1"));
        state.apply(StatePatch {
            monitor: Some(MonitorOutput {
                articles: vec![],
                last_fetch_time: Utc::now(),
            }),
            ..Default::default()
        });

        state.apply(StatePatch {
            matching: Some(MatchOutput {
                cache_hits: vec!["AAPL".into()],
                cache_misses: vec![],
            }),
            errors: vec!["probe failed".into()],
            ..Default::default()
        });

        assert!(state.monitor.is_some());
        assert_eq!(state.matching.as_ref().unwrap().cache_hits, vec!["AAPL"]);
        assert_eq!(state.errors, vec!["probe failed"]);
    }

    #[test]
    fn test_validation_patch_advances_loop_count() {
        let mut state = WorkflowState::new(PortfolioSnapshot::empty("u1"));
        state.apply(StatePatch {
            validation: Some(ValidationOutcome {
                confidence_score: 0.4,
                decision: ValidationDecision::RequestMoreData,
                gaps: vec![],
                refined_queries: vec![],
                loop_count: 1,
            }),
            ..Default::default()
        });

        assert_eq!(state.loop_count, 1);
    }
}
