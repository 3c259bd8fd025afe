use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{MatchOutput, StatePatch, WorkflowState};
use crate::domain::repositories::RelationshipRepository;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Stage 3a: a ticker surfacing in the news is a cache hit when its
/// relationships are already stored; misses drive the discovery fan-out.
pub struct MatchFastNode {
    relationships: Arc<dyn RelationshipRepository>,
}

impl MatchFastNode {
    pub fn new(relationships: Arc<dyn RelationshipRepository>) -> Self {
        Self { relationships }
    }
}

#[async_trait]
impl WorkflowNode for MatchFastNode {
    fn name(&self) -> &'static str {
        "matcher_fast"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let tickers: BTreeSet<String> = state
            .classifications()
            .iter()
            .map(|c| c.ticker.clone())
            .filter(|t| t != "UNKNOWN")
            .collect();

        let mut cache_hits = Vec::new();
        let mut cache_misses = Vec::new();

        for ticker in tickers {
            let cached = self.relationships.for_source(&ticker).await?;
            if cached.is_empty() {
                cache_misses.push(ticker);
            } else {
                debug!("Cache hit for {}: {} relationships", ticker, cached.len());
                cache_hits.push(ticker);
            }
        }

        info!(
            "Fast matching complete ({} hits, {} misses)",
            cache_hits.len(),
            cache_misses.len()
        );

        Ok(StatePatch {
            matching: Some(MatchOutput {
                cache_hits,
                cache_misses,
            }),
            ..Default::default()
        })
    }
}
