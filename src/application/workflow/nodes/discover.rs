use crate::application::discovery::RelationshipExtractor;
use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{DiscoverOutput, StatePatch, WorkflowState};
use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use std::sync::Arc;
use tracing::{info, warn};

/// Stage 3b: fan discovery out across all cache misses, one worker per
/// ticker up to the configured ceiling. A ticker whose discovery fails is
/// recorded as a soft error and contributes nothing.
pub struct DiscoverNode {
    extractor: Arc<RelationshipExtractor>,
    worker_ceiling: usize,
}

impl DiscoverNode {
    pub fn new(extractor: Arc<RelationshipExtractor>, worker_ceiling: usize) -> Self {
        Self {
            extractor,
            worker_ceiling: worker_ceiling.max(1),
        }
    }
}

#[async_trait]
impl WorkflowNode for DiscoverNode {
    fn name(&self) -> &'static str {
        "matcher_discovery"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let portfolio_tickers = state.portfolio.tickers();
        let articles = state.articles().to_vec();

        let results: Vec<_> = stream::iter(state.cache_misses().iter().cloned())
            .map(|ticker| {
                let extractor = self.extractor.clone();
                let articles = articles.clone();
                let portfolio = portfolio_tickers.clone();
                async move {
                    let outcome = extractor.discover(&ticker, &articles, &portfolio).await;
                    (ticker, outcome)
                }
            })
            .buffer_unordered(self.worker_ceiling)
            .collect()
            .await;

        // Probe failures are already absorbed inside the extractor; an error
        // surfacing here is a store write, which is fatal to the run.
        let mut patch = StatePatch::default();
        let mut discovered = Vec::new();
        for (ticker, outcome) in results {
            match outcome {
                Ok(outcome) => discovered.push(outcome),
                Err(e) => {
                    warn!("Discovery persistence failed for {}: {}", ticker, e);
                    return Err(e);
                }
            }
        }

        // buffer_unordered completion order is nondeterministic; sort so the
        // merged state is not.
        discovered.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        info!("Parallel discovery complete for {} tickers", discovered.len());

        patch.discovery = Some(DiscoverOutput { discovered });
        Ok(patch)
    }
}
