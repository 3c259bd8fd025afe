use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{MonitorOutput, StatePatch, WorkflowState};
use crate::domain::errors::IngestError;
use crate::domain::ports::NewsSource;
use crate::domain::repositories::{ArticleRepository, CompanyRepository, MetadataRepository};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

pub const LAST_FETCH_KEY: &str = "last_fetch_time";

/// Stage 1: pull articles from every configured source. On a loop re-entry
/// the validator's refined queries replace the plain portfolio tickers.
pub struct MonitorNode {
    sources: Vec<Arc<dyn NewsSource>>,
    articles: Arc<dyn ArticleRepository>,
    companies: Arc<dyn CompanyRepository>,
    metadata: Arc<dyn MetadataRepository>,
    max_articles: usize,
}

impl MonitorNode {
    pub fn new(
        sources: Vec<Arc<dyn NewsSource>>,
        articles: Arc<dyn ArticleRepository>,
        companies: Arc<dyn CompanyRepository>,
        metadata: Arc<dyn MetadataRepository>,
        max_articles: usize,
    ) -> Self {
        Self {
            sources,
            articles,
            companies,
            metadata,
            max_articles,
        }
    }
}

#[async_trait]
impl WorkflowNode for MonitorNode {
    fn name(&self) -> &'static str {
        "news_monitor"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let queries: Vec<String> = if state.loop_count > 0 && !state.refined_queries().is_empty() {
            state.refined_queries().to_vec()
        } else {
            state.portfolio.tickers()
        };

        let mut patch = StatePatch::default();
        let mut collected = Vec::new();
        let mut seen_ids = HashSet::new();

        for source in &self.sources {
            // A failing source is a soft error: log, record, move on.
            match source.fetch(&queries).await {
                Ok(batch) => {
                    for article in batch {
                        if seen_ids.insert(article.id.clone()) {
                            collected.push(article);
                        }
                    }
                }
                Err(e) => {
                    warn!("News source '{}' failed: {}", source.name(), e);
                    patch.errors.push(
                        IngestError::Fetch {
                            source_name: source.name().to_string(),
                            reason: e.to_string(),
                        }
                        .to_string(),
                    );
                }
            }
        }

        collected.truncate(self.max_articles);

        for article in &collected {
            self.articles.upsert(article).await?;
            for ticker in &article.companies_mentioned {
                self.companies.ensure_exists(ticker, ticker, "Unknown").await?;
            }
        }

        let now = Utc::now();
        self.metadata.put(LAST_FETCH_KEY, &now.to_rfc3339()).await?;

        info!(
            "Monitor fetched {} articles (loop {})",
            collected.len(),
            state.loop_count
        );

        patch.monitor = Some(MonitorOutput {
            articles: collected,
            last_fetch_time: now,
        });
        Ok(patch)
    }
}
