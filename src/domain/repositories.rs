//! Repository Pattern Abstractions
//!
//! Traits for the store's five logical collections plus the metadata
//! key/value table, keeping business logic independent of the SQLite
//! implementation in `infrastructure::persistence`.
//!
//! Failure semantics: callers do not retry a failed store call; a
//! persistence error aborts the current workflow run.

use crate::domain::alert::{Alert, ReasoningStep};
use crate::domain::article::Article;
use crate::domain::factors::MarketFactor;
use crate::domain::portfolio::{Holding, PortfolioSnapshot};
use crate::domain::precedent::HistoricalPrecedent;
use crate::domain::relationship::{FusedRelationship, Relationship};
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Idempotent on article id: the same canonical URL never creates a
    /// second row.
    async fn upsert(&self, article: &Article) -> Result<()>;

    async fn find(&self, id: &str) -> Result<Option<Article>>;

    /// Most recent articles, `published_at DESC`.
    async fn recent(&self, limit: i64) -> Result<Vec<Article>>;

    /// Ticker-substring search over title and content.
    async fn mentioning(&self, tickers: &[String], limit: i64) -> Result<Vec<Article>>;
}

#[async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// Upsert fused relationships for one source ticker, applying the fusion
    /// invariant against existing rows: per (target, type) keep the max
    /// confidence and the max-ranked criticality, union the source labels.
    async fn upsert_all(&self, source_ticker: &str, fused: &[FusedRelationship]) -> Result<()>;

    async fn for_source(&self, source_ticker: &str) -> Result<Vec<Relationship>>;

    async fn all(&self, limit: i64) -> Result<Vec<Relationship>>;
}

#[async_trait]
pub trait AlertRepository: Send + Sync {
    /// Persist the alert and its reasoning trail in one atomic unit: if the
    /// trail cannot be written, the alert must not appear.
    async fn save(&self, alert: &Alert, steps: &[ReasoningStep]) -> Result<()>;

    async fn find(&self, id: &str) -> Result<Option<Alert>>;

    /// Most recent alerts, `created_at DESC`.
    async fn recent(&self, limit: i64) -> Result<Vec<Alert>>;

    /// Reasoning trails for a batch of alerts in a single query.
    async fn reasoning_for(
        &self,
        alert_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReasoningStep>>>;
}

#[async_trait]
pub trait PrecedentRepository: Send + Sync {
    /// Precedents whose event_type substring-matches the factor name.
    async fn for_factor(&self, factor: MarketFactor) -> Result<Vec<HistoricalPrecedent>>;

    async fn insert_all(&self, precedents: &[HistoricalPrecedent]) -> Result<()>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Create the company on first reference; no-op if it already exists.
    async fn ensure_exists(&self, ticker: &str, name: &str, sector: &str) -> Result<()>;

    async fn set_portfolio(&self, ticker: &str, is_portfolio: bool) -> Result<()>;

    async fn portfolio_tickers(&self) -> Result<Vec<String>>;
}

#[async_trait]
pub trait HoldingRepository: Send + Sync {
    async fn snapshot(&self, user_id: &str) -> Result<PortfolioSnapshot>;

    async fn replace_all(&self, user_id: &str, holdings: &[Holding]) -> Result<()>;
}

#[async_trait]
pub trait MetadataRepository: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> Result<()>;
}

#[async_trait]
pub trait AgentLogRepository: Send + Sync {
    async fn append(&self, agent_name: &str, task: &str, result_summary: &str) -> Result<()>;
}
