//! Shared fixtures: a canned generator, a fixture news source, and a fully
//! wired engine over an in-memory database.

use anyhow::Result;
use async_trait::async_trait;
use portpulse::application::analysis::{
    Classifier, ConfidenceValidator, CriticalityMultipliers, ImpactCalculator, TierMultipliers,
};
use portpulse::application::discovery::RelationshipExtractor;
use portpulse::application::workflow::WorkflowEngine;
use portpulse::application::workflow::nodes::{
    AlertNode, ClassifyNode, DiscoverNode, ImpactNode, MatchFastNode, MonitorNode, ValidateNode,
};
use portpulse::domain::article::Article;
use portpulse::domain::portfolio::{Holding, PortfolioSnapshot};
use portpulse::domain::ports::{
    FilingsProvider, Generated, GenerationBudget, NewsSource, SchemaHint, TextGenerator,
};
use portpulse::domain::repositories::{
    AlertRepository, ArticleRepository, PrecedentRepository, RelationshipRepository,
};
use portpulse::infrastructure::Database;
use portpulse::infrastructure::persistence::repositories::{
    SqliteAgentLogRepository, SqliteAlertRepository, SqliteArticleRepository,
    SqliteCompanyRepository, SqliteMetadataRepository, SqlitePrecedentRepository,
    SqliteRelationshipRepository,
};
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Answers every call from canned text, keyed by schema hint.
pub struct StubGenerator {
    pub classification: String,
    pub relationships: String,
    pub degraded: bool,
}

impl StubGenerator {
    pub fn new(classification: &str, relationships: &str) -> Self {
        Self {
            classification: classification.to_string(),
            relationships: relationships.to_string(),
            degraded: false,
        }
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        hint: SchemaHint,
        _budget: GenerationBudget,
    ) -> Result<Generated> {
        let text = match hint {
            SchemaHint::Classification => self.classification.clone(),
            SchemaHint::RelationshipList => self.relationships.clone(),
            SchemaHint::FreeText => "ok".to_string(),
        };
        Ok(Generated {
            text,
            degraded: self.degraded,
        })
    }
}

/// Serves the same fixed articles on every fetch.
pub struct FixtureNewsSource {
    pub articles: Vec<Article>,
}

#[async_trait]
impl NewsSource for FixtureNewsSource {
    fn name(&self) -> &str {
        "fixture"
    }

    async fn fetch(&self, _queries: &[String]) -> Result<Vec<Article>> {
        Ok(self.articles.clone())
    }
}

pub struct NoFilings;

#[async_trait]
impl FilingsProvider for NoFilings {
    async fn filing_text(&self, _ticker: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

pub struct TestApp {
    pub db: Database,
    pub engine: WorkflowEngine,
    pub articles: Arc<dyn ArticleRepository>,
    pub relationships: Arc<dyn RelationshipRepository>,
    pub alerts: Arc<dyn AlertRepository>,
    pub precedents: Arc<dyn PrecedentRepository>,
}

pub async fn build_app(
    fixtures: Vec<Article>,
    generator: Arc<dyn TextGenerator>,
) -> Result<TestApp> {
    let db = Database::in_memory().await?;
    let pool = db.pool.clone();

    let articles: Arc<dyn ArticleRepository> = Arc::new(SqliteArticleRepository::new(pool.clone()));
    let relationships: Arc<dyn RelationshipRepository> =
        Arc::new(SqliteRelationshipRepository::new(pool.clone()));
    let alerts: Arc<dyn AlertRepository> = Arc::new(SqliteAlertRepository::new(pool.clone()));
    let precedents: Arc<dyn PrecedentRepository> =
        Arc::new(SqlitePrecedentRepository::new(pool.clone()));
    let companies = Arc::new(SqliteCompanyRepository::new(pool.clone()));
    let metadata = Arc::new(SqliteMetadataRepository::new(pool.clone()));
    let agent_logs = Arc::new(SqliteAgentLogRepository::new(pool.clone()));

    let extractor = Arc::new(RelationshipExtractor::new(
        generator.clone(),
        Arc::new(NoFilings),
        relationships.clone(),
        Duration::from_secs(10),
    ));

    let sources: Vec<Arc<dyn NewsSource>> =
        vec![Arc::new(FixtureNewsSource { articles: fixtures })];

    let engine = WorkflowEngine::new(
        MonitorNode::new(sources, articles.clone(), companies, metadata, 5),
        ClassifyNode::new(Classifier::new(generator.clone())),
        MatchFastNode::new(relationships.clone()),
        DiscoverNode::new(extractor, 4),
        ImpactNode::new(ImpactCalculator::new(
            precedents.clone(),
            relationships.clone(),
            TierMultipliers::default(),
            CriticalityMultipliers::default(),
        )),
        ValidateNode::new(ConfidenceValidator::new(0.70, 2)),
        AlertNode::new(alerts.clone(), 2.0, 0.5),
        agent_logs,
        2,
    );

    Ok(TestApp {
        db,
        engine,
        articles,
        relationships,
        alerts,
        precedents,
    })
}

pub fn portfolio(tickers: &[&str]) -> PortfolioSnapshot {
    PortfolioSnapshot {
        user_id: "test-user".to_string(),
        holdings: tickers
            .iter()
            .map(|t| Holding {
                user_id: "test-user".to_string(),
                ticker: t.to_string(),
                company_name: t.to_string(),
                quantity: Decimal::from_str("10").unwrap(),
                avg_price: Decimal::from_str("100").unwrap(),
                current_price: Decimal::from_str("100").unwrap(),
            })
            .collect(),
    }
}
