use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

pub mod scheduler;

use crate::application::analysis::{
    Classifier, ConfidenceValidator, CriticalityMultipliers, ImpactCalculator, TierMultipliers,
};
use crate::application::discovery::RelationshipExtractor;
use crate::application::system::scheduler::Scheduler;
use crate::application::workflow::nodes::{
    AlertNode, ClassifyNode, DiscoverNode, ImpactNode, MatchFastNode, MonitorNode, ValidateNode,
};
use crate::application::workflow::{WorkflowEngine, WorkflowState};
use crate::config::Config;
use crate::domain::ports::{NewsSource, TextGenerator};
use crate::domain::repositories::{
    AlertRepository, CompanyRepository, HoldingRepository, PrecedentRepository,
    RelationshipRepository,
};
use crate::infrastructure::Database;
use crate::infrastructure::edgar::EdgarClient;
use crate::infrastructure::llm::{GovernorSettings, LlmGovernor, UsageTracker};
use crate::infrastructure::news::{MockNewsSource, RssNewsSource};
use crate::infrastructure::persistence::repositories::{
    SqliteAgentLogRepository, SqliteAlertRepository, SqliteArticleRepository,
    SqliteCompanyRepository, SqliteHoldingRepository, SqliteMetadataRepository,
    SqlitePrecedentRepository, SqliteRelationshipRepository,
};
use crate::infrastructure::persistence::seed::SeedService;

/// The assembled system: every collaborator constructed once at startup and
/// passed by reference, no implicit globals.
pub struct Application {
    pub config: Config,
    pub db: Database,
    pub engine: Arc<WorkflowEngine>,
    pub extractor: Arc<RelationshipExtractor>,
    pub holdings: Arc<dyn HoldingRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub relationships: Arc<dyn RelationshipRepository>,
    pub precedents: Arc<dyn PrecedentRepository>,
    pub alerts: Arc<dyn AlertRepository>,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self> {
        info!("Building application...");

        let db = Database::new(&config.database_url).await?;
        let pool = db.pool.clone();

        let articles = Arc::new(SqliteArticleRepository::new(pool.clone()));
        let relationships: Arc<dyn RelationshipRepository> =
            Arc::new(SqliteRelationshipRepository::new(pool.clone()));
        let alerts: Arc<dyn AlertRepository> = Arc::new(SqliteAlertRepository::new(pool.clone()));
        let precedents: Arc<dyn PrecedentRepository> =
            Arc::new(SqlitePrecedentRepository::new(pool.clone()));
        let companies: Arc<dyn CompanyRepository> =
            Arc::new(SqliteCompanyRepository::new(pool.clone()));
        let holdings: Arc<dyn HoldingRepository> =
            Arc::new(SqliteHoldingRepository::new(pool.clone()));
        let metadata = Arc::new(SqliteMetadataRepository::new(pool.clone()));
        let agent_logs = Arc::new(SqliteAgentLogRepository::new(pool.clone()));

        let governor: Arc<dyn TextGenerator> = Arc::new(LlmGovernor::new(
            GovernorSettings {
                base_url: config.llm.base_url.clone(),
                api_keys: config.llm.api_keys.clone(),
                models: config.llm.models.clone(),
                rate_limit_per_minute: config.llm.rate_limit_per_minute,
                retry_max: config.llm.retry_max,
                retry_base_seconds: config.llm.retry_base_seconds,
                retry_multiplier: config.llm.retry_multiplier,
            },
            Some(UsageTracker::new(metadata.clone())),
        ));

        let seen_urls = Arc::new(Mutex::new(HashSet::new()));
        let mut sources: Vec<Arc<dyn NewsSource>> = Vec::new();
        if config.news.use_mock {
            sources.push(Arc::new(MockNewsSource::new()));
        }
        for url in &config.news.feed_urls {
            sources.push(Arc::new(RssNewsSource::new(url, seen_urls.clone())));
        }
        if sources.is_empty() {
            warn!("No news sources configured; falling back to the mock source");
            sources.push(Arc::new(MockNewsSource::new()));
        }

        let extractor = Arc::new(RelationshipExtractor::new(
            governor.clone(),
            Arc::new(EdgarClient::new()),
            relationships.clone(),
            Duration::from_secs(config.workflow.probe_timeout_seconds),
        ));

        let engine = Arc::new(WorkflowEngine::new(
            MonitorNode::new(
                sources,
                articles,
                companies.clone(),
                metadata,
                config.workflow.max_articles_per_cycle,
            ),
            ClassifyNode::new(Classifier::new(governor.clone())),
            MatchFastNode::new(relationships.clone()),
            DiscoverNode::new(extractor.clone(), config.workflow.discovery_worker_ceiling),
            ImpactNode::new(ImpactCalculator::new(
                precedents.clone(),
                relationships.clone(),
                TierMultipliers::default(),
                CriticalityMultipliers::default(),
            )),
            ValidateNode::new(ConfidenceValidator::new(
                config.workflow.confidence_threshold,
                config.workflow.max_loops,
            )),
            AlertNode::new(
                alerts.clone(),
                config.workflow.severity_threshold_high,
                config.workflow.severity_threshold_medium,
            ),
            agent_logs,
            config.workflow.max_loops,
        ));

        Ok(Self {
            config,
            db,
            engine,
            extractor,
            holdings,
            companies,
            relationships,
            precedents,
            alerts,
        })
    }

    pub async fn seed(&self) -> Result<()> {
        SeedService::run(
            self.companies.as_ref(),
            self.relationships.as_ref(),
            self.precedents.as_ref(),
            self.holdings.as_ref(),
            &self.config.scheduler.portfolio_user_id,
        )
        .await
    }

    /// One workflow invocation over the persisted portfolio.
    pub async fn run_once(&self) -> Result<WorkflowState> {
        let snapshot = self
            .holdings
            .snapshot(&self.config.scheduler.portfolio_user_id)
            .await?;
        self.engine.run(snapshot).await
    }

    /// Run the periodic driver until shutdown. The workflow job holds a run
    /// lock so an overlapping tick is skipped rather than queued.
    pub async fn start(self: Arc<Self>) -> Result<()> {
        let mut scheduler = Scheduler::new(Duration::from_secs(10));
        let run_lock = Arc::new(Mutex::new(()));

        let app = self.clone();
        let lock = run_lock.clone();
        scheduler.add_job(
            "workflow",
            Duration::from_secs(self.config.scheduler.workflow_interval_seconds),
            move || {
                let app = app.clone();
                let lock = lock.clone();
                Box::pin(async move {
                    let Ok(_guard) = lock.try_lock() else {
                        info!("Previous workflow run still executing; skipping tick");
                        return Ok(());
                    };
                    let state = app.run_once().await?;
                    info!(
                        "Scheduled workflow finished (loops: {}, alert: {:?})",
                        state.loop_count,
                        state.alert.as_ref().and_then(|a| a.alert_id.clone())
                    );
                    Ok(())
                })
            },
        );

        let app = self.clone();
        scheduler.add_job(
            "relationship-refresh",
            Duration::from_secs(self.config.scheduler.relationship_refresh_seconds),
            move || {
                let app = app.clone();
                Box::pin(async move {
                    let snapshot = app
                        .holdings
                        .snapshot(&app.config.scheduler.portfolio_user_id)
                        .await?;
                    let tickers = snapshot.tickers();
                    for ticker in &tickers {
                        if let Err(e) = app.extractor.discover(ticker, &[], &tickers).await {
                            warn!("Relationship refresh failed for {}: {}", ticker, e);
                        }
                    }
                    Ok(())
                })
            },
        );

        scheduler.run().await;
        Ok(())
    }
}
