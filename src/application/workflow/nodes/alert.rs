use crate::application::workflow::nodes::WorkflowNode;
use crate::application::workflow::state::{AlertOutput, StatePatch, WorkflowState};
use crate::domain::alert::{Alert, AlertStatus, ReasoningStep, Severity};
use crate::domain::repositories::AlertRepository;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{info, warn};

/// Stage 6: persist the alert and its reasoning trail as one atomic unit.
///
/// With an empty trail at the loop bound a single best-effort step carrying
/// the attained confidence is synthesized, so every persisted alert stays
/// auditable. With no ingested article there is nothing to reference and no
/// alert is emitted.
pub struct AlertNode {
    alerts: Arc<dyn AlertRepository>,
    severity_threshold_high: f64,
    severity_threshold_medium: f64,
}

impl AlertNode {
    pub fn new(
        alerts: Arc<dyn AlertRepository>,
        severity_threshold_high: f64,
        severity_threshold_medium: f64,
    ) -> Self {
        Self {
            alerts,
            severity_threshold_high,
            severity_threshold_medium,
        }
    }
}

#[async_trait]
impl WorkflowNode for AlertNode {
    fn name(&self) -> &'static str {
        "alert_generator"
    }

    async fn run(&self, state: &WorkflowState) -> Result<StatePatch> {
        let articles = state.articles();
        if articles.is_empty() {
            warn!("No ingested article to anchor an alert; skipping emission");
            return Ok(StatePatch {
                alert: Some(AlertOutput { alert_id: None }),
                ..Default::default()
            });
        }

        let portfolio_impact = state
            .impact
            .as_ref()
            .map(|i| i.portfolio_impact)
            .unwrap_or_default();
        let confidence_score = state
            .validation
            .as_ref()
            .map(|v| v.confidence_score)
            .unwrap_or(0.5);

        let mut trail: Vec<ReasoningStep> = state
            .impact
            .as_ref()
            .map(|i| i.reasoning_trail.clone())
            .unwrap_or_default();

        if trail.is_empty() {
            trail.push(ReasoningStep {
                ticker: state
                    .portfolio
                    .tickers()
                    .first()
                    .cloned()
                    .unwrap_or_else(|| "PORTFOLIO".to_string()),
                level: 1,
                reasoning: format!(
                    "Best-effort assessment at loop bound; attained confidence {:.2}",
                    confidence_score
                ),
                confidence: confidence_score,
            });
        }

        // The highest-priority article anchors the alert; fall back to the
        // first fetched one.
        let high_priority = state.classify.as_ref().and_then(|c| c.high_priority.first());
        let trigger = high_priority
            .and_then(|id| articles.iter().find(|a| &a.id == id))
            .unwrap_or(&articles[0]);

        // Deterministic id: re-delivery of the same analysis upserts the same
        // alert instead of duplicating it.
        let mut hasher = Sha256::new();
        hasher.update(trigger.id.as_bytes());
        hasher.update(format!("{:.4}", portfolio_impact.impact_pct).as_bytes());
        let digest = hasher.finalize();

        let alert = Alert {
            id: format!(
                "ALERT-{}-{}",
                Utc::now().format("%Y%m%d"),
                hex::encode(&digest[..4])
            ),
            headline: format!(
                "Portfolio Risk Alert: {:+.2}% projected impact ({})",
                portfolio_impact.impact_pct, trigger.title
            ),
            severity: Severity::from_impact_pct(
                portfolio_impact.impact_pct,
                self.severity_threshold_high,
                self.severity_threshold_medium,
            ),
            impact_pct: portfolio_impact.impact_pct,
            trigger_article_id: trigger.id.clone(),
            source_urls: articles.iter().map(|a| a.url.clone()).collect(),
            full_reasoning: trail
                .iter()
                .map(|s| format!("[L{}] {}: {}", s.level, s.ticker, s.reasoning))
                .collect::<Vec<_>>()
                .join("\n"),
            created_at: Utc::now(),
            status: AlertStatus::Active,
        };

        self.alerts.save(&alert, &trail).await?;

        info!(
            "Alert {} persisted (severity {}, {:+.2}%)",
            alert.id, alert.severity, alert.impact_pct
        );

        Ok(StatePatch {
            alert: Some(AlertOutput {
                alert_id: Some(alert.id),
            }),
            ..Default::default()
        })
    }
}
