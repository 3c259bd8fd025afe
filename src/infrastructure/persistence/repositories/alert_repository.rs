use crate::domain::alert::{Alert, AlertStatus, ReasoningStep, Severity};
use crate::domain::repositories::AlertRepository;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::str::FromStr;
use tracing::info;

pub struct SqliteAlertRepository {
    pool: SqlitePool,
}

impl SqliteAlertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Alert>> {
        let mut alerts = Vec::new();
        for row in rows {
            let severity_str: String = row.try_get("severity")?;
            let status_str: String = row.try_get("status")?;
            let urls_json: String = row.try_get("source_urls")?;
            let created_ts: i64 = row.try_get("created_at")?;

            alerts.push(Alert {
                id: row.try_get("id")?,
                headline: row.try_get("headline")?,
                severity: Severity::from_str(&severity_str)?,
                impact_pct: row.try_get("impact_pct")?,
                trigger_article_id: row.try_get("trigger_article_id")?,
                source_urls: serde_json::from_str(&urls_json).unwrap_or_default(),
                full_reasoning: row.try_get("full_reasoning")?,
                created_at: DateTime::<Utc>::from_timestamp(created_ts, 0)
                    .unwrap_or_else(Utc::now),
                status: AlertStatus::from_str(&status_str)?,
            });
        }
        Ok(alerts)
    }
}

#[async_trait]
impl AlertRepository for SqliteAlertRepository {
    async fn save(&self, alert: &Alert, steps: &[ReasoningStep]) -> Result<()> {
        if steps.is_empty() {
            bail!("Refusing to save alert {} without a reasoning trail", alert.id);
        }

        // One atomic unit: a failed trail write must roll the alert back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO alerts
                (id, headline, severity, impact_pct, trigger_article_id,
                 source_urls, full_reasoning, created_at, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                headline = excluded.headline,
                severity = excluded.severity,
                impact_pct = excluded.impact_pct,
                full_reasoning = excluded.full_reasoning
            "#,
        )
        .bind(&alert.id)
        .bind(&alert.headline)
        .bind(alert.severity.as_str())
        .bind(alert.impact_pct)
        .bind(&alert.trigger_article_id)
        .bind(serde_json::to_string(&alert.source_urls)?)
        .bind(&alert.full_reasoning)
        .bind(alert.created_at.timestamp())
        .bind(alert.status.as_str())
        .execute(&mut *tx)
        .await
        .context("Failed to save alert")?;

        // Re-delivery replaces the trail rather than appending duplicates.
        sqlx::query("DELETE FROM impact_analysis WHERE alert_id = ?")
            .bind(&alert.id)
            .execute(&mut *tx)
            .await?;

        for step in steps {
            sqlx::query(
                r#"
                INSERT INTO impact_analysis (alert_id, ticker, impact_level, reasoning, confidence)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&alert.id)
            .bind(&step.ticker)
            .bind(step.level)
            .bind(&step.reasoning)
            .bind(step.confidence)
            .execute(&mut *tx)
            .await
            .context("Failed to save reasoning step")?;
        }

        tx.commit().await?;
        info!(
            "Persisted alert {} with {} reasoning steps",
            alert.id,
            steps.len()
        );
        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Alert>> {
        let row = sqlx::query("SELECT * FROM alerts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.map_rows(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Alert>> {
        let rows = sqlx::query("SELECT * FROM alerts ORDER BY created_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        self.map_rows(rows)
    }

    async fn reasoning_for(
        &self,
        alert_ids: &[String],
    ) -> Result<HashMap<String, Vec<ReasoningStep>>> {
        if alert_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Single IN query for the whole batch.
        let placeholders = alert_ids.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT alert_id, ticker, impact_level, reasoning, confidence \
             FROM impact_analysis WHERE alert_id IN ({}) ORDER BY id",
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for id in alert_ids {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;

        let mut trails: HashMap<String, Vec<ReasoningStep>> = HashMap::new();
        for row in rows {
            let alert_id: String = row.try_get("alert_id")?;
            trails.entry(alert_id).or_default().push(ReasoningStep {
                ticker: row.try_get("ticker")?,
                level: row.try_get("impact_level")?,
                reasoning: row.try_get("reasoning")?,
                confidence: row.try_get("confidence")?,
            });
        }
        Ok(trails)
    }
}
