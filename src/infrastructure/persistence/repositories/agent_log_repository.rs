use crate::domain::repositories::AgentLogRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

pub struct SqliteAgentLogRepository {
    pool: SqlitePool,
}

impl SqliteAgentLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentLogRepository for SqliteAgentLogRepository {
    async fn append(&self, agent_name: &str, task: &str, result_summary: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO agent_logs (agent_name, task, result_summary, timestamp)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(agent_name)
        .bind(task)
        .bind(result_summary)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to append agent log")?;

        Ok(())
    }
}
