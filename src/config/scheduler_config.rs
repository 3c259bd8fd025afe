//! Scheduler job intervals and the portfolio owner.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct SchedulerEnvConfig {
    pub workflow_interval_seconds: u64,
    pub relationship_refresh_seconds: u64,
    pub portfolio_user_id: String,
}

impl SchedulerEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            workflow_interval_seconds: Self::parse_u64("WORKFLOW_INTERVAL_SECONDS", 300)?,
            relationship_refresh_seconds: Self::parse_u64("RELATIONSHIP_REFRESH_SECONDS", 3600)?,
            portfolio_user_id: env::var("PORTFOLIO_USER_ID")
                .unwrap_or_else(|_| "default".to_string()),
        })
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }
}
