//! Configuration module.
//!
//! Structured configuration loading from environment variables, organized by
//! domain: Workflow, Llm, News, and Scheduler.

mod llm_config;
mod news_config;
mod scheduler_config;
mod workflow_config;

pub use llm_config::LlmEnvConfig;
pub use news_config::NewsEnvConfig;
pub use scheduler_config::SchedulerEnvConfig;
pub use workflow_config::WorkflowEnvConfig;

use anyhow::{Context, Result};
use std::env;

/// Main application configuration, composed from the sub-modules.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub workflow: WorkflowEnvConfig,
    pub llm: LlmEnvConfig,
    pub news: NewsEnvConfig,
    pub scheduler: SchedulerEnvConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://data/portpulse.db".to_string()),
            workflow: WorkflowEnvConfig::from_env().context("Failed to load workflow config")?,
            llm: LlmEnvConfig::from_env().context("Failed to load LLM config")?,
            news: NewsEnvConfig::from_env(),
            scheduler: SchedulerEnvConfig::from_env()
                .context("Failed to load scheduler config")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_defaults() {
        let config = Config::from_env().expect("Should parse with defaults");
        assert_eq!(config.workflow.max_loops, 2);
        assert_eq!(config.workflow.confidence_threshold, 0.70);
        assert_eq!(config.llm.rate_limit_per_minute, 30);
        assert_eq!(config.workflow.probe_timeout_seconds, 10);
        assert_eq!(config.scheduler.workflow_interval_seconds, 300);
    }

    #[test]
    fn test_default_models_present_without_env() {
        let config = Config::from_env().unwrap();
        assert!(!config.llm.models.is_empty());
        assert!(config.llm.api_keys.is_empty() || !config.llm.api_keys[0].is_empty());
    }
}
