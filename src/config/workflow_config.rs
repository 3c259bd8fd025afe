//! Workflow tuning parsed from environment variables: the loop bound, the
//! confidence gate, probe deadlines, fan-out ceiling, and severity bands.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct WorkflowEnvConfig {
    pub max_loops: u32,
    pub confidence_threshold: f64,
    pub probe_timeout_seconds: u64,
    pub discovery_worker_ceiling: usize,
    pub severity_threshold_high: f64,
    pub severity_threshold_medium: f64,
    pub max_articles_per_cycle: usize,
}

impl WorkflowEnvConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            max_loops: Self::parse_u32("MAX_LOOPS", 2)?,
            confidence_threshold: Self::parse_f64("CONFIDENCE_THRESHOLD", 0.70)?,
            probe_timeout_seconds: Self::parse_u64("PROBE_TIMEOUT_SECONDS", 10)?,
            discovery_worker_ceiling: Self::parse_usize("DISCOVERY_WORKER_CEILING", 4)?,
            severity_threshold_high: Self::parse_f64("SEVERITY_THRESHOLD_HIGH", 2.0)?,
            severity_threshold_medium: Self::parse_f64("SEVERITY_THRESHOLD_MEDIUM", 0.5)?,
            max_articles_per_cycle: Self::parse_usize("MAX_ARTICLES_PER_CYCLE", 5)?,
        })
    }

    fn parse_u32(key: &str, default: u32) -> Result<u32> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u32>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u64(key: &str, default: u64) -> Result<u64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u64>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
