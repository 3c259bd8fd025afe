//! Governor configuration: endpoint, key/model rotation lists, rate limit,
//! and the retry budget.

use anyhow::{Context, Result};
use std::env;

const DEFAULT_MODELS: &str = "google/gemini-2.0-flash-exp:free,\
mistralai/mistral-7b-instruct:free,meta-llama/llama-3.2-3b-instruct:free";

#[derive(Debug, Clone)]
pub struct LlmEnvConfig {
    pub base_url: String,
    /// Empty means every call answers from the deterministic heuristic.
    pub api_keys: Vec<String>,
    pub models: Vec<String>,
    pub rate_limit_per_minute: usize,
    pub retry_max: u32,
    pub retry_base_seconds: f64,
    pub retry_multiplier: f64,
}

impl LlmEnvConfig {
    pub fn from_env() -> Result<Self> {
        let api_keys = Self::parse_list("LLM_API_KEYS", "");
        let models = Self::parse_list("LLM_MODELS", DEFAULT_MODELS);

        Ok(Self {
            base_url: env::var("LLM_BASE_URL")
                .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string()),
            api_keys,
            models,
            rate_limit_per_minute: Self::parse_usize("RATE_LIMIT_PER_MINUTE", 30)?,
            retry_max: Self::parse_u32("RETRY_MAX", 3)?,
            retry_base_seconds: Self::parse_f64("RETRY_BASE_SECONDS", 2.0)?,
            retry_multiplier: Self::parse_f64("RETRY_MULTIPLIER", 2.0)?,
        })
    }

    fn parse_list(key: &str, default: &str) -> Vec<String> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect()
    }

    fn parse_usize(key: &str, default: usize) -> Result<usize> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<usize>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_u32(key: &str, default: u32) -> Result<u32> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<u32>()
            .context(format!("Failed to parse {}", key))
    }

    fn parse_f64(key: &str, default: f64) -> Result<f64> {
        env::var(key)
            .unwrap_or_else(|_| default.to_string())
            .parse::<f64>()
            .context(format!("Failed to parse {}", key))
    }
}
