use crate::domain::repositories::MetadataRepository;
use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// Flat per-character pricing; close enough for budget tracking.
const INPUT_COST_PER_1K_CHARS: f64 = 0.000075;
const OUTPUT_COST_PER_1K_CHARS: f64 = 0.0003;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DailyUsage {
    requests: u64,
    input_chars: u64,
    output_chars: u64,
    estimated_cost: f64,
}

/// Persists a per-day counter of generative calls under
/// `llm_usage:<YYYY-MM-DD>` in the metadata table.
pub struct UsageTracker {
    metadata: Arc<dyn MetadataRepository>,
}

impl UsageTracker {
    pub fn new(metadata: Arc<dyn MetadataRepository>) -> Self {
        Self { metadata }
    }

    pub async fn record(&self, model: &str, input_chars: usize, output_chars: usize) -> Result<()> {
        let key = format!("llm_usage:{}", Utc::now().format("%Y-%m-%d"));

        let mut usage: DailyUsage = match self.metadata.get(&key).await? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => DailyUsage::default(),
        };

        usage.requests += 1;
        usage.input_chars += input_chars as u64;
        usage.output_chars += output_chars as u64;
        usage.estimated_cost += (input_chars as f64 / 1000.0) * INPUT_COST_PER_1K_CHARS
            + (output_chars as f64 / 1000.0) * OUTPUT_COST_PER_1K_CHARS;

        self.metadata
            .put(&key, &serde_json::to_string(&usage)?)
            .await?;

        info!(
            "LLM usage [{}]: {} requests today, est. ${:.4}",
            model, usage.requests, usage.estimated_cost
        );
        Ok(())
    }
}
