use crate::domain::article::Article;
use anyhow::Result;
use async_trait::async_trait;

/// Tells the governor which deterministic fallback applies when every
/// endpoint fails for a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaHint {
    /// Strict JSON object with factor/sentiment/confidence fields.
    Classification,
    /// Strict JSON array of {related_company, type, criticality, evidence}.
    RelationshipList,
    /// Prose; no structure expected.
    FreeText,
}

#[derive(Debug, Clone, Copy)]
pub struct GenerationBudget {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationBudget {
    fn default() -> Self {
        Self {
            max_output_tokens: 1500,
            temperature: 0.1,
        }
    }
}

/// A generated completion. `degraded` is set when the text came from the
/// heuristic fallback rather than a live endpoint, so callers can lower
/// their confidence.
#[derive(Debug, Clone)]
pub struct Generated {
    pub text: String,
    pub degraded: bool,
}

/// The single funnel for all generative calls. Tests substitute a stub that
/// returns canned JSON, which makes the whole workflow deterministic.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        hint: SchemaHint,
        budget: GenerationBudget,
    ) -> Result<Generated>;
}

/// Article ingress. `queries` are tickers or refined search phrases; how a
/// source interprets them is its own business.
#[async_trait]
pub trait NewsSource: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, queries: &[String]) -> Result<Vec<Article>>;
}

/// Annual-filing text for a public ticker, `None` when no filing is found.
#[async_trait]
pub trait FilingsProvider: Send + Sync {
    async fn filing_text(&self, ticker: &str) -> Result<Option<String>>;
}
