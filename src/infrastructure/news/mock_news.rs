use crate::domain::article::Article;
use crate::domain::ports::NewsSource;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

/// Deterministic fixture articles for demos and offline runs. Returns the
/// supply-chain scenario when any query mentions one of its companies,
/// otherwise a quiet generic item.
pub struct MockNewsSource;

impl MockNewsSource {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MockNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NewsSource for MockNewsSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, queries: &[String]) -> Result<Vec<Article>> {
        info!("MockNewsSource serving fixtures for {:?}", queries);

        let scenario_tickers = ["TSM", "AAPL", "NVDA", "AMD"];
        let wants_scenario = queries.iter().any(|q| {
            let upper = q.to_uppercase();
            scenario_tickers.iter().any(|t| upper.contains(t))
        });

        if wants_scenario {
            return Ok(vec![
                Article::new(
                    "TSMC Halts Production After Taiwan Earthquake",
                    "https://news.example.com/tsmc-production-halt",
                    "MockWire",
                    Utc::now(),
                    "TSMC has halted production at several advanced fabs following a major \
                     earthquake, an unexpected disruption to the global chip supply chain \
                     feeding Apple and NVIDIA.",
                    vec!["TSM".into(), "AAPL".into(), "NVDA".into()],
                ),
                Article::new(
                    "NVIDIA Announces Breakthrough AI Chip",
                    "https://news.example.com/nvda-breakthrough",
                    "MockWire",
                    Utc::now(),
                    "NVIDIA unveiled a breakthrough accelerator with record performance, \
                     extending its industry lead in AI compute adoption.",
                    vec!["NVDA".into()],
                ),
            ]);
        }

        Ok(vec![Article::new(
            "Markets Steady Ahead of Economic Data",
            "https://news.example.com/markets-steady",
            "MockWire",
            Utc::now(),
            "Equities traded in a narrow range as investors awaited fresh data.",
            vec![],
        )])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scenario_served_for_known_tickers() {
        let source = MockNewsSource::new();
        let articles = source.fetch(&["AAPL".to_string()]).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles[0].companies_mentioned.contains(&"TSM".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_is_deterministic_ids() {
        let source = MockNewsSource::new();
        let a = source.fetch(&["NVDA".to_string()]).await.unwrap();
        let b = source.fetch(&["NVDA".to_string()]).await.unwrap();
        assert_eq!(a[0].id, b[0].id);
    }
}
