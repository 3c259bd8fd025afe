//! Per-ticker relationship discovery across four concurrent source probes.
//!
//! Every probe carries its own deadline and captures its own failures: a
//! probe that times out or errors yields an empty list and never disturbs
//! the others. Probe outputs are concatenated, fused, and written through
//! the relationship store.

use crate::application::discovery::fusion;
use crate::domain::article::Article;
use crate::domain::ports::{FilingsProvider, GenerationBudget, SchemaHint, TextGenerator};
use crate::domain::relationship::{
    Criticality, DiscoverySource, FusedRelationship, RawRelationship, RelationType,
};
use crate::domain::repositories::RelationshipRepository;
use anyhow::Result;
use serde::Deserialize;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const SEC_CONFIDENCE: f64 = 0.92;
const NEWS_CONFIDENCE: f64 = 0.70;
const LLM_CONFIDENCE: f64 = 0.45;

#[derive(Debug, Clone)]
pub struct DiscoveryOutcome {
    pub ticker: String,
    pub relationships: Vec<FusedRelationship>,
    pub sources_used: usize,
}

#[derive(Debug, Deserialize)]
struct RelationshipEntry {
    related_company: String,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    criticality: String,
    #[serde(default)]
    evidence: String,
}

pub struct RelationshipExtractor {
    generator: Arc<dyn TextGenerator>,
    filings: Arc<dyn FilingsProvider>,
    relationships: Arc<dyn RelationshipRepository>,
    probe_timeout: Duration,
}

impl RelationshipExtractor {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        filings: Arc<dyn FilingsProvider>,
        relationships: Arc<dyn RelationshipRepository>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            generator,
            filings,
            relationships,
            probe_timeout,
        }
    }

    /// Tickers look public when they are short and unspaced; long, spaced
    /// names are private entities with no filings to probe.
    fn is_public(ticker: &str) -> bool {
        ticker.len() <= 5 && !ticker.contains(' ')
    }

    /// Run all four probes for one ticker, fuse, and persist. Isolated probe
    /// failures degrade to empty lists.
    pub async fn discover(
        &self,
        ticker: &str,
        articles: &[Article],
        portfolio_tickers: &[String],
    ) -> Result<DiscoveryOutcome> {
        let ticker = ticker.to_uppercase();
        debug!("Dynamic discovery for {}", ticker);

        let (sec, llm, news, web) = tokio::join!(
            self.bounded("sec", self.filings_probe(&ticker)),
            self.bounded("llm", self.llm_probe(&ticker)),
            self.bounded("news", self.news_probe(&ticker, articles, portfolio_tickers)),
            self.bounded("web", self.web_probe(&ticker)),
        );

        let sources_used = [&sec, &llm, &news, &web]
            .iter()
            .filter(|r| !r.is_empty())
            .count();

        let mut raw = Vec::new();
        raw.extend(sec);
        raw.extend(llm);
        raw.extend(news);
        raw.extend(web);

        let raw_count = raw.len();
        let fused = fusion::fuse_raw(raw);

        if !fused.is_empty() {
            self.relationships.upsert_all(&ticker, &fused).await?;
        }

        info!(
            "Discovery for {}: {} raw -> {} fused ({} of 4 sources)",
            ticker,
            raw_count,
            fused.len(),
            sources_used
        );

        Ok(DiscoveryOutcome {
            ticker,
            relationships: fused,
            sources_used,
        })
    }

    /// Wrap a probe with its individual deadline; timeouts and errors both
    /// collapse to an empty result.
    async fn bounded<F>(&self, name: &str, probe: F) -> Vec<RawRelationship>
    where
        F: Future<Output = Result<Vec<RawRelationship>>>,
    {
        match tokio::time::timeout(self.probe_timeout, probe).await {
            Ok(Ok(rels)) => rels,
            Ok(Err(e)) => {
                warn!("Probe '{}' failed: {}", name, e);
                Vec::new()
            }
            Err(_) => {
                warn!("Probe '{}' timed out after {:?}", name, self.probe_timeout);
                Vec::new()
            }
        }
    }

    /// Filings probe: highest-confidence source, public tickers only.
    async fn filings_probe(&self, ticker: &str) -> Result<Vec<RawRelationship>> {
        if !Self::is_public(ticker) {
            return Ok(Vec::new());
        }

        let Some(text) = self.filings.filing_text(ticker).await? else {
            return Ok(Vec::new());
        };

        let excerpt: String = text.chars().take(8000).collect();
        let prompt = format!(
            "Analyze this excerpt from an annual filing for {ticker}. Extract every \
             significant supply-chain relationship (suppliers, customers, strategic partners).\n\
             \n\
             Text: {excerpt}\n\
             \n\
             Return ONLY a valid JSON array:\n\
             [{{\"related_company\": \"NAME\", \"type\": \"supplier|customer|partner\", \
             \"criticality\": \"critical|high|medium|low\", \"evidence\": \"brief quote\"}}]",
        );

        let generated = self
            .generator
            .generate(&prompt, SchemaHint::RelationshipList, GenerationBudget::default())
            .await?;

        Ok(Self::parse_entries(
            &generated.text,
            DiscoverySource::SecEdgar,
            SEC_CONFIDENCE,
        ))
    }

    /// LLM inductive probe: asks the model directly, lowest base confidence.
    async fn llm_probe(&self, ticker: &str) -> Result<Vec<RawRelationship>> {
        let prompt = format!(
            "Identify the top 5 strategic suppliers and customers for {ticker}.\n\
             Return ONLY a valid JSON array:\n\
             [{{\"related_company\": \"Company Name\", \"type\": \"supplier|customer\", \
             \"criticality\": \"high|medium|low\", \"evidence\": \"one line\"}}]",
        );

        let generated = self
            .generator
            .generate(&prompt, SchemaHint::RelationshipList, GenerationBudget::default())
            .await?;

        Ok(Self::parse_entries(
            &generated.text,
            DiscoverySource::LlmInference,
            LLM_CONFIDENCE,
        ))
    }

    /// News-context probe: co-mentions of this ticker with a portfolio ticker
    /// in the current cycle's articles.
    async fn news_probe(
        &self,
        ticker: &str,
        articles: &[Article],
        portfolio_tickers: &[String],
    ) -> Result<Vec<RawRelationship>> {
        let mut rels = Vec::new();

        for article in articles {
            if !article.companies_mentioned.iter().any(|c| c == ticker) {
                continue;
            }
            for p in portfolio_tickers {
                if p == ticker || !article.companies_mentioned.iter().any(|c| c == p) {
                    continue;
                }
                rels.push(RawRelationship {
                    related_company: p.clone(),
                    rel_type: RelationType::Supplier,
                    criticality: Criticality::Medium,
                    evidence: format!("Co-mentioned in '{}'", article.title),
                    source: DiscoverySource::NewsReport,
                    confidence: NEWS_CONFIDENCE,
                });
            }
        }

        Ok(rels)
    }

    /// Reserved slot for scraping investor-relations pages.
    async fn web_probe(&self, _ticker: &str) -> Result<Vec<RawRelationship>> {
        Ok(Vec::new())
    }

    /// Parse a JSON array completion into raw relationships, skipping
    /// malformed entries.
    fn parse_entries(
        text: &str,
        source: DiscoverySource,
        confidence: f64,
    ) -> Vec<RawRelationship> {
        let Some(json) = extract_json_array(text) else {
            return Vec::new();
        };
        let Ok(entries) = serde_json::from_str::<Vec<RelationshipEntry>>(json) else {
            return Vec::new();
        };

        entries
            .into_iter()
            .filter_map(|entry| {
                let rel_type = RelationType::from_str(&entry.rel_type).ok()?;
                let criticality =
                    Criticality::from_str(&entry.criticality).unwrap_or(Criticality::Medium);
                Some(RawRelationship {
                    related_company: entry.related_company,
                    rel_type,
                    criticality,
                    evidence: entry.evidence,
                    source,
                    confidence,
                })
            })
            .collect()
    }
}

/// Slice the outermost JSON array out of a completion that may carry
/// markdown fences or prose around it.
fn extract_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Generated;
    use crate::domain::relationship::Relationship;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    struct CannedGenerator {
        text: String,
    }

    #[async_trait]
    impl TextGenerator for CannedGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _hint: SchemaHint,
            _budget: GenerationBudget,
        ) -> Result<Generated> {
            Ok(Generated {
                text: self.text.clone(),
                degraded: false,
            })
        }
    }

    struct NoFilings;

    #[async_trait]
    impl FilingsProvider for NoFilings {
        async fn filing_text(&self, _ticker: &str) -> Result<Option<String>> {
            Ok(None)
        }
    }

    #[derive(Default)]
    struct RecordingRepo {
        upserts: Mutex<Vec<(String, Vec<FusedRelationship>)>>,
    }

    #[async_trait]
    impl RelationshipRepository for RecordingRepo {
        async fn upsert_all(
            &self,
            source_ticker: &str,
            fused: &[FusedRelationship],
        ) -> Result<()> {
            self.upserts
                .lock()
                .unwrap()
                .push((source_ticker.to_string(), fused.to_vec()));
            Ok(())
        }

        async fn for_source(&self, _source_ticker: &str) -> Result<Vec<Relationship>> {
            Ok(Vec::new())
        }

        async fn all(&self, _limit: i64) -> Result<Vec<Relationship>> {
            Ok(Vec::new())
        }
    }

    fn extractor(llm_json: &str, repo: Arc<RecordingRepo>) -> RelationshipExtractor {
        RelationshipExtractor::new(
            Arc::new(CannedGenerator {
                text: llm_json.to_string(),
            }),
            Arc::new(NoFilings),
            repo,
            Duration::from_secs(10),
        )
    }

    #[test]
    fn test_public_ticker_heuristic() {
        assert!(RelationshipExtractor::is_public("TSM"));
        assert!(RelationshipExtractor::is_public("GOOGL"));
        assert!(!RelationshipExtractor::is_public("Foxconn Industrial"));
        assert!(!RelationshipExtractor::is_public("LONGTICKER"));
    }

    #[test]
    fn test_parse_entries_skips_malformed() {
        let text = r#"```json
[{"related_company": "AAPL", "type": "customer", "criticality": "critical", "evidence": "e"},
 {"related_company": "XYZ", "type": "frenemy", "criticality": "high", "evidence": "e"}]
```"#;
        let entries =
            RelationshipExtractor::parse_entries(text, DiscoverySource::SecEdgar, 0.92);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].related_company, "AAPL");
        assert_eq!(entries[0].confidence, 0.92);
    }

    #[tokio::test]
    async fn test_discover_fuses_and_persists() {
        let repo = Arc::new(RecordingRepo::default());
        let ext = extractor(
            r#"[{"related_company": "AAPL", "type": "supplier", "criticality": "high", "evidence": "llm"}]"#,
            repo.clone(),
        );

        let article = Article::new(
            "TSMC and Apple expand 3nm deal",
            "https://example.com/tsm-aapl",
            "Wire",
            Utc::now(),
            "TSMC will supply Apple with additional capacity.",
            vec!["TSM".into(), "AAPL".into()],
        );

        let outcome = ext
            .discover("TSM", &[article], &["AAPL".to_string()])
            .await
            .unwrap();

        // LLM probe (supplier/AAPL) + news probe (supplier/AAPL) agree -> one
        // fused edge with boosted confidence.
        assert_eq!(outcome.relationships.len(), 1);
        let rel = &outcome.relationships[0];
        assert_eq!(rel.related_company, "AAPL");
        assert!((rel.confidence - (NEWS_CONFIDENCE + 0.15)).abs() < 1e-9);
        assert_eq!(outcome.sources_used, 2);

        let upserts = repo.upserts.lock().unwrap();
        assert_eq!(upserts.len(), 1);
        assert_eq!(upserts[0].0, "TSM");
    }

    #[tokio::test]
    async fn test_discover_twice_is_stable() {
        let repo = Arc::new(RecordingRepo::default());
        let ext = extractor(
            r#"[{"related_company": "AAPL", "type": "supplier", "criticality": "high", "evidence": "llm"}]"#,
            repo.clone(),
        );

        let first = ext.discover("TSM", &[], &[]).await.unwrap();
        let second = ext.discover("TSM", &[], &[]).await.unwrap();

        assert_eq!(first.relationships.len(), second.relationships.len());
        for (a, b) in first.relationships.iter().zip(second.relationships.iter()) {
            assert_eq!(a.related_company, b.related_company);
            assert_eq!(a.confidence, b.confidence);
        }
    }
}
