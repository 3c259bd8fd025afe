//! Maps an article onto the ten-factor taxonomy with signed sentiment.
//!
//! The primary path asks the governor for a strict JSON object; the fallback
//! is keyword matching over the factor tables plus local lexicon sentiment.

use crate::domain::article::Article;
use crate::domain::classification::{Classification, Sentiment};
use crate::domain::factors::MarketFactor;
use crate::domain::ports::{GenerationBudget, SchemaHint, TextGenerator};
use crate::infrastructure::news::SentimentAnalyzer;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

const HEURISTIC_CONFIDENCE: f64 = 0.5;

#[derive(Debug, Deserialize)]
struct ClassifierResponse {
    factor_name: String,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    sentiment_score: f64,
    #[serde(default)]
    reasoning: String,
    #[serde(default = "default_confidence")]
    confidence: f64,
    #[serde(default)]
    affected_sectors: Vec<String>,
}

fn default_confidence() -> f64 {
    0.85
}

pub struct Classifier {
    generator: Arc<dyn TextGenerator>,
    sentiment: SentimentAnalyzer,
}

impl Classifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            sentiment: SentimentAnalyzer::new(),
        }
    }

    pub async fn classify(&self, article: &Article) -> Classification {
        let prompt = self.build_prompt(article);

        match self
            .generator
            .generate(&prompt, SchemaHint::Classification, GenerationBudget::default())
            .await
        {
            Ok(generated) => match self.parse(&generated.text, generated.degraded, article) {
                Some(classification) => classification,
                None => {
                    warn!(
                        "Unparseable classification for article {}; using heuristic",
                        article.id
                    );
                    self.heuristic(article)
                }
            },
            Err(e) => {
                warn!("Governor failed for article {}: {}", article.id, e);
                self.heuristic(article)
            }
        }
    }

    fn build_prompt(&self, article: &Article) -> String {
        let factor_names = MarketFactor::ALL
            .iter()
            .map(|f| format!("- {}", f.display_name()))
            .collect::<Vec<_>>()
            .join("\n");

        let content: String = article.content.chars().take(1500).collect();

        format!(
            "Classify the following news article into EXACTLY ONE of these market factors \
             and score its sentiment from -1.0 (extremely negative) to +1.0 (extremely positive).\n\
             \n\
             Factors:\n{factor_names}\n\
             \n\
             Article Title: {title}\n\
             Article Content: {content}\n\
             \n\
             Return ONLY a valid JSON object:\n\
             {{\n\
               \"factor_name\": \"Exact Factor Name\",\n\
               \"sentiment\": \"positive|negative|neutral\",\n\
               \"sentiment_score\": 0.0,\n\
               \"reasoning\": \"1-2 sentence explanation\",\n\
               \"confidence\": 0.0,\n\
               \"affected_sectors\": [\"sector\"]\n\
             }}",
            title = article.title,
        )
    }

    fn parse(&self, text: &str, degraded: bool, article: &Article) -> Option<Classification> {
        let json = extract_json_object(text)?;
        let response: ClassifierResponse = serde_json::from_str(json).ok()?;

        let factor = MarketFactor::from_name(&response.factor_name)?;
        let sentiment = match response.sentiment.as_deref() {
            Some("positive") => Sentiment::Positive,
            Some("negative") => Sentiment::Negative,
            Some("neutral") => Sentiment::Neutral,
            _ => Sentiment::from_score(response.sentiment_score),
        };

        // A degraded (heuristic) governor answer never claims more certainty
        // than the local heuristic would.
        let confidence = if degraded {
            response.confidence.min(HEURISTIC_CONFIDENCE)
        } else {
            response.confidence
        };

        debug!(
            "Classified article {} as {} ({:.2})",
            article.id,
            factor.display_name(),
            response.sentiment_score
        );

        Some(
            Classification {
                article_id: article.id.clone(),
                ticker: article.primary_ticker(),
                factor,
                sentiment,
                sentiment_score: response.sentiment_score,
                reasoning: response.reasoning,
                confidence,
                affected_sectors: response.affected_sectors,
            }
            .clamped(),
        )
    }

    fn heuristic(&self, article: &Article) -> Classification {
        let text = format!("{} {}", article.title, article.content);
        let factor =
            MarketFactor::match_keywords(&text).unwrap_or(MarketFactor::MarketSentiment);
        let score = self.sentiment.analyze_news(&article.title, &article.content);

        Classification {
            article_id: article.id.clone(),
            ticker: article.primary_ticker(),
            factor,
            sentiment: Sentiment::from_score(score),
            sentiment_score: score,
            reasoning: format!(
                "Keyword heuristic matched factor '{}'",
                factor.display_name()
            ),
            confidence: HEURISTIC_CONFIDENCE,
            affected_sectors: Vec::new(),
        }
        .clamped()
    }
}

/// Slice the outermost JSON object out of a completion that may carry
/// markdown fences or prose around it.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::Generated;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;

    struct CannedGenerator {
        text: String,
        degraded: bool,
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
                degraded: self.degraded,
            })
        }
    }

    fn article() -> Article {
        Article::new(
            "NVIDIA Announces Breakthrough AI Chip",
            "https://example.com/nvda",
            "Reuters",
            Utc::now(),
            "NVIDIA unveiled a breakthrough accelerator, extending its industry lead.",
            vec!["NVDA".into()],
        )
    }

    #[tokio::test]
    async fn test_parses_strict_json() {
        let classifier = Classifier::new(Arc::new(CannedGenerator {
            text: r#"```json
{"factor_name": "Industry Trends", "sentiment": "positive", "sentiment_score": 0.6,
 "reasoning": "Product breakthrough", "confidence": 0.9, "affected_sectors": ["Semiconductors"]}
```"#
                .to_string(),
            degraded: false,
        }));

        let c = classifier.classify(&article()).await;
        assert_eq!(c.factor, MarketFactor::IndustryTrends);
        assert_eq!(c.sentiment, Sentiment::Positive);
        assert_eq!(c.sentiment_score, 0.6);
        assert_eq!(c.confidence, 0.9);
        assert_eq!(c.ticker, "NVDA");
    }

    #[tokio::test]
    async fn test_unknown_factor_falls_back_to_heuristic() {
        let classifier = Classifier::new(Arc::new(CannedGenerator {
            text: r#"{"factor_name": "Space Weather", "sentiment_score": 0.2}"#.to_string(),
            degraded: false,
        }));

        let c = classifier.classify(&article()).await;
        // "breakthrough" keyword -> Industry Trends, heuristic confidence
        assert_eq!(c.factor, MarketFactor::IndustryTrends);
        assert_eq!(c.confidence, 0.5);
    }

    #[tokio::test]
    async fn test_degraded_result_caps_confidence() {
        let classifier = Classifier::new(Arc::new(CannedGenerator {
            text: r#"{"factor_name": "Supply Chain", "sentiment": "negative",
 "sentiment_score": -0.7, "reasoning": "halt", "confidence": 0.95, "affected_sectors": []}"#
                .to_string(),
            degraded: true,
        }));

        let c = classifier.classify(&article()).await;
        assert_eq!(c.factor, MarketFactor::SupplyChain);
        assert!(c.confidence <= 0.5);
    }

    #[tokio::test]
    async fn test_scores_are_clamped() {
        let classifier = Classifier::new(Arc::new(CannedGenerator {
            text: r#"{"factor_name": "Currency", "sentiment_score": -4.0, "confidence": 1.7}"#
                .to_string(),
            degraded: false,
        }));

        let c = classifier.classify(&article()).await;
        assert_eq!(c.sentiment_score, -1.0);
        assert_eq!(c.confidence, 1.0);
    }
}
