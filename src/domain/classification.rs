use crate::domain::factors::MarketFactor;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn from_score(score: f64) -> Self {
        if score > 0.1 {
            Sentiment::Positive
        } else if score < -0.1 {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }
}

/// Output of the classifier for one article. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub article_id: String,
    /// Primary mentioned company, "UNKNOWN" when the article names none.
    pub ticker: String,
    pub factor: MarketFactor,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub reasoning: String,
    pub confidence: f64,
    pub affected_sectors: Vec<String>,
}

impl Classification {
    /// Clamp numeric fields into their documented ranges.
    pub fn clamped(mut self) -> Self {
        self.sentiment_score = self.sentiment_score.clamp(-1.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        self
    }

    pub fn is_high_priority(&self) -> bool {
        self.sentiment_score.abs() > 0.5
    }
}
