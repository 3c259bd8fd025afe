//! Local NLP-based sentiment analysis using VADER
//!
//! Scores news headlines and bodies with the VADER algorithm, boosted by a
//! small financial lexicon for jargon the general dictionary misses. This is
//! the classifier's polarity source on the heuristic path.

use vader_sentiment::SentimentIntensityAnalyzer;

/// Financial keywords and their sentiment scores for boosting VADER analysis.
const BULLISH_KEYWORDS: &[(&str, f64)] = &[
    ("surge", 0.4),
    ("surges", 0.4),
    ("rally", 0.4),
    ("rallies", 0.4),
    ("soar", 0.5),
    ("soars", 0.5),
    ("record high", 0.4),
    ("all-time high", 0.5),
    ("beats estimates", 0.5),
    ("beat expectations", 0.5),
    ("raises guidance", 0.5),
    ("breakthrough", 0.4),
    ("breakout", 0.3),
    ("partnership", 0.2),
    ("upgrade", 0.3),
    ("adoption", 0.2),
    ("expansion", 0.2),
    ("buyback", 0.3),
    ("opportunity", 0.2),
];

const BEARISH_KEYWORDS: &[(&str, f64)] = &[
    ("crash", -0.5),
    ("crashes", -0.5),
    ("plunge", -0.5),
    ("plunges", -0.5),
    ("collapse", -0.5),
    ("misses estimates", -0.5),
    ("cuts guidance", -0.5),
    ("production halt", -0.6),
    ("halts production", -0.6),
    ("shutdown", -0.5),
    ("shortage", -0.4),
    ("disruption", -0.4),
    ("recall", -0.4),
    ("lawsuit", -0.4),
    ("investigation", -0.3),
    ("downgrade", -0.4),
    ("layoffs", -0.4),
    ("strike", -0.4),
    ("sell-off", -0.4),
    ("selloff", -0.4),
    ("bankruptcy", -0.6),
];

/// VADER with financial keyword boosting, tuned for equity news headlines.
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn financial_boost(&self, text: &str) -> f64 {
        let text_lower = text.to_lowercase();
        let mut boost = 0.0;

        for (keyword, score) in BULLISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score;
            }
        }

        for (keyword, score) in BEARISH_KEYWORDS {
            if text_lower.contains(keyword) {
                boost += score; // score is already negative
            }
        }

        boost
    }

    /// Sentiment score in [-1.0, 1.0]; VADER compound plus half the keyword
    /// boost, clamped.
    pub fn analyze(&self, text: &str) -> f64 {
        if text.trim().is_empty() {
            return 0.0;
        }

        let scores = self.analyzer.polarity_scores(text);
        let vader_score = scores["compound"];
        let financial_boost = self.financial_boost(text);

        let combined = vader_score + (financial_boost * 0.5);
        combined.clamp(-1.0, 1.0)
    }

    /// Title and body combined, title weighted 70/30.
    pub fn analyze_news(&self, title: &str, content: &str) -> f64 {
        let title_score = self.analyze(title);
        let content_score = self.analyze(content);

        (title_score * 0.7) + (content_score * 0.3)
    }
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearish_headlines() {
        let analyzer = SentimentAnalyzer::new();

        let headlines = [
            "TSMC halts production after devastating earthquake",
            "Chip shortage triggers massive sell-off in semiconductors",
            "Regulator opens investigation into accounting fraud",
        ];

        for headline in headlines {
            let score = analyzer.analyze(headline);
            assert!(
                score < 0.0,
                "Expected bearish score for '{}', got {}",
                headline,
                score
            );
        }
    }

    #[test]
    fn test_bullish_headlines() {
        let analyzer = SentimentAnalyzer::new();

        let headlines = [
            "NVIDIA soars to record high after blowout earnings beat expectations",
            "Apple announces breakthrough chip, shares surge",
        ];

        for headline in headlines {
            let score = analyzer.analyze(headline);
            assert!(
                score > 0.0,
                "Expected bullish score for '{}', got {}",
                headline,
                score
            );
        }
    }

    #[test]
    fn test_empty_text() {
        let analyzer = SentimentAnalyzer::new();
        assert_eq!(analyzer.analyze(""), 0.0);
        assert_eq!(analyzer.analyze("   "), 0.0);
    }

    #[test]
    fn test_title_weighted_over_content() {
        let analyzer = SentimentAnalyzer::new();
        let score = analyzer.analyze_news(
            "Shares surge to record high",
            "The company traded between various levels today.",
        );
        assert!(score > 0.0, "Combined score should be positive: {}", score);
    }
}
