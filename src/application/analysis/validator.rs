//! Workflow-level confidence gate.
//!
//! Pools confidences from impacts, classifications, and discovered
//! relationships; below the threshold it sends the whole workflow back to
//! the monitor with named gaps and refined queries, bounded by the loop cap.

use crate::application::analysis::impact::ImpactRecord;
use crate::domain::classification::Classification;
use crate::domain::relationship::FusedRelationship;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const GAP_VERY_LOW_CONFIDENCE: &str = "very low confidence";
pub const GAP_NO_RELATIONSHIPS: &str = "no supply chain relationships discovered";
pub const GAP_INSUFFICIENT_NEWS: &str = "insufficient news coverage";
pub const GAP_NO_IMPACTS: &str = "no portfolio impacts calculated";

const MIN_ARTICLE_COUNT: usize = 3;
const VERY_LOW_SCORE: f64 = 0.50;
const REFINED_QUERY_TICKERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationDecision {
    Accept,
    RequestMoreData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub confidence_score: f64,
    pub decision: ValidationDecision,
    pub gaps: Vec<String>,
    pub refined_queries: Vec<String>,
    pub loop_count: u32,
}

pub struct ConfidenceValidator {
    threshold: f64,
    max_loops: u32,
}

impl ConfidenceValidator {
    pub fn new(threshold: f64, max_loops: u32) -> Self {
        Self {
            threshold,
            max_loops,
        }
    }

    pub fn validate(
        &self,
        impacts: &[ImpactRecord],
        classifications: &[Classification],
        discovered: &[FusedRelationship],
        article_count: usize,
        portfolio_tickers: &[String],
        loop_count: u32,
    ) -> ValidationOutcome {
        let mut pool: Vec<f64> = Vec::new();
        pool.extend(impacts.iter().map(|i| i.confidence));
        pool.extend(classifications.iter().map(|c| c.confidence));
        pool.extend(discovered.iter().map(|r| r.confidence));

        let confidence_score = if pool.is_empty() {
            0.5
        } else {
            pool.iter().sum::<f64>() / pool.len() as f64
        };

        // The loop cap forces acceptance: a best-effort alert still goes out.
        if confidence_score >= self.threshold || loop_count >= self.max_loops {
            info!(
                "Validator ACCEPT (score {:.2}, loop {})",
                confidence_score, loop_count
            );
            return ValidationOutcome {
                confidence_score,
                decision: ValidationDecision::Accept,
                gaps: Vec::new(),
                refined_queries: Vec::new(),
                loop_count,
            };
        }

        let mut gaps = Vec::new();
        if confidence_score < VERY_LOW_SCORE {
            gaps.push(GAP_VERY_LOW_CONFIDENCE.to_string());
        }
        if discovered.is_empty() {
            gaps.push(GAP_NO_RELATIONSHIPS.to_string());
        }
        if article_count < MIN_ARTICLE_COUNT {
            gaps.push(GAP_INSUFFICIENT_NEWS.to_string());
        }
        if impacts.is_empty() {
            gaps.push(GAP_NO_IMPACTS.to_string());
        }

        let mut refined_queries = Vec::new();
        for ticker in portfolio_tickers.iter().take(REFINED_QUERY_TICKERS) {
            refined_queries.push(format!("{} supply chain disruption latest news", ticker));
            refined_queries.push(format!("{} major suppliers and customers", ticker));
        }

        info!(
            "Validator REQUEST_MORE_DATA (score {:.2} < {:.2}, loop {} -> {}): gaps {:?}",
            confidence_score,
            self.threshold,
            loop_count,
            loop_count + 1,
            gaps
        );

        ValidationOutcome {
            confidence_score,
            decision: ValidationDecision::RequestMoreData,
            gaps,
            refined_queries,
            loop_count: loop_count + 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::Sentiment;
    use crate::domain::factors::MarketFactor;

    fn classification(confidence: f64) -> Classification {
        Classification {
            article_id: "a".into(),
            ticker: "RIVN".into(),
            factor: MarketFactor::MarketSentiment,
            sentiment: Sentiment::Neutral,
            sentiment_score: 0.0,
            reasoning: String::new(),
            confidence,
            affected_sectors: vec![],
        }
    }

    fn validator() -> ConfidenceValidator {
        ConfidenceValidator::new(0.70, 2)
    }

    #[test]
    fn test_low_confidence_requests_more_data_with_gaps() {
        let outcome = validator().validate(
            &[],
            &[classification(0.4)],
            &[],
            1,
            &["RIVN".to_string()],
            0,
        );

        assert_eq!(outcome.decision, ValidationDecision::RequestMoreData);
        assert_eq!(outcome.loop_count, 1);
        assert!(outcome.gaps.contains(&GAP_VERY_LOW_CONFIDENCE.to_string()));
        assert!(outcome.gaps.contains(&GAP_NO_RELATIONSHIPS.to_string()));
        assert!(outcome.gaps.contains(&GAP_INSUFFICIENT_NEWS.to_string()));
        assert!(outcome.gaps.contains(&GAP_NO_IMPACTS.to_string()));
        assert!(outcome.refined_queries.iter().all(|q| q.contains("RIVN")));
        assert_eq!(outcome.refined_queries.len(), 2);
    }

    #[test]
    fn test_accept_at_loop_bound_regardless_of_score() {
        let outcome = validator().validate(
            &[],
            &[classification(0.1)],
            &[],
            0,
            &["RIVN".to_string()],
            2,
        );

        assert_eq!(outcome.decision, ValidationDecision::Accept);
        assert_eq!(outcome.loop_count, 2);
        assert!(outcome.gaps.is_empty());
    }

    #[test]
    fn test_accept_above_threshold() {
        let outcome = validator().validate(
            &[],
            &[classification(0.9), classification(0.8)],
            &[],
            5,
            &["AAPL".to_string()],
            0,
        );

        assert_eq!(outcome.decision, ValidationDecision::Accept);
        assert_eq!(outcome.loop_count, 0);
    }

    #[test]
    fn test_empty_pool_defaults_to_half() {
        let outcome = validator().validate(&[], &[], &[], 0, &[], 0);
        assert_eq!(outcome.confidence_score, 0.5);
        assert_eq!(outcome.decision, ValidationDecision::RequestMoreData);
    }

    #[test]
    fn test_refined_queries_cap_at_two_tickers() {
        let tickers: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let outcome = validator().validate(&[], &[classification(0.2)], &[], 0, &tickers, 0);
        assert_eq!(outcome.refined_queries.len(), 4);
        assert!(outcome.refined_queries.iter().any(|q| q.starts_with("A ")));
        assert!(outcome.refined_queries.iter().any(|q| q.starts_with("B ")));
        assert!(!outcome.refined_queries.iter().any(|q| q.starts_with("C ")));
    }
}
