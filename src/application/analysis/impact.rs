//! Impact propagation: converts (sentiment, relationship, factor) into a
//! signed percentage and aggregates per portfolio.
//!
//! `impact = sentiment * tier(type) * crit(criticality) * precedent(factor)`,
//! reported as a percentage after a x10 scale.

use crate::domain::classification::Classification;
use crate::domain::factors::MarketFactor;
use crate::domain::portfolio::PortfolioSnapshot;
use crate::domain::relationship::{Criticality, RelationType};
use crate::domain::repositories::{PrecedentRepository, RelationshipRepository};
use anyhow::Result;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const PCT_SCALE: f64 = 10.0;

/// Tier multipliers; `direct` applies when the portfolio ticker itself is
/// the article subject.
#[derive(Debug, Clone)]
pub struct TierMultipliers {
    pub direct: f64,
    pub supplier: f64,
    pub customer: f64,
    pub partner: f64,
}

impl Default for TierMultipliers {
    fn default() -> Self {
        // Partner edges propagate at full strength, same as a direct mention.
        Self {
            direct: 1.00,
            supplier: 0.65,
            customer: 0.45,
            partner: 1.00,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CriticalityMultipliers {
    pub critical: f64,
    pub high: f64,
    pub medium: f64,
    pub low: f64,
}

impl Default for CriticalityMultipliers {
    fn default() -> Self {
        Self {
            critical: 1.20,
            high: 1.00,
            medium: 0.80,
            low: 0.50,
        }
    }
}

/// One propagated impact, direct (level 1) or via one relationship hop
/// (level 2). These records become the alert's reasoning trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactRecord {
    pub ticker: String,
    pub impact_pct: f64,
    pub confidence: f64,
    pub reason: String,
    pub level: i64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PortfolioImpact {
    pub impact_pct: f64,
    pub impact_usd: f64,
}

pub struct ImpactCalculator {
    precedents: Arc<dyn PrecedentRepository>,
    relationships: Arc<dyn RelationshipRepository>,
    tiers: TierMultipliers,
    criticalities: CriticalityMultipliers,
}

impl ImpactCalculator {
    pub fn new(
        precedents: Arc<dyn PrecedentRepository>,
        relationships: Arc<dyn RelationshipRepository>,
        tiers: TierMultipliers,
        criticalities: CriticalityMultipliers,
    ) -> Self {
        Self {
            precedents,
            relationships,
            tiers,
            criticalities,
        }
    }

    fn tier_multiplier(&self, rel_type: Option<RelationType>) -> f64 {
        match rel_type {
            None => self.tiers.direct,
            Some(RelationType::Supplier) => self.tiers.supplier,
            Some(RelationType::Customer) => self.tiers.customer,
            Some(RelationType::Partner) => self.tiers.partner,
        }
    }

    fn criticality_multiplier(&self, criticality: Criticality) -> f64 {
        match criticality {
            Criticality::Critical => self.criticalities.critical,
            Criticality::High => self.criticalities.high,
            Criticality::Medium => self.criticalities.medium,
            Criticality::Low => self.criticalities.low,
        }
    }

    /// Mean historical magnitude for the factor, normalized against 2.0;
    /// 1.0 when no precedent matches.
    async fn precedent_adjustment(&self, factor: MarketFactor) -> Result<f64> {
        let precedents = self.precedents.for_factor(factor).await?;
        if precedents.is_empty() {
            return Ok(1.0);
        }

        let mean = precedents
            .iter()
            .map(|p| p.impact_magnitude)
            .sum::<f64>()
            / precedents.len() as f64;

        debug!(
            "{} precedent(s) for {}: adjustment {:.2}",
            precedents.len(),
            factor.display_name(),
            mean / 2.0
        );
        Ok(mean / 2.0)
    }

    fn propagation(
        &self,
        sentiment_score: f64,
        rel_type: Option<RelationType>,
        criticality: Criticality,
        precedent: f64,
    ) -> f64 {
        sentiment_score
            * self.tier_multiplier(rel_type)
            * self.criticality_multiplier(criticality)
            * precedent
    }

    /// All impacts one classified article exerts on the portfolio: a level-1
    /// record per mentioned portfolio ticker, and a level-2 record per stored
    /// relationship leading from a mentioned outsider into the portfolio.
    pub async fn article_impacts(
        &self,
        classification: &Classification,
        companies_mentioned: &[String],
        portfolio: &PortfolioSnapshot,
    ) -> Result<Vec<ImpactRecord>> {
        let score = classification.sentiment_score;
        let factor = classification.factor;
        let precedent = self.precedent_adjustment(factor).await?;

        let mut impacts = Vec::new();

        for ticker in companies_mentioned {
            if portfolio.contains(ticker) {
                let raw = self.propagation(score, None, Criticality::High, precedent);
                impacts.push(ImpactRecord {
                    ticker: ticker.clone(),
                    impact_pct: raw * PCT_SCALE,
                    confidence: classification.confidence,
                    reason: format!("Direct {} impact", factor.display_name()),
                    level: 1,
                });
                continue;
            }

            for rel in self.relationships.for_source(ticker).await? {
                if !portfolio.contains(&rel.target_ticker) {
                    continue;
                }
                let raw =
                    self.propagation(score, Some(rel.rel_type), rel.criticality, precedent);
                impacts.push(ImpactRecord {
                    ticker: rel.target_ticker.clone(),
                    impact_pct: raw * PCT_SCALE,
                    confidence: rel.confidence,
                    reason: format!("Indirect {} impact via {}", rel.rel_type, ticker),
                    level: 2,
                });
            }
        }

        Ok(impacts)
    }

    /// Portfolio aggregation: mean of individual percentages, converted to
    /// dollars against the snapshot value.
    pub fn aggregate(
        &self,
        impacts: &[ImpactRecord],
        portfolio: &PortfolioSnapshot,
    ) -> PortfolioImpact {
        if impacts.is_empty() {
            return PortfolioImpact::default();
        }

        let total: f64 = impacts.iter().map(|i| i.impact_pct).sum();
        let mean_pct = total / impacts.len() as f64;
        let value = portfolio.total_value().to_f64().unwrap_or(0.0);

        PortfolioImpact {
            impact_pct: mean_pct,
            impact_usd: (mean_pct / 100.0) * value,
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::classification::Sentiment;
    use crate::domain::portfolio::Holding;
    use crate::domain::precedent::HistoricalPrecedent;
    use crate::domain::relationship::{DiscoverySource, FusedRelationship, Relationship};
    use async_trait::async_trait;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    struct StubPrecedents {
        magnitudes: Vec<f64>,
    }

    #[async_trait]
    impl PrecedentRepository for StubPrecedents {
        async fn for_factor(&self, _factor: MarketFactor) -> Result<Vec<HistoricalPrecedent>> {
            Ok(self
                .magnitudes
                .iter()
                .map(|m| HistoricalPrecedent {
                    event_type: "test".into(),
                    event_name: "test".into(),
                    date_occurred: NaiveDate::default(),
                    impact_magnitude: *m,
                    description: String::new(),
                })
                .collect())
        }

        async fn insert_all(&self, _precedents: &[HistoricalPrecedent]) -> Result<()> {
            Ok(())
        }
    }

    struct StubRelationships {
        rels: Vec<Relationship>,
    }

    #[async_trait]
    impl RelationshipRepository for StubRelationships {
        async fn upsert_all(
            &self,
            _source_ticker: &str,
            _fused: &[FusedRelationship],
        ) -> Result<()> {
            Ok(())
        }

        async fn for_source(&self, source_ticker: &str) -> Result<Vec<Relationship>> {
            Ok(self
                .rels
                .iter()
                .filter(|r| r.source_ticker == source_ticker)
                .cloned()
                .collect())
        }

        async fn all(&self, _limit: i64) -> Result<Vec<Relationship>> {
            Ok(self.rels.clone())
        }
    }

    fn portfolio(tickers: &[&str]) -> PortfolioSnapshot {
        PortfolioSnapshot {
            user_id: "u1".into(),
            holdings: tickers
                .iter()
                .map(|t| Holding {
                    user_id: "u1".into(),
                    ticker: t.to_string(),
                    company_name: t.to_string(),
                    quantity: dec!(100),
                    avg_price: dec!(100),
                    current_price: dec!(100),
                })
                .collect(),
        }
    }

    fn classification(ticker: &str, factor: MarketFactor, score: f64) -> Classification {
        Classification {
            article_id: "art".into(),
            ticker: ticker.into(),
            factor,
            sentiment: Sentiment::from_score(score),
            sentiment_score: score,
            reasoning: String::new(),
            confidence: 0.9,
            affected_sectors: vec![],
        }
    }

    fn calculator(
        magnitudes: Vec<f64>,
        rels: Vec<Relationship>,
    ) -> ImpactCalculator {
        ImpactCalculator::new(
            Arc::new(StubPrecedents { magnitudes }),
            Arc::new(StubRelationships { rels }),
            TierMultipliers::default(),
            CriticalityMultipliers::default(),
        )
    }

    #[tokio::test]
    async fn test_direct_impact_single_name() {
        // sentiment +0.6, direct tier 1.0, crit(high) 1.0, no precedent -> +6.0%
        let calc = calculator(vec![], vec![]);
        let c = classification("NVDA", MarketFactor::IndustryTrends, 0.6);

        let impacts = calc
            .article_impacts(&c, &["NVDA".to_string()], &portfolio(&["NVDA"]))
            .await
            .unwrap();

        assert_eq!(impacts.len(), 1);
        assert!((impacts[0].impact_pct - 6.0).abs() < 1e-9);
        assert_eq!(impacts[0].level, 1);
        assert_eq!(impacts[0].confidence, 0.9);
    }

    #[tokio::test]
    async fn test_indirect_via_cached_supplier() {
        // -0.8 * 0.65 (supplier) * 1.2 (critical) * 0.9 (precedent 1.8/2) = -0.5616
        let rel = Relationship {
            source_ticker: "TSM".into(),
            target_ticker: "AAPL".into(),
            rel_type: RelationType::Supplier,
            criticality: Criticality::Critical,
            confidence: 0.95,
            sources: vec![DiscoverySource::SecEdgar],
            last_verified: Utc::now(),
        };
        let calc = calculator(vec![1.8], vec![rel]);
        let c = classification("TSM", MarketFactor::SupplyChain, -0.8);

        let impacts = calc
            .article_impacts(&c, &["TSM".to_string()], &portfolio(&["AAPL"]))
            .await
            .unwrap();

        assert_eq!(impacts.len(), 1);
        assert_eq!(impacts[0].ticker, "AAPL");
        assert_eq!(impacts[0].level, 2);
        assert!((impacts[0].impact_pct - (-5.616)).abs() < 1e-6);
        assert_eq!(impacts[0].confidence, 0.95);
        assert!(impacts[0].reason.contains("TSM"));
    }

    #[tokio::test]
    async fn test_each_relationship_yields_its_own_record() {
        let tsm_edge = Relationship {
            source_ticker: "TSM".into(),
            target_ticker: "AAPL".into(),
            rel_type: RelationType::Supplier,
            criticality: Criticality::Critical,
            confidence: 0.95,
            sources: vec![DiscoverySource::SecEdgar],
            last_verified: Utc::now(),
        };
        let arm_edge = Relationship {
            source_ticker: "ARM".into(),
            target_ticker: "AAPL".into(),
            rel_type: RelationType::Partner,
            criticality: Criticality::High,
            confidence: 0.9,
            sources: vec![DiscoverySource::Manual],
            last_verified: Utc::now(),
        };
        let calc = calculator(vec![], vec![tsm_edge, arm_edge]);
        let c = classification("TSM", MarketFactor::SupplyChain, -0.8);

        let impacts = calc
            .article_impacts(
                &c,
                &["TSM".to_string(), "ARM".to_string()],
                &portfolio(&["AAPL"]),
            )
            .await
            .unwrap();

        // Two distinct edges into AAPL: two records, nothing collapsed.
        assert_eq!(impacts.len(), 2);
        assert!(impacts.iter().all(|i| i.ticker == "AAPL" && i.level == 2));

        // Supplier edge: -0.8 * 0.65 * 1.2 = -0.624; partner edge runs at the
        // direct tier: -0.8 * 1.0 * 1.0 = -0.8.
        let mut pcts: Vec<f64> = impacts.iter().map(|i| i.impact_pct).collect();
        pcts.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((pcts[0] - (-8.0)).abs() < 1e-9);
        assert!((pcts[1] - (-6.24)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_sign_follows_sentiment() {
        let calc = calculator(vec![], vec![]);
        for score in [-0.9, -0.1, 0.3, 1.0] {
            let c = classification("NVDA", MarketFactor::MarketSentiment, score);
            let impacts = calc
                .article_impacts(&c, &["NVDA".to_string()], &portfolio(&["NVDA"]))
                .await
                .unwrap();
            assert_eq!(impacts[0].impact_pct.signum(), score.signum());
        }
    }

    #[tokio::test]
    async fn test_aggregate_mean_and_usd() {
        let calc = calculator(vec![], vec![]);
        let impacts = vec![
            ImpactRecord {
                ticker: "A".into(),
                impact_pct: 6.0,
                confidence: 0.9,
                reason: String::new(),
                level: 1,
            },
            ImpactRecord {
                ticker: "B".into(),
                impact_pct: -2.0,
                confidence: 0.9,
                reason: String::new(),
                level: 2,
            },
        ];

        // Portfolio value: 2 holdings x 100 x 100 = 20_000
        let total = calc.aggregate(&impacts, &portfolio(&["A", "B"]));
        assert!((total.impact_pct - 2.0).abs() < 1e-9);
        assert!((total.impact_usd - 400.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_aggregate_empty() {
        let calc = calculator(vec![], vec![]);
        let total = calc.aggregate(&[], &portfolio(&["A"]));
        assert_eq!(total.impact_pct, 0.0);
        assert_eq!(total.impact_usd, 0.0);
    }
}
