//! Store contracts: upsert idempotence, the fusion invariant on re-upsert,
//! atomic alert writes, batch trail reads, and precedent lookup.

mod common;

use chrono::Utc;
use common::{StubGenerator, build_app};
use portpulse::domain::alert::{Alert, AlertStatus, ReasoningStep, Severity};
use portpulse::domain::article::Article;
use portpulse::domain::factors::MarketFactor;
use portpulse::domain::precedent::HistoricalPrecedent;
use portpulse::domain::relationship::{
    Criticality, DiscoverySource, FusedRelationship, RelationType,
};
use std::sync::Arc;

async fn app() -> common::TestApp {
    build_app(vec![], Arc::new(StubGenerator::new("{}", "[]")))
        .await
        .unwrap()
}

fn fused(confidence: f64, criticality: Criticality, source: DiscoverySource) -> FusedRelationship {
    FusedRelationship {
        related_company: "AAPL".to_string(),
        rel_type: RelationType::Supplier,
        criticality,
        confidence,
        sources: vec![source],
        evidence: vec!["evidence".to_string()],
    }
}

fn step(ticker: &str, level: i64) -> ReasoningStep {
    ReasoningStep {
        ticker: ticker.to_string(),
        level,
        reasoning: "because".to_string(),
        confidence: 0.9,
    }
}

fn alert(id: &str) -> Alert {
    Alert {
        id: id.to_string(),
        headline: "Portfolio Risk Alert".to_string(),
        severity: Severity::Medium,
        impact_pct: -1.2,
        trigger_article_id: "article-1".to_string(),
        source_urls: vec!["https://example.com/a".to_string()],
        full_reasoning: "trail".to_string(),
        created_at: Utc::now(),
        status: AlertStatus::Active,
    }
}

#[tokio::test]
async fn article_upsert_is_idempotent_on_canonical_url() {
    let app = app().await;

    // Same canonical URL dressed differently.
    let a = Article::new(
        "Title",
        "https://example.com/story?utm_source=feed",
        "Wire",
        Utc::now(),
        "body",
        vec!["TSM".into()],
    );
    let b = Article::new(
        "Title",
        "https://EXAMPLE.com/story#section",
        "Wire",
        Utc::now(),
        "body",
        vec!["TSM".into()],
    );
    assert_eq!(a.id, b.id);

    app.articles.upsert(&a).await.unwrap();
    app.articles.upsert(&b).await.unwrap();

    assert_eq!(app.articles.recent(10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn relationship_confidence_never_decreases() {
    let app = app().await;

    app.relationships
        .upsert_all(
            "TSM",
            &[fused(0.85, Criticality::Medium, DiscoverySource::SecEdgar)],
        )
        .await
        .unwrap();

    // Weaker evidence later must not erode the stored edge.
    app.relationships
        .upsert_all(
            "TSM",
            &[fused(0.45, Criticality::Critical, DiscoverySource::LlmInference)],
        )
        .await
        .unwrap();

    let rels = app.relationships.for_source("TSM").await.unwrap();
    assert_eq!(rels.len(), 1);
    assert!((rels[0].confidence - 0.85).abs() < 1e-9);
    assert_eq!(rels[0].criticality, Criticality::Critical);
    assert!(rels[0].sources.contains(&DiscoverySource::SecEdgar));
    assert!(rels[0].sources.contains(&DiscoverySource::LlmInference));
}

#[tokio::test]
async fn alert_write_is_atomic() {
    let app = app().await;

    // Break the trail table so the second half of the write fails.
    sqlx::query("DROP TABLE impact_analysis")
        .execute(&app.db.pool)
        .await
        .unwrap();

    let result = app.alerts.save(&alert("ALERT-1"), &[step("AAPL", 1)]).await;
    assert!(result.is_err());

    // The alert row rolled back with it.
    assert!(app.alerts.find("ALERT-1").await.unwrap().is_none());
}

#[tokio::test]
async fn alert_without_trail_is_refused() {
    let app = app().await;
    assert!(app.alerts.save(&alert("ALERT-2"), &[]).await.is_err());
    assert!(app.alerts.find("ALERT-2").await.unwrap().is_none());
}

#[tokio::test]
async fn reasoning_for_batches_in_one_query() {
    let app = app().await;

    app.alerts
        .save(&alert("ALERT-A"), &[step("AAPL", 1), step("NVDA", 2)])
        .await
        .unwrap();
    app.alerts
        .save(&alert("ALERT-B"), &[step("TSM", 1)])
        .await
        .unwrap();

    let trails = app
        .alerts
        .reasoning_for(&["ALERT-A".to_string(), "ALERT-B".to_string()])
        .await
        .unwrap();

    assert_eq!(trails["ALERT-A"].len(), 2);
    assert_eq!(trails["ALERT-B"].len(), 1);
    assert_eq!(trails["ALERT-B"][0].ticker, "TSM");
}

#[tokio::test]
async fn precedents_match_factor_by_substring() {
    let app = app().await;

    app.precedents
        .insert_all(&[HistoricalPrecedent {
            event_type: "Supply Chain".to_string(),
            event_name: "Taiwan Earthquake".to_string(),
            date_occurred: chrono::NaiveDate::from_ymd_opt(2024, 4, 3).unwrap(),
            impact_magnitude: 1.8,
            description: "Fab disruption".to_string(),
        }])
        .await
        .unwrap();

    let hits = app
        .precedents
        .for_factor(MarketFactor::SupplyChain)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert!((hits[0].impact_magnitude - 1.8).abs() < 1e-9);

    assert!(
        app.precedents
            .for_factor(MarketFactor::Currency)
            .await
            .unwrap()
            .is_empty()
    );
}
