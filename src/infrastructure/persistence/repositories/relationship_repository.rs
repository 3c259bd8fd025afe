use crate::domain::relationship::{
    Criticality, FusedRelationship, RelationType, Relationship, join_sources, parse_sources,
};
use crate::domain::repositories::RelationshipRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::info;

pub struct SqliteRelationshipRepository {
    pool: SqlitePool,
}

impl SqliteRelationshipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Relationship>> {
        let mut rels = Vec::new();
        for row in rows {
            let type_str: String = row.try_get("relationship_type")?;
            let crit_str: String = row.try_get("criticality")?;
            let sources_str: String = row.try_get("source_discovery")?;
            let verified_ts: i64 = row.try_get("last_verified")?;

            rels.push(Relationship {
                source_ticker: row.try_get("source_ticker")?,
                target_ticker: row.try_get("target_ticker")?,
                rel_type: RelationType::from_str(&type_str)?,
                criticality: Criticality::from_str(&crit_str)?,
                confidence: row.try_get("confidence")?,
                sources: parse_sources(&sources_str),
                last_verified: DateTime::<Utc>::from_timestamp(verified_ts, 0)
                    .unwrap_or_else(Utc::now),
            });
        }
        Ok(rels)
    }
}

#[async_trait]
impl RelationshipRepository for SqliteRelationshipRepository {
    async fn upsert_all(&self, source_ticker: &str, fused: &[FusedRelationship]) -> Result<()> {
        if fused.is_empty() {
            return Ok(());
        }

        let source_ticker = source_ticker.to_uppercase();
        let mut tx = self.pool.begin().await?;

        for rel in fused {
            let target = rel.related_company.to_uppercase();

            // Merge against the existing row: confidence and criticality never
            // decrease, source labels are unioned.
            let existing = sqlx::query(
                r#"
                SELECT criticality, confidence, source_discovery FROM relationships
                WHERE source_ticker = ? AND target_ticker = ? AND relationship_type = ?
                "#,
            )
            .bind(&source_ticker)
            .bind(&target)
            .bind(rel.rel_type.as_str())
            .fetch_optional(&mut *tx)
            .await?;

            let mut confidence = rel.confidence.clamp(0.0, 0.99);
            let mut criticality = rel.criticality;
            let mut sources = rel.sources.clone();

            if let Some(row) = existing {
                let prev_conf: f64 = row.try_get("confidence")?;
                let prev_crit = Criticality::from_str(row.try_get("criticality")?)?;
                let prev_sources = parse_sources(row.try_get("source_discovery")?);

                confidence = confidence.max(prev_conf);
                criticality = criticality.max(prev_crit);
                for s in prev_sources {
                    if !sources.contains(&s) {
                        sources.push(s);
                    }
                }
            }

            sqlx::query(
                r#"
                INSERT INTO relationships
                    (source_ticker, target_ticker, relationship_type, criticality,
                     confidence, source_discovery, last_verified)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(source_ticker, target_ticker, relationship_type) DO UPDATE SET
                    criticality = excluded.criticality,
                    confidence = excluded.confidence,
                    source_discovery = excluded.source_discovery,
                    last_verified = excluded.last_verified
                "#,
            )
            .bind(&source_ticker)
            .bind(&target)
            .bind(rel.rel_type.as_str())
            .bind(criticality.as_str())
            .bind(confidence)
            .bind(join_sources(&sources))
            .bind(Utc::now().timestamp())
            .execute(&mut *tx)
            .await
            .context("Failed to upsert relationship")?;
        }

        tx.commit().await?;
        info!(
            "Persisted {} relationships for {}",
            fused.len(),
            source_ticker
        );
        Ok(())
    }

    async fn for_source(&self, source_ticker: &str) -> Result<Vec<Relationship>> {
        let rows = sqlx::query(
            "SELECT * FROM relationships WHERE source_ticker = ? \
             ORDER BY target_ticker, relationship_type",
        )
        .bind(source_ticker.to_uppercase())
        .fetch_all(&self.pool)
        .await?;
        self.map_rows(rows)
    }

    async fn all(&self, limit: i64) -> Result<Vec<Relationship>> {
        let rows = sqlx::query("SELECT * FROM relationships LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        self.map_rows(rows)
    }
}
