use crate::domain::factors::MarketFactor;
use crate::domain::precedent::HistoricalPrecedent;
use crate::domain::repositories::PrecedentRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

pub struct SqlitePrecedentRepository {
    pool: SqlitePool,
}

impl SqlitePrecedentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PrecedentRepository for SqlitePrecedentRepository {
    async fn for_factor(&self, factor: MarketFactor) -> Result<Vec<HistoricalPrecedent>> {
        let rows = sqlx::query(
            "SELECT * FROM historical_precedents WHERE event_type LIKE '%' || ? || '%'",
        )
        .bind(factor.display_name())
        .fetch_all(&self.pool)
        .await?;

        let mut precedents = Vec::new();
        for row in rows {
            let date_str: String = row.try_get("date_occurred")?;
            precedents.push(HistoricalPrecedent {
                event_type: row.try_get("event_type")?,
                event_name: row.try_get("event_name")?,
                date_occurred: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
                    .unwrap_or_default(),
                impact_magnitude: row.try_get("impact_magnitude")?,
                description: row.try_get("description")?,
            });
        }
        Ok(precedents)
    }

    async fn insert_all(&self, precedents: &[HistoricalPrecedent]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for p in precedents {
            sqlx::query(
                r#"
                INSERT INTO historical_precedents
                    (event_type, event_name, date_occurred, impact_magnitude, description)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(&p.event_type)
            .bind(&p.event_name)
            .bind(p.date_occurred.format("%Y-%m-%d").to_string())
            .bind(p.impact_magnitude)
            .bind(&p.description)
            .execute(&mut *tx)
            .await
            .context("Failed to insert precedent")?;
        }

        tx.commit().await?;
        Ok(())
    }
}
