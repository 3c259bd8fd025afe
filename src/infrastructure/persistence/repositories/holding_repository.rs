use crate::domain::portfolio::{Holding, PortfolioSnapshot};
use crate::domain::repositories::HoldingRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

pub struct SqliteHoldingRepository {
    pool: SqlitePool,
}

impl SqliteHoldingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HoldingRepository for SqliteHoldingRepository {
    async fn snapshot(&self, user_id: &str) -> Result<PortfolioSnapshot> {
        let rows = sqlx::query("SELECT * FROM holdings WHERE user_id = ? ORDER BY ticker")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let mut holdings = Vec::new();
        for row in rows {
            holdings.push(Holding {
                user_id: row.try_get("user_id")?,
                ticker: row.try_get("ticker")?,
                company_name: row.try_get("company_name")?,
                quantity: Decimal::from_str(row.try_get("quantity")?).unwrap_or_default(),
                avg_price: Decimal::from_str(row.try_get("avg_price")?).unwrap_or_default(),
                current_price: Decimal::from_str(row.try_get("current_price")?)
                    .unwrap_or_default(),
            });
        }

        Ok(PortfolioSnapshot {
            user_id: user_id.to_string(),
            holdings,
        })
    }

    async fn replace_all(&self, user_id: &str, holdings: &[Holding]) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM holdings WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for h in holdings {
            sqlx::query(
                r#"
                INSERT INTO holdings (user_id, ticker, company_name, quantity, avg_price, current_price)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(user_id)
            .bind(h.ticker.to_uppercase())
            .bind(&h.company_name)
            .bind(h.quantity.to_string())
            .bind(h.avg_price.to_string())
            .bind(h.current_price.to_string())
            .execute(&mut *tx)
            .await
            .context("Failed to insert holding")?;
        }

        tx.commit().await?;
        Ok(())
    }
}
