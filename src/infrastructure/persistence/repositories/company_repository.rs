use crate::domain::repositories::CompanyRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

pub struct SqliteCompanyRepository {
    pool: SqlitePool,
}

impl SqliteCompanyRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for SqliteCompanyRepository {
    async fn ensure_exists(&self, ticker: &str, name: &str, sector: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO companies (ticker, name, sector, is_portfolio, last_updated)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(ticker.to_uppercase())
        .bind(name)
        .bind(sector)
        .bind(Utc::now().timestamp())
        .execute(&self.pool)
        .await
        .context("Failed to ensure company exists")?;

        Ok(())
    }

    async fn set_portfolio(&self, ticker: &str, is_portfolio: bool) -> Result<()> {
        sqlx::query("UPDATE companies SET is_portfolio = ?, last_updated = ? WHERE ticker = ?")
            .bind(is_portfolio)
            .bind(Utc::now().timestamp())
            .bind(ticker.to_uppercase())
            .execute(&self.pool)
            .await
            .context("Failed to update portfolio flag")?;

        Ok(())
    }

    async fn portfolio_tickers(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT ticker FROM companies WHERE is_portfolio = 1")
            .fetch_all(&self.pool)
            .await?;

        let mut tickers = Vec::new();
        for row in rows {
            tickers.push(row.try_get("ticker")?);
        }
        Ok(tickers)
    }
}
