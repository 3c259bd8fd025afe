use crate::domain::article::Article;
use crate::domain::repositories::ArticleRepository;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

pub struct SqliteArticleRepository {
    pool: SqlitePool,
}

impl SqliteArticleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn map_rows(&self, rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Article>> {
        let mut articles = Vec::new();
        for row in rows {
            let companies: String = row.try_get("companies_mentioned")?;
            let published_ts: i64 = row.try_get("published_at")?;

            articles.push(Article {
                id: row.try_get("id")?,
                title: row.try_get("title")?,
                url: row.try_get("url")?,
                source: row.try_get("source")?,
                content: row.try_get("content")?,
                published_at: DateTime::<Utc>::from_timestamp(published_ts, 0)
                    .unwrap_or_else(Utc::now),
                companies_mentioned: companies
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect(),
            });
        }
        Ok(articles)
    }
}

#[async_trait]
impl ArticleRepository for SqliteArticleRepository {
    async fn upsert(&self, article: &Article) -> Result<()> {
        // Articles are immutable after ingestion, so a duplicate id is a no-op.
        sqlx::query(
            r#"
            INSERT INTO articles (id, title, url, source, content, published_at, companies_mentioned)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&article.id)
        .bind(&article.title)
        .bind(&article.url)
        .bind(&article.source)
        .bind(&article.content)
        .bind(article.published_at.timestamp())
        .bind(article.companies_mentioned.join(","))
        .execute(&self.pool)
        .await
        .context("Failed to upsert article")?;

        Ok(())
    }

    async fn find(&self, id: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.map_rows(vec![row])?.pop()),
            None => Ok(None),
        }
    }

    async fn recent(&self, limit: i64) -> Result<Vec<Article>> {
        let rows = sqlx::query("SELECT * FROM articles ORDER BY published_at DESC LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        self.map_rows(rows)
    }

    async fn mentioning(&self, tickers: &[String], limit: i64) -> Result<Vec<Article>> {
        if tickers.is_empty() {
            return Ok(Vec::new());
        }

        let clause = tickers
            .iter()
            .map(|_| "(title LIKE ? OR content LIKE ? OR companies_mentioned LIKE ?)")
            .collect::<Vec<_>>()
            .join(" OR ");
        let sql = format!(
            "SELECT * FROM articles WHERE {} ORDER BY published_at DESC LIMIT ?",
            clause
        );

        let mut query = sqlx::query(&sql);
        for ticker in tickers {
            let pattern = format!("%{}%", ticker);
            query = query.bind(pattern.clone()).bind(pattern.clone()).bind(pattern);
        }
        let rows = query.bind(limit).fetch_all(&self.pool).await?;

        self.map_rows(rows)
    }
}
