use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

/// Shared database wrapper
#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal); // Better for concurrency

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// In-memory database for tests and demos. A single long-lived
    /// connection: each pooled connection would otherwise get its own
    /// private memory database.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .context("Failed to open in-memory SQLite database")?;

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Companies
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                ticker TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                sector TEXT,
                is_portfolio BOOLEAN DEFAULT 0,
                last_updated INTEGER
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create companies table")?;

        // 2. Articles
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                url TEXT UNIQUE,
                source TEXT,
                content TEXT,
                published_at INTEGER NOT NULL,
                companies_mentioned TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_articles_published
            ON articles (published_at DESC);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create articles table")?;

        // 3. Supply-chain relationships
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS relationships (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_ticker TEXT NOT NULL,
                target_ticker TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                criticality TEXT NOT NULL,
                confidence REAL NOT NULL,
                source_discovery TEXT NOT NULL,
                last_verified INTEGER NOT NULL,
                UNIQUE(source_ticker, target_ticker, relationship_type)
            );
            CREATE INDEX IF NOT EXISTS idx_relationships_source
            ON relationships (source_ticker);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create relationships table")?;

        // 4. Alerts
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS alerts (
                id TEXT PRIMARY KEY,
                headline TEXT NOT NULL,
                severity TEXT NOT NULL,
                impact_pct REAL NOT NULL,
                trigger_article_id TEXT NOT NULL,
                source_urls TEXT NOT NULL DEFAULT '[]',
                full_reasoning TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
            );
            CREATE INDEX IF NOT EXISTS idx_alerts_created
            ON alerts (created_at DESC);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create alerts table")?;

        // 5. Impact analysis (the reasoning trail)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS impact_analysis (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                alert_id TEXT NOT NULL,
                ticker TEXT NOT NULL,
                impact_level INTEGER NOT NULL,
                reasoning TEXT NOT NULL,
                confidence REAL NOT NULL,
                FOREIGN KEY(alert_id) REFERENCES alerts(id)
            );
            CREATE INDEX IF NOT EXISTS idx_impact_alert
            ON impact_analysis (alert_id);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create impact_analysis table")?;

        // 6. Portfolio holdings
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS holdings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id TEXT NOT NULL,
                ticker TEXT NOT NULL,
                company_name TEXT,
                quantity TEXT NOT NULL,
                avg_price TEXT NOT NULL,
                current_price TEXT NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create holdings table")?;

        // 7. Agent execution logs
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS agent_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                agent_name TEXT NOT NULL,
                task TEXT,
                result_summary TEXT,
                timestamp INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create agent_logs table")?;

        // 8. Metadata key/value cache
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cache_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create cache_metadata table")?;

        // 9. Historical precedents (seeded, read-only at runtime)
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS historical_precedents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type TEXT NOT NULL,
                event_name TEXT NOT NULL,
                date_occurred TEXT NOT NULL,
                impact_magnitude REAL NOT NULL,
                description TEXT
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create historical_precedents table")?;

        info!("Database schema initialized.");
        Ok(())
    }
}
