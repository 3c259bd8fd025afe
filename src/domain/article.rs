use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;

/// A news item after ingestion. Immutable once stored; alerts reference it by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Derived from the canonical URL, stable across re-fetches.
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub content: String,
    pub companies_mentioned: Vec<String>,
}

impl Article {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        source: impl Into<String>,
        published_at: DateTime<Utc>,
        content: impl Into<String>,
        companies_mentioned: Vec<String>,
    ) -> Self {
        let url = url.into();
        Self {
            id: article_id(&url),
            title: title.into(),
            url,
            source: source.into(),
            published_at,
            content: content.into(),
            companies_mentioned: companies_mentioned
                .into_iter()
                .map(|t| t.trim().to_uppercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Primary ticker for classification: the first mentioned company.
    pub fn primary_ticker(&self) -> String {
        self.companies_mentioned
            .first()
            .cloned()
            .unwrap_or_else(|| "UNKNOWN".to_string())
    }
}

/// Stable article id: SHA-256 over the canonical URL (scheme + lowercased
/// host + path, query and fragment stripped), first 16 bytes as hex.
pub fn article_id(raw_url: &str) -> String {
    let canonical = match Url::parse(raw_url.trim()) {
        Ok(u) => format!(
            "{}://{}{}",
            u.scheme(),
            u.host_str().unwrap_or("").to_lowercase(),
            u.path()
        ),
        Err(_) => raw_url.trim().to_lowercase(),
    };

    let digest = Sha256::digest(canonical.as_bytes());
    hex::encode(&digest[..16])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_ignores_query_and_fragment() {
        let a = article_id("https://example.com/news/tsmc-halt?utm_source=x");
        let b = article_id("https://example.com/news/tsmc-halt#top");
        let c = article_id("https://EXAMPLE.com/news/tsmc-halt");
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_id_differs_per_path() {
        assert_ne!(
            article_id("https://example.com/news/1"),
            article_id("https://example.com/news/2")
        );
    }

    #[test]
    fn test_companies_uppercased() {
        let art = Article::new(
            "t",
            "https://example.com/a",
            "Reuters",
            Utc::now(),
            "body",
            vec!["tsm".to_string(), " aapl ".to_string(), "".to_string()],
        );
        assert_eq!(art.companies_mentioned, vec!["TSM", "AAPL"]);
        assert_eq!(art.primary_ticker(), "TSM");
    }
}
