use crate::domain::article::Article;
use crate::domain::ports::NewsSource;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use rss::Channel;
use std::collections::HashSet;
use std::io::Cursor;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

/// Polled RSS headline feed. Items already seen (by GUID or link) are
/// skipped, so repeated fetches only surface new entries.
pub struct RssNewsSource {
    url: String,
    client: Client,
    seen_guids: Arc<Mutex<HashSet<String>>>,
}

impl RssNewsSource {
    pub fn new(url: &str, seen_guids: Arc<Mutex<HashSet<String>>>) -> Self {
        Self {
            url: url.to_string(),
            client: Client::new(),
            seen_guids,
        }
    }

    fn mentioned_tickers(text: &str, queries: &[String]) -> Vec<String> {
        let upper = text.to_uppercase();
        queries
            .iter()
            .map(|q| q.trim().to_uppercase())
            // Only plain ticker queries participate in mention matching;
            // refined search phrases carry spaces.
            .filter(|q| !q.is_empty() && q.len() <= 5 && !q.contains(' '))
            .filter(|t| upper.contains(t.as_str()))
            .collect()
    }
}

#[async_trait]
impl NewsSource for RssNewsSource {
    fn name(&self) -> &str {
        "rss"
    }

    async fn fetch(&self, queries: &[String]) -> Result<Vec<Article>> {
        debug!("Polling RSS feed: {}", self.url);

        let bytes = self
            .client
            .get(&self.url)
            .send()
            .await?
            .bytes()
            .await?;

        let channel = match Channel::read_from(Cursor::new(bytes)) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to parse RSS feed {}: {}", self.url, e);
                return Ok(Vec::new());
            }
        };

        let source_label = if channel.title().is_empty() {
            "RSS".to_string()
        } else {
            channel.title().to_string()
        };

        let mut articles = Vec::new();
        let mut guids = self.seen_guids.lock().await;

        for item in channel.items() {
            let Some(link) = item.link() else {
                continue;
            };
            let guid = item
                .guid()
                .map(|g| g.value.to_string())
                .unwrap_or_else(|| link.to_string());

            if guids.contains(&guid) {
                continue;
            }
            guids.insert(guid);

            // RSS dates are usually RFC-2822.
            let published = item
                .pub_date()
                .and_then(|d| DateTime::parse_from_rfc2822(d).ok())
                .map(|d| d.with_timezone(&Utc))
                .unwrap_or_else(Utc::now);

            let title = item.title().unwrap_or("No Title");
            let content = item.description().unwrap_or("");
            let companies =
                Self::mentioned_tickers(&format!("{} {}", title, content), queries);

            articles.push(Article::new(
                title,
                link,
                source_label.clone(),
                published,
                content,
                companies,
            ));
        }

        if !articles.is_empty() {
            info!("RSS feed {} yielded {} new items", self.url, articles.len());
        }
        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mention_matching_skips_phrases() {
        let queries = vec![
            "TSM".to_string(),
            "AAPL supply chain disruption latest news".to_string(),
        ];
        let found = RssNewsSource::mentioned_tickers("TSMC (TSM) halts fabs", &queries);
        assert_eq!(found, vec!["TSM"]);
    }
}
