//! SEC EDGAR filings client.
//!
//! Resolves tickers to CIK numbers via the SEC symbol file, locates the
//! latest 10-K through the submissions endpoint, and returns the Business and
//! Risk Factors sections sliced out by item-heading markers.

use crate::domain::ports::FilingsProvider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

// SEC requires a descriptive User-Agent on automated requests.
const USER_AGENT: &str = "portpulse (research@portpulse.dev)";
const FALLBACK_CHARS: usize = 10_000;

pub struct EdgarClient {
    client: ClientWithMiddleware,
    ticker_to_cik: RwLock<HashMap<String, String>>,
}

impl EdgarClient {
    pub fn new() -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);

        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client: ClientBuilder::new(client)
                .with(RetryTransientMiddleware::new_with_policy(retry_policy))
                .build(),
            ticker_to_cik: RwLock::new(HashMap::new()),
        }
    }

    /// The SEC publishes a JSON mapping of all tickers to CIK numbers; loaded
    /// once and cached for the process lifetime.
    async fn cik_for(&self, ticker: &str) -> Result<Option<String>> {
        let ticker = ticker.to_uppercase();

        {
            let map = self.ticker_to_cik.read().await;
            if !map.is_empty() {
                return Ok(map.get(&ticker).cloned());
            }
        }

        let body: serde_json::Value = self
            .client
            .get("https://www.sec.gov/files/company_tickers.json")
            .send()
            .await
            .context("Failed to fetch SEC ticker map")?
            .json()
            .await?;

        let mut map = self.ticker_to_cik.write().await;
        if let Some(entries) = body.as_object() {
            for entry in entries.values() {
                if let (Some(t), Some(cik)) = (entry["ticker"].as_str(), entry["cik_str"].as_i64())
                {
                    map.insert(t.to_uppercase(), format!("{:0>10}", cik));
                }
            }
        }
        info!("Loaded {} ticker-to-CIK mappings", map.len());

        Ok(map.get(&ticker).cloned())
    }

    async fn latest_10k_url(&self, cik: &str) -> Result<Option<String>> {
        let body: serde_json::Value = self
            .client
            .get(format!("https://data.sec.gov/submissions/CIK{}.json", cik))
            .send()
            .await
            .context("Failed to fetch SEC submissions")?
            .json()
            .await?;

        let recent = &body["filings"]["recent"];
        let forms = recent["form"].as_array().cloned().unwrap_or_default();

        let Some(idx) = forms.iter().position(|f| f.as_str() == Some("10-K")) else {
            return Ok(None);
        };

        let accession = recent["accessionNumber"][idx]
            .as_str()
            .unwrap_or_default()
            .replace('-', "");
        let primary_doc = recent["primaryDocument"][idx].as_str().unwrap_or_default();
        if accession.is_empty() || primary_doc.is_empty() {
            return Ok(None);
        }

        let cik_number: u64 = cik.parse().unwrap_or_default();
        Ok(Some(format!(
            "https://www.sec.gov/Archives/edgar/data/{}/{}/{}",
            cik_number, accession, primary_doc
        )))
    }

    /// Slice the Business and Risk Factors sections out of the filing text;
    /// if the heading markers are not found, fall back to the leading chunk.
    fn relevant_sections(text: &str) -> String {
        // ASCII lowering keeps byte offsets aligned with the original text.
        let lower = text.to_ascii_lowercase();
        let business = lower.find("item 1.");
        let risk = lower.find("item 1a.");
        let legal = lower.find("item 3.");

        let mut content = String::new();
        if let (Some(b), Some(r)) = (business, risk)
            && b < r
        {
            content.push_str(&text[b..r]);
        }
        if let (Some(r), Some(l)) = (risk, legal)
            && r < l
        {
            content.push_str(&text[r..l]);
        }

        if content.len() > 500 {
            content
        } else {
            text.chars().take(FALLBACK_CHARS).collect()
        }
    }

    fn strip_html(html: &str) -> String {
        let mut out = String::with_capacity(html.len() / 2);
        let mut in_tag = false;
        let mut last_was_space = false;

        for c in html.chars() {
            match c {
                '<' => in_tag = true,
                '>' => {
                    in_tag = false;
                    if !last_was_space {
                        out.push(' ');
                        last_was_space = true;
                    }
                }
                _ if in_tag => {}
                c if c.is_whitespace() => {
                    if !last_was_space {
                        out.push(' ');
                        last_was_space = true;
                    }
                }
                c => {
                    out.push(c);
                    last_was_space = false;
                }
            }
        }
        out
    }
}

impl Default for EdgarClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FilingsProvider for EdgarClient {
    async fn filing_text(&self, ticker: &str) -> Result<Option<String>> {
        let Some(cik) = self.cik_for(ticker).await? else {
            warn!("CIK not found for ticker {}", ticker);
            return Ok(None);
        };

        let Some(doc_url) = self.latest_10k_url(&cik).await? else {
            debug!("No 10-K on file for {}", ticker);
            return Ok(None);
        };

        let html = self
            .client
            .get(&doc_url)
            .send()
            .await
            .context("Failed to fetch filing document")?
            .text()
            .await?;

        let text = Self::strip_html(&html);
        Ok(Some(Self::relevant_sections(&text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html() {
        let text = EdgarClient::strip_html("<p>Item 1.</p><b>Business</b> overview");
        assert_eq!(text.trim(), "Item 1. Business overview");
    }

    #[test]
    fn test_relevant_sections_slices_markers() {
        let filler = "x".repeat(600);
        let text = format!(
            "prelude Item 1. Business {} Item 1A. Risk Factors {} Item 3. Legal",
            filler, filler
        );
        let sections = EdgarClient::relevant_sections(&text);
        assert!(sections.starts_with("Item 1. Business"));
        assert!(sections.contains("Risk Factors"));
        assert!(!sections.contains("Legal"));
    }

    #[test]
    fn test_relevant_sections_fallback() {
        let text = "short filing with no markers".to_string();
        assert_eq!(EdgarClient::relevant_sections(&text), text);
    }
}
