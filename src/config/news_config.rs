//! News ingress configuration: RSS feed list and the mock-source switch.

use std::env;

#[derive(Debug, Clone)]
pub struct NewsEnvConfig {
    pub feed_urls: Vec<String>,
    pub use_mock: bool,
}

impl NewsEnvConfig {
    pub fn from_env() -> Self {
        let feed_urls = env::var("NEWS_FEED_URLS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        Self {
            feed_urls,
            use_mock: env::var("NEWS_USE_MOCK")
                .unwrap_or_else(|_| "false".to_string())
                .parse::<bool>()
                .unwrap_or(false),
        }
    }
}
