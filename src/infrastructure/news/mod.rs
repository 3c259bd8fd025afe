pub mod mock_news;
pub mod rss;
pub mod sentiment_analyzer;

pub use mock_news::MockNewsSource;
pub use rss::RssNewsSource;
pub use sentiment_analyzer::SentimentAnalyzer;
