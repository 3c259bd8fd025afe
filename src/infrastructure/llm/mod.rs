pub mod governor;
pub mod heuristic;
pub mod usage;

pub use governor::{GovernorSettings, LlmGovernor};
pub use usage::UsageTracker;
