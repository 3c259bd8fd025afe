use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }

    /// Band a portfolio-level impact percentage by its magnitude.
    pub fn from_impact_pct(impact_pct: f64, high_threshold: f64, medium_threshold: f64) -> Self {
        let magnitude = impact_pct.abs();
        if magnitude >= high_threshold {
            Severity::High
        } else if magnitude >= medium_threshold {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => bail!("Unknown severity: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertStatus {
    Active,
    Dismissed,
}

impl AlertStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertStatus::Active => "active",
            AlertStatus::Dismissed => "dismissed",
        }
    }
}

impl FromStr for AlertStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(AlertStatus::Active),
            "dismissed" => Ok(AlertStatus::Dismissed),
            other => bail!("Unknown alert status: {}", other),
        }
    }
}

/// A persisted portfolio alert. Every alert carries at least one
/// [`ReasoningStep`] and references a persisted article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub headline: String,
    pub severity: Severity,
    pub impact_pct: f64,
    pub trigger_article_id: String,
    pub source_urls: Vec<String>,
    pub full_reasoning: String,
    pub created_at: DateTime<Utc>,
    pub status: AlertStatus,
}

/// One link of the persisted causal trail: level 1 = direct impact,
/// level 2 = one relationship hop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningStep {
    pub ticker: String,
    pub level: i64,
    pub reasoning: String,
    pub confidence: f64,
}
