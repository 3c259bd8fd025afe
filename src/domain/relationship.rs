use anyhow::bail;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    Supplier,
    Customer,
    Partner,
}

impl RelationType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Supplier => "supplier",
            RelationType::Customer => "customer",
            RelationType::Partner => "partner",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "supplier" => Ok(RelationType::Supplier),
            "customer" => Ok(RelationType::Customer),
            "partner" => Ok(RelationType::Partner),
            other => bail!("Unknown relationship type: {}", other),
        }
    }
}

/// Ordinal strength of a supply-chain link. The derived `Ord` follows the
/// declaration order, so `Critical` ranks highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Criticality {
    Low,
    Medium,
    High,
    Critical,
}

impl Criticality {
    pub fn as_str(self) -> &'static str {
        match self {
            Criticality::Low => "low",
            Criticality::Medium => "medium",
            Criticality::High => "high",
            Criticality::Critical => "critical",
        }
    }
}

impl fmt::Display for Criticality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criticality {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Criticality::Low),
            "medium" => Ok(Criticality::Medium),
            "high" => Ok(Criticality::High),
            "critical" => Ok(Criticality::Critical),
            other => bail!("Unknown criticality: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiscoverySource {
    SecEdgar,
    NewsReport,
    LlmInference,
    Manual,
    WebScrape,
}

impl DiscoverySource {
    pub fn as_str(self) -> &'static str {
        match self {
            DiscoverySource::SecEdgar => "sec_edgar",
            DiscoverySource::NewsReport => "news_report",
            DiscoverySource::LlmInference => "llm_inference",
            DiscoverySource::Manual => "manual",
            DiscoverySource::WebScrape => "web_scrape",
        }
    }
}

impl fmt::Display for DiscoverySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoverySource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sec_edgar" => Ok(DiscoverySource::SecEdgar),
            "news_report" => Ok(DiscoverySource::NewsReport),
            "llm_inference" => Ok(DiscoverySource::LlmInference),
            "manual" => Ok(DiscoverySource::Manual),
            "web_scrape" => Ok(DiscoverySource::WebScrape),
            other => bail!("Unknown discovery source: {}", other),
        }
    }
}

/// Single-source relationship evidence, as produced by one extractor probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRelationship {
    pub related_company: String,
    pub rel_type: RelationType,
    pub criticality: Criticality,
    pub evidence: String,
    pub source: DiscoverySource,
    pub confidence: f64,
}

/// Multi-source evidence after fusion; what gets upserted into the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedRelationship {
    pub related_company: String,
    pub rel_type: RelationType,
    pub criticality: Criticality,
    pub confidence: f64,
    pub sources: Vec<DiscoverySource>,
    pub evidence: Vec<String>,
}

/// A persisted directed edge `source_ticker -> target_ticker`.
/// Unique on (source_ticker, target_ticker, rel_type); confidence only ever
/// increases across upserts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub source_ticker: String,
    pub target_ticker: String,
    pub rel_type: RelationType,
    pub criticality: Criticality,
    pub confidence: f64,
    pub sources: Vec<DiscoverySource>,
    pub last_verified: DateTime<Utc>,
}

/// Wire form for the comma-joined `source_discovery` column.
pub fn join_sources(sources: &[DiscoverySource]) -> String {
    sources
        .iter()
        .map(|s| s.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn parse_sources(raw: &str) -> Vec<DiscoverySource> {
    raw.split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect()
}
