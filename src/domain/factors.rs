//! The ten-factor market taxonomy.
//!
//! The integer ids are wire-stable: persisted classifications reference them,
//! so variants must never be reordered or renumbered.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketFactor {
    Macroeconomic = 1,
    InterestRates = 2,
    SupplyChain = 3,
    CompanyEarnings = 4,
    GovernmentPolicy = 5,
    Geopolitical = 6,
    Currency = 7,
    MarketSentiment = 8,
    IndustryTrends = 9,
    BlackSwan = 10,
}

impl MarketFactor {
    pub const ALL: [MarketFactor; 10] = [
        MarketFactor::Macroeconomic,
        MarketFactor::InterestRates,
        MarketFactor::SupplyChain,
        MarketFactor::CompanyEarnings,
        MarketFactor::GovernmentPolicy,
        MarketFactor::Geopolitical,
        MarketFactor::Currency,
        MarketFactor::MarketSentiment,
        MarketFactor::IndustryTrends,
        MarketFactor::BlackSwan,
    ];

    pub fn id(self) -> i64 {
        self as i64
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.id() == id)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            MarketFactor::Macroeconomic => "Macroeconomic",
            MarketFactor::InterestRates => "Interest Rates",
            MarketFactor::SupplyChain => "Supply Chain",
            MarketFactor::CompanyEarnings => "Company Earnings",
            MarketFactor::GovernmentPolicy => "Government Policy",
            MarketFactor::Geopolitical => "Geopolitical",
            MarketFactor::Currency => "Currency",
            MarketFactor::MarketSentiment => "Market Sentiment",
            MarketFactor::IndustryTrends => "Industry Trends",
            MarketFactor::BlackSwan => "Black Swan",
        }
    }

    /// Case-insensitive exact match against the display name.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.display_name().eq_ignore_ascii_case(name))
    }

    /// Keyword set used by the classifier's heuristic fallback.
    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            MarketFactor::Macroeconomic => &[
                "gdp",
                "inflation",
                "cpi",
                "unemployment",
                "jobs report",
                "payroll",
                "pmi",
                "recession",
            ],
            MarketFactor::InterestRates => &[
                "federal reserve",
                "fed",
                "interest rate",
                "rate hike",
                "quantitative easing",
                "fomc",
                "yield",
            ],
            MarketFactor::SupplyChain => &[
                "supply chain",
                "shortage",
                "disruption",
                "factory shutdown",
                "production halt",
                "logistics",
                "shipping delay",
            ],
            MarketFactor::CompanyEarnings => &[
                "earnings",
                "revenue",
                "profit",
                "eps",
                "guidance",
                "quarterly results",
                "beat",
                "miss",
            ],
            MarketFactor::GovernmentPolicy => &[
                "regulation",
                "antitrust",
                "tax policy",
                "subsidy",
                "compliance",
                "legislation",
                "fda",
            ],
            MarketFactor::Geopolitical => &[
                "trade war",
                "tariff",
                "sanction",
                "geopolitical",
                "conflict",
                "election",
                "diplomacy",
            ],
            MarketFactor::Currency => &[
                "exchange rate",
                "forex",
                "dollar strength",
                "appreciation",
                "depreciation",
                "currency",
            ],
            MarketFactor::MarketSentiment => &[
                "vix",
                "volatility",
                "bullish",
                "bearish",
                "sell-off",
                "rally",
                "fear index",
            ],
            MarketFactor::IndustryTrends => &[
                "breakthrough",
                "innovation",
                "adoption",
                "market share",
                "consolidation",
            ],
            MarketFactor::BlackSwan => &[
                "unprecedented",
                "catastrophe",
                "pandemic",
                "natural disaster",
                "unexpected",
                "rare event",
            ],
        }
    }

    /// First factor whose keyword set matches the text, scanning in enum order.
    pub fn match_keywords(text: &str) -> Option<Self> {
        let lower = text.to_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.keywords().iter().any(|kw| lower.contains(kw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_wire_stable() {
        assert_eq!(MarketFactor::Macroeconomic.id(), 1);
        assert_eq!(MarketFactor::SupplyChain.id(), 3);
        assert_eq!(MarketFactor::BlackSwan.id(), 10);
        for f in MarketFactor::ALL {
            assert_eq!(MarketFactor::from_id(f.id()), Some(f));
        }
        assert_eq!(MarketFactor::from_id(11), None);
    }

    #[test]
    fn test_name_coercion_is_case_insensitive() {
        assert_eq!(
            MarketFactor::from_name("supply chain"),
            Some(MarketFactor::SupplyChain)
        );
        assert_eq!(
            MarketFactor::from_name("  Interest Rates "),
            Some(MarketFactor::InterestRates)
        );
        assert_eq!(MarketFactor::from_name("Sentiment"), None);
    }

    #[test]
    fn test_keyword_match_first_wins() {
        // "production halt" -> Supply Chain even though "rally" also appears later
        let f = MarketFactor::match_keywords("Production halt sparks a rally in rivals");
        assert_eq!(f, Some(MarketFactor::SupplyChain));
    }
}
