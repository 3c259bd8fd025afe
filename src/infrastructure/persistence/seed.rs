//! Seed data: tracked companies, known-critical supply-chain edges, the
//! historical precedent table, and a demo holdings set.
//!
//! Precedent `event_type` strings embed a factor display name so the
//! substring lookup in `PrecedentRepository::for_factor` finds them.

use crate::domain::portfolio::Holding;
use crate::domain::precedent::HistoricalPrecedent;
use crate::domain::relationship::{
    Criticality, DiscoverySource, FusedRelationship, RelationType,
};
use crate::domain::repositories::{
    CompanyRepository, HoldingRepository, PrecedentRepository, RelationshipRepository,
};
use anyhow::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::info;

const COMPANIES: &[(&str, &str, &str, bool)] = &[
    ("AAPL", "Apple Inc.", "Technology", true),
    ("NVDA", "NVIDIA Corporation", "Semiconductors", true),
    ("AMD", "Advanced Micro Devices", "Semiconductors", true),
    ("INTC", "Intel Corporation", "Semiconductors", true),
    ("AVGO", "Broadcom Inc.", "Semiconductors", true),
    ("TSM", "TSMC", "Semiconductors", false),
    ("ASML", "ASML Holding", "Semiconductors", false),
    ("AMAT", "Applied Materials", "Semiconductors", false),
    ("LRCX", "Lam Research", "Semiconductors", false),
    ("KLAC", "KLA Corporation", "Semiconductors", false),
    ("MSFT", "Microsoft", "Technology", false),
    ("GOOGL", "Alphabet", "Technology", false),
    ("AMZN", "Amazon", "Consumer Discretionary", false),
    ("TSLA", "Tesla", "Automotive", false),
    ("MU", "Micron Technology", "Semiconductors", false),
    ("ARM", "ARM Holdings", "Semiconductors", false),
    ("TXN", "Texas Instruments", "Semiconductors", false),
    ("QCOM", "Qualcomm", "Semiconductors", false),
    ("SSNLF", "Samsung Electronics", "Semiconductors", false),
    ("RIVN", "Rivian Automotive", "Automotive", false),
];

const RELATIONSHIPS: &[(&str, &str, &str, &str)] = &[
    ("TSM", "AAPL", "supplier", "critical"),
    ("TSM", "NVDA", "supplier", "critical"),
    ("TSM", "AMD", "supplier", "critical"),
    ("TSM", "INTC", "supplier", "medium"),
    ("ASML", "TSM", "supplier", "critical"),
    ("ARM", "AAPL", "partner", "critical"),
    ("ARM", "NVDA", "partner", "high"),
    ("SSNLF", "NVDA", "supplier", "high"),
    ("MU", "NVDA", "supplier", "high"),
    ("AVGO", "AAPL", "supplier", "high"),
    ("QCOM", "AAPL", "supplier", "medium"),
    ("AAPL", "TSM", "customer", "critical"),
    ("NVDA", "TSM", "customer", "critical"),
];

fn precedents() -> Vec<HistoricalPrecedent> {
    let rows: &[(&str, &str, &str, f64, &str)] = &[
        (
            "Supply Chain",
            "Taiwan Earthquake 2024",
            "2024-04-03",
            1.8,
            "Major disruption to TSMC facilities, causing global chip supply concerns.",
        ),
        (
            "Supply Chain",
            "Suez Canal Blockage",
            "2021-03-23",
            1.5,
            "Global trade bottleneck impacting electronics and energy components.",
        ),
        (
            "Supply Chain",
            "Fab 18 Equipment Malfunction",
            "2021-04-15",
            1.6,
            "Two-week production halt caused iPhone delays and GPU shortages.",
        ),
        (
            "Supply Chain",
            "Battery Supplier Delays",
            "2022-09-15",
            2.3,
            "Battery shipment delays forced announced production cuts.",
        ),
        (
            "Company Earnings",
            "NVIDIA Q2 2023 Earnings",
            "2023-08-23",
            2.2,
            "AI demand surge led to record guidance and a stock breakout.",
        ),
        (
            "Company Earnings",
            "Meta Earnings Miss Q1 2022",
            "2022-02-03",
            1.9,
            "Earnings miss and lowered guidance after platform privacy changes.",
        ),
        (
            "Macroeconomic",
            "Inflation Reaches 40-Year High",
            "2022-06-10",
            1.7,
            "CPI hits 9.1%, broad tech selloff.",
        ),
        (
            "Interest Rates",
            "Largest Fed Hike Since 1994",
            "2022-06-15",
            1.5,
            "75bp raise; semiconductor and growth names sold off hard.",
        ),
        (
            "Geopolitical",
            "AI Chip Export Restrictions",
            "2023-10-17",
            1.8,
            "Advanced AI chip sales restricted; suppliers lost China revenue.",
        ),
        (
            "Geopolitical",
            "Taiwan Strait Tensions",
            "2024-05-20",
            1.4,
            "Military exercises raised semiconductor supply concerns.",
        ),
        (
            "Government Policy",
            "Platform Ecosystem Regulation",
            "2024-03-07",
            1.1,
            "Forced ecosystem opening, pressuring long-term service revenue.",
        ),
        (
            "Market Sentiment",
            "Regional Bank Collapse",
            "2023-03-10",
            1.9,
            "Banking contagion fears briefly hit market liquidity and tech lending.",
        ),
        (
            "Market Sentiment",
            "COVID-19 Market Crash",
            "2020-03-16",
            3.0,
            "Fastest bear market in history; recovery took six months.",
        ),
        (
            "Industry Trends",
            "Generative AI Launch Wave",
            "2022-11-30",
            2.0,
            "Triggered an AI transformation and capex surge across datacenter suppliers.",
        ),
        (
            "Black Swan",
            "Global Pandemic Declaration",
            "2020-03-11",
            3.0,
            "Unprecedented worldwide shutdowns across all supply chains.",
        ),
        (
            "Currency",
            "Dollar Strength Peak",
            "2022-09-27",
            1.2,
            "Multi-decade dollar high compressed overseas revenue.",
        ),
    ];

    rows.iter()
        .map(|(event_type, name, date, magnitude, desc)| HistoricalPrecedent {
            event_type: event_type.to_string(),
            event_name: name.to_string(),
            date_occurred: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap_or_default(),
            impact_magnitude: *magnitude,
            description: desc.to_string(),
        })
        .collect()
}

fn demo_holdings(user_id: &str) -> Vec<Holding> {
    let rows: &[(&str, &str, &str, &str, &str)] = &[
        ("AAPL", "Apple Inc.", "50", "180.00", "225.00"),
        ("NVDA", "NVIDIA Corporation", "20", "450.00", "1150.00"),
        ("AMD", "Advanced Micro Devices", "40", "95.00", "160.00"),
        ("INTC", "Intel Corporation", "100", "42.00", "31.00"),
        ("AVGO", "Broadcom Inc.", "10", "620.00", "1400.00"),
    ];

    rows.iter()
        .map(|(ticker, name, qty, avg, cur)| Holding {
            user_id: user_id.to_string(),
            ticker: ticker.to_string(),
            company_name: name.to_string(),
            quantity: Decimal::from_str(qty).unwrap_or_default(),
            avg_price: Decimal::from_str(avg).unwrap_or_default(),
            current_price: Decimal::from_str(cur).unwrap_or_default(),
        })
        .collect()
}

pub struct SeedService;

impl SeedService {
    pub async fn run(
        companies: &dyn CompanyRepository,
        relationships: &dyn RelationshipRepository,
        precedent_repo: &dyn PrecedentRepository,
        holdings: &dyn HoldingRepository,
        user_id: &str,
    ) -> Result<()> {
        for (ticker, name, sector, is_portfolio) in COMPANIES {
            companies.ensure_exists(ticker, name, sector).await?;
            if *is_portfolio {
                companies.set_portfolio(ticker, true).await?;
            }
        }

        for (source, target, rel_type, criticality) in RELATIONSHIPS {
            let fused = FusedRelationship {
                related_company: target.to_string(),
                rel_type: RelationType::from_str(rel_type)?,
                criticality: Criticality::from_str(criticality)?,
                confidence: 0.95,
                sources: vec![DiscoverySource::Manual],
                evidence: vec!["Curated seed relationship".to_string()],
            };
            relationships.upsert_all(source, &[fused]).await?;
        }

        precedent_repo.insert_all(&precedents()).await?;
        holdings.replace_all(user_id, &demo_holdings(user_id)).await?;

        info!(
            "Seeded {} companies, {} relationships, {} precedents",
            COMPANIES.len(),
            RELATIONSHIPS.len(),
            precedents().len()
        );
        Ok(())
    }
}
