use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: String,
    pub ticker: String,
    pub company_name: String,
    pub quantity: Decimal,
    pub avg_price: Decimal,
    pub current_price: Decimal,
}

impl Holding {
    pub fn market_value(&self) -> Decimal {
        self.quantity * self.current_price
    }
}

/// The per-invocation input snapshot: the core never mutates holdings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub user_id: String,
    pub holdings: Vec<Holding>,
}

impl PortfolioSnapshot {
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            holdings: Vec::new(),
        }
    }

    pub fn tickers(&self) -> Vec<String> {
        self.holdings.iter().map(|h| h.ticker.clone()).collect()
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.holdings.iter().any(|h| h.ticker == ticker)
    }

    pub fn total_value(&self) -> Decimal {
        self.holdings.iter().map(Holding::market_value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn holding(ticker: &str, qty: Decimal, price: Decimal) -> Holding {
        Holding {
            user_id: "u1".into(),
            ticker: ticker.into(),
            company_name: ticker.into(),
            quantity: qty,
            avg_price: price,
            current_price: price,
        }
    }

    #[test]
    fn test_total_value() {
        let snap = PortfolioSnapshot {
            user_id: "u1".into(),
            holdings: vec![
                holding("AAPL", dec!(10), dec!(200)),
                holding("NVDA", dec!(5), dec!(1000)),
            ],
        };
        assert_eq!(snap.total_value(), dec!(7000));
        assert!(snap.contains("NVDA"));
        assert!(!snap.contains("TSM"));
    }
}
