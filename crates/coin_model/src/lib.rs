use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod portfolio;

pub use portfolio::{PortfolioHolding, PortfolioValue};

/// Coins the dashboard knows how to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinId {
    Bitcoin,
    Ethereum,
    Ripple,
    Litecoin,
    Dogecoin,
}

impl CoinId {
    /// Selector order.
    pub const ALL: [CoinId; 5] = [
        CoinId::Bitcoin,
        CoinId::Ethereum,
        CoinId::Ripple,
        CoinId::Litecoin,
        CoinId::Dogecoin,
    ];

    /// Identifier used by the upstream API and in query strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinId::Bitcoin => "bitcoin",
            CoinId::Ethereum => "ethereum",
            CoinId::Ripple => "ripple",
            CoinId::Litecoin => "litecoin",
            CoinId::Dogecoin => "dogecoin",
        }
    }
}

impl fmt::Display for CoinId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown coin: {0}")]
pub struct UnknownCoin(pub String);

impl FromStr for CoinId {
    type Err = UnknownCoin;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CoinId::ALL
            .into_iter()
            .find(|coin| coin.as_str() == s)
            .ok_or_else(|| UnknownCoin(s.to_string()))
    }
}

/// Point-in-time market figures for a single coin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinSnapshot {
    pub id: CoinId,
    pub name: String,
    pub symbol: String,
    pub price_eur: f64,
    pub price_usd: f64,
    pub change_24h_pct: f64,
    pub market_cap_eur: f64,
}

impl CoinSnapshot {
    pub fn symbol_upper(&self) -> String {
        self.symbol.to_uppercase()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price_eur: f64,
}

/// Trailing price history, ascending by timestamp.
pub type HistoricalSeries = Vec<PricePoint>;

/// A price point with derived indicator columns. `None` marks points where
/// the lookback window has not filled yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndicatedPoint {
    pub timestamp: DateTime<Utc>,
    pub price_eur: f64,
    pub rsi_14: Option<f64>,
    pub sma_50: Option<f64>,
    pub sma_200: Option<f64>,
}

pub type IndicatedSeries = Vec<IndicatedPoint>;
