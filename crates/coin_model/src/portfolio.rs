use serde::Serialize;

use crate::{CoinId, CoinSnapshot};

/// A quantity the user entered for one coin. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioHolding {
    pub coin: CoinId,
    pub quantity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PortfolioValue {
    pub value_eur: f64,
    pub value_usd: f64,
    pub delta_24h_eur: f64,
}

impl PortfolioHolding {
    pub fn new(coin: CoinId, quantity: f64) -> Self {
        PortfolioHolding { coin, quantity }
    }

    pub fn is_empty(&self) -> bool {
        self.quantity <= 0.0
    }

    pub fn value(&self, snapshot: &CoinSnapshot) -> PortfolioValue {
        PortfolioValue {
            value_eur: self.quantity * snapshot.price_eur,
            value_usd: self.quantity * snapshot.price_usd,
            delta_24h_eur: self.quantity * (snapshot.change_24h_pct / 100.0) * snapshot.price_eur,
        }
    }
}
