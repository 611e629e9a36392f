//! Journal trade record.

use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn parse(raw: &str) -> Option<Side> {
        match raw.trim().to_lowercase().as_str() {
            "buy" | "long" => Some(Side::Buy),
            "sell" | "short" => Some(Side::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }
}

/// A single executed trade as the trader journals it. Emotion tags are kept
/// as raw strings here; normalization happens at aggregation time so that
/// unrecognized tags survive a round-trip through storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Trade {
    pub id: Option<i64>,
    pub symbol: String,
    pub side: Side,
    pub quantity: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub trade_date: NaiveDate,
    pub emotions: Vec<String>,
    pub strategy_id: Option<i64>,
    pub notes: String,
}

impl Trade {
    pub fn is_win(&self) -> bool {
        self.pnl > 0.0
    }

    /// Basic field validation before a trade is persisted.
    pub fn validate(&self) -> Result<(), crate::domain::error::VeroTradeError> {
        use crate::domain::error::VeroTradeError;

        if self.symbol.trim().is_empty() {
            return Err(VeroTradeError::InvalidTrade {
                reason: "symbol must not be empty".into(),
            });
        }
        if self.quantity <= 0.0 {
            return Err(VeroTradeError::InvalidTrade {
                reason: "quantity must be positive".into(),
            });
        }
        if self.entry_price < 0.0 || self.exit_price < 0.0 {
            return Err(VeroTradeError::InvalidTrade {
                reason: "prices must be non-negative".into(),
            });
        }
        Ok(())
    }
}
