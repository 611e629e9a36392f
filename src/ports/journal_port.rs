//! Journal persistence port trait.

use chrono::NaiveDate;

use crate::domain::error::VeroTradeError;
use crate::domain::strategy::{RuleCheck, Strategy};
use crate::domain::trade::Trade;

pub trait JournalPort {
    /// Persist a trade (and its emotion tags); returns the assigned id.
    fn insert_trade(&self, trade: &Trade) -> Result<i64, VeroTradeError>;

    /// All trades with a trade date inside the inclusive range, oldest first.
    fn fetch_trades(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Trade>, VeroTradeError>;

    fn list_symbols(&self) -> Result<Vec<String>, VeroTradeError>;

    /// Persist a strategy with its rules; returns the assigned strategy id.
    fn insert_strategy(&self, strategy: &Strategy) -> Result<i64, VeroTradeError>;

    /// All strategies, rules included, ordered by name.
    fn list_strategies(&self) -> Result<Vec<Strategy>, VeroTradeError>;

    fn fetch_trades_for_strategy(&self, strategy_id: i64) -> Result<Vec<Trade>, VeroTradeError>;

    /// Record whether one rule was honored for one trade.
    fn record_rule_check(
        &self,
        trade_id: i64,
        rule_id: i64,
        honored: bool,
    ) -> Result<(), VeroTradeError>;

    fn fetch_rule_checks(&self, strategy_id: i64) -> Result<Vec<RuleCheck>, VeroTradeError>;
}
