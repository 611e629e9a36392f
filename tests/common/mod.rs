#![allow(dead_code)]

use std::sync::Mutex;

use chrono::NaiveDate;
use verotrade::domain::error::VeroTradeError;
use verotrade::domain::strategy::{RuleCheck, Strategy};
use verotrade::domain::trade::{Side, Trade};
use verotrade::ports::journal_port::JournalPort;

#[derive(Default)]
struct MockState {
    trades: Vec<Trade>,
    strategies: Vec<Strategy>,
    checks: Vec<RuleCheck>,
    next_id: i64,
    fail_reason: Option<String>,
}

/// In-memory journal used by integration and web tests.
#[derive(Default)]
pub struct MockJournalPort {
    state: Mutex<MockState>,
}

impl MockJournalPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trades(self, trades: Vec<Trade>) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            for mut trade in trades {
                state.next_id += 1;
                trade.id = Some(state.next_id);
                state.trades.push(trade);
            }
        }
        self
    }

    pub fn with_strategy(self, strategy: Strategy) -> Self {
        self.insert_strategy(&strategy).unwrap();
        self
    }

    pub fn failing(reason: &str) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().fail_reason = Some(reason.to_string());
        mock
    }
}

impl JournalPort for MockJournalPort {
    fn insert_trade(&self, trade: &Trade) -> Result<i64, VeroTradeError> {
        trade.validate()?;
        let mut state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_reason {
            return Err(VeroTradeError::Database {
                reason: reason.clone(),
            });
        }
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = trade.clone();
        stored.id = Some(id);
        state.trades.push(stored);
        Ok(id)
    }

    fn fetch_trades(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Trade>, VeroTradeError> {
        let state = self.state.lock().unwrap();
        if let Some(reason) = &state.fail_reason {
            return Err(VeroTradeError::Database {
                reason: reason.clone(),
            });
        }
        let mut trades: Vec<Trade> = state
            .trades
            .iter()
            .filter(|t| t.trade_date >= start_date && t.trade_date <= end_date)
            .cloned()
            .collect();
        trades.sort_by_key(|t| (t.trade_date, t.id));
        Ok(trades)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VeroTradeError> {
        let state = self.state.lock().unwrap();
        let mut symbols: Vec<String> = state.trades.iter().map(|t| t.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn insert_strategy(&self, strategy: &Strategy) -> Result<i64, VeroTradeError> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let mut stored = strategy.clone();
        stored.id = Some(id);
        for rule in &mut stored.rules {
            state.next_id += 1;
            rule.id = Some(state.next_id);
        }
        state.strategies.push(stored);
        Ok(id)
    }

    fn list_strategies(&self) -> Result<Vec<Strategy>, VeroTradeError> {
        let state = self.state.lock().unwrap();
        let mut strategies = state.strategies.clone();
        strategies.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(strategies)
    }

    fn fetch_trades_for_strategy(&self, strategy_id: i64) -> Result<Vec<Trade>, VeroTradeError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .trades
            .iter()
            .filter(|t| t.strategy_id == Some(strategy_id))
            .cloned()
            .collect())
    }

    fn record_rule_check(
        &self,
        trade_id: i64,
        rule_id: i64,
        honored: bool,
    ) -> Result<(), VeroTradeError> {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .checks
            .iter_mut()
            .find(|c| c.trade_id == trade_id && c.rule_id == rule_id)
        {
            existing.honored = honored;
        } else {
            state.checks.push(RuleCheck {
                trade_id,
                rule_id,
                honored,
            });
        }
        Ok(())
    }

    fn fetch_rule_checks(&self, strategy_id: i64) -> Result<Vec<RuleCheck>, VeroTradeError> {
        let state = self.state.lock().unwrap();
        let rule_ids: Vec<i64> = state
            .strategies
            .iter()
            .filter(|s| s.id == Some(strategy_id))
            .flat_map(|s| s.rules.iter().filter_map(|r| r.id))
            .collect();
        Ok(state
            .checks
            .iter()
            .filter(|c| rule_ids.contains(&c.rule_id))
            .copied()
            .collect())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_trade(symbol: &str, day: u32, pnl: f64, emotions: &[&str]) -> Trade {
    Trade {
        id: None,
        symbol: symbol.to_string(),
        side: Side::Buy,
        quantity: 100.0,
        entry_price: 10.0,
        exit_price: 10.0 + pnl / 100.0,
        pnl,
        trade_date: date(2024, 3, day),
        emotions: emotions.iter().map(|e| e.to_string()).collect(),
        strategy_id: None,
        notes: String::new(),
    }
}

/// 5 disciplined winners and 5 tilted losers: stability index 62.50.
pub fn balanced_psychology_journal() -> Vec<Trade> {
    let mut trades: Vec<Trade> = (1..=5)
        .map(|day| make_trade("BHP", day, 100.0, &["DISCIPLINE"]))
        .collect();
    trades.extend((6..=10).map(|day| make_trade("CBA", day, -80.0, &["TILT"])));
    trades
}
