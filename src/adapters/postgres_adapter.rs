//! PostgreSQL journal adapter.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use postgres::types::ToSql;
use postgres::{Client, NoTls, Row};

use crate::domain::error::VeroTradeError;
use crate::domain::strategy::{RuleCheck, Strategy, StrategyRule};
use crate::domain::trade::{Side, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

/// The connection sits behind a mutex so the adapter can be shared with the
/// web server, which serves requests from multiple threads.
pub struct PostgresAdapter {
    client: Mutex<Client>,
}

fn db_err(e: postgres::Error) -> VeroTradeError {
    VeroTradeError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: postgres::Error) -> VeroTradeError {
    VeroTradeError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl PostgresAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VeroTradeError> {
        // Try [postgres] connection_string first, fall back to [database] conninfo
        let connection_string = config
            .get_string("postgres", "connection_string")
            .or_else(|| config.get_string("database", "conninfo"))
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "database".into(),
                key: "conninfo".into(),
            })?;

        let client = Client::connect(&connection_string, NoTls).map_err(db_err)?;

        Ok(Self {
            client: Mutex::new(client),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Client>, VeroTradeError> {
        self.client.lock().map_err(|_| VeroTradeError::Database {
            reason: "connection mutex poisoned".into(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), VeroTradeError> {
        self.conn()?
            .batch_execute(
                "CREATE TABLE IF NOT EXISTS trades (
                    id BIGSERIAL PRIMARY KEY,
                    symbol TEXT NOT NULL,
                    side TEXT NOT NULL,
                    quantity DOUBLE PRECISION NOT NULL,
                    entry_price DOUBLE PRECISION NOT NULL,
                    exit_price DOUBLE PRECISION NOT NULL,
                    pnl DOUBLE PRECISION NOT NULL,
                    trade_date DATE NOT NULL,
                    strategy_id BIGINT,
                    notes TEXT NOT NULL DEFAULT ''
                );
                CREATE INDEX IF NOT EXISTS idx_trades_date ON trades(trade_date);

                CREATE TABLE IF NOT EXISTS trade_emotions (
                    trade_id BIGINT NOT NULL REFERENCES trades(id),
                    tag TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_trade_emotions_trade
                    ON trade_emotions(trade_id);

                CREATE TABLE IF NOT EXISTS strategies (
                    id BIGSERIAL PRIMARY KEY,
                    name TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT ''
                );

                CREATE TABLE IF NOT EXISTS strategy_rules (
                    id BIGSERIAL PRIMARY KEY,
                    strategy_id BIGINT NOT NULL REFERENCES strategies(id),
                    rule_text TEXT NOT NULL,
                    required BOOLEAN NOT NULL DEFAULT TRUE
                );

                CREATE TABLE IF NOT EXISTS strategy_stats (
                    trade_id BIGINT NOT NULL REFERENCES trades(id),
                    rule_id BIGINT NOT NULL REFERENCES strategy_rules(id),
                    honored BOOLEAN NOT NULL,
                    PRIMARY KEY (trade_id, rule_id)
                );",
            )
            .map_err(query_err)
    }

    fn trade_from_row(row: &Row) -> Result<Trade, VeroTradeError> {
        let side_str: String = row.get(2);
        let side = Side::parse(&side_str).ok_or_else(|| VeroTradeError::DatabaseQuery {
            reason: format!("invalid side stored: {side_str}"),
        })?;

        Ok(Trade {
            id: Some(row.get(0)),
            symbol: row.get(1),
            side,
            quantity: row.get(3),
            entry_price: row.get(4),
            exit_price: row.get(5),
            pnl: row.get(6),
            trade_date: row.get(7),
            emotions: Vec::new(),
            strategy_id: row.get(8),
            notes: row.get(9),
        })
    }

    fn attach_emotions(&self, trades: &mut [Trade]) -> Result<(), VeroTradeError> {
        if trades.is_empty() {
            return Ok(());
        }

        let rows = self
            .conn()?
            .query("SELECT trade_id, tag FROM trade_emotions", &[])
            .map_err(query_err)?;

        let mut by_trade: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            by_trade
                .entry(row.get(0))
                .or_default()
                .push(row.get(1));
        }

        for trade in trades {
            if let Some(id) = trade.id {
                if let Some(tags) = by_trade.remove(&id) {
                    trade.emotions = tags;
                }
            }
        }

        Ok(())
    }
}

impl JournalPort for PostgresAdapter {
    fn insert_trade(&self, trade: &Trade) -> Result<i64, VeroTradeError> {
        trade.validate()?;

        let mut client = self.conn()?;
        let mut tx = client.transaction().map_err(db_err)?;

        let side = trade.side.as_str();
        let params: &[&(dyn ToSql + Sync)] = &[
            &trade.symbol,
            &side,
            &trade.quantity,
            &trade.entry_price,
            &trade.exit_price,
            &trade.pnl,
            &trade.trade_date,
            &trade.strategy_id,
            &trade.notes,
        ];
        let row = tx
            .query_one(
                "INSERT INTO trades
                    (symbol, side, quantity, entry_price, exit_price, pnl, trade_date, strategy_id, notes)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                 RETURNING id",
                params,
            )
            .map_err(query_err)?;
        let trade_id: i64 = row.get(0);

        for tag in &trade.emotions {
            tx.execute(
                "INSERT INTO trade_emotions (trade_id, tag) VALUES ($1, $2)",
                &[&trade_id, tag],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(trade_id)
    }

    fn fetch_trades(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<Trade>, VeroTradeError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id, symbol, side, quantity, entry_price, exit_price, pnl,
                        trade_date, strategy_id, notes
                 FROM trades
                 WHERE trade_date >= $1 AND trade_date <= $2
                 ORDER BY trade_date ASC, id ASC",
                &[&start_date, &end_date],
            )
            .map_err(query_err)?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in &rows {
            trades.push(Self::trade_from_row(row)?);
        }

        self.attach_emotions(&mut trades)?;
        Ok(trades)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VeroTradeError> {
        let rows = self
            .conn()?
            .query("SELECT DISTINCT symbol FROM trades ORDER BY symbol", &[])
            .map_err(query_err)?;

        Ok(rows.into_iter().map(|row| row.get(0)).collect())
    }

    fn insert_strategy(&self, strategy: &Strategy) -> Result<i64, VeroTradeError> {
        let mut client = self.conn()?;
        let mut tx = client.transaction().map_err(db_err)?;

        let row = tx
            .query_one(
                "INSERT INTO strategies (name, description) VALUES ($1, $2) RETURNING id",
                &[&strategy.name, &strategy.description],
            )
            .map_err(query_err)?;
        let strategy_id: i64 = row.get(0);

        for rule in &strategy.rules {
            tx.execute(
                "INSERT INTO strategy_rules (strategy_id, rule_text, required)
                 VALUES ($1, $2, $3)",
                &[&strategy_id, &rule.text, &rule.required],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(strategy_id)
    }

    fn list_strategies(&self) -> Result<Vec<Strategy>, VeroTradeError> {
        let strategy_rows = self
            .conn()?
            .query(
                "SELECT id, name, description FROM strategies ORDER BY name",
                &[],
            )
            .map_err(query_err)?;

        let mut strategies: Vec<Strategy> = strategy_rows
            .into_iter()
            .map(|row| Strategy {
                id: Some(row.get(0)),
                name: row.get(1),
                description: row.get(2),
                rules: Vec::new(),
            })
            .collect();

        for strategy in &mut strategies {
            let strategy_id = strategy.id.unwrap_or_default();
            let rule_rows = self
                .conn()?
                .query(
                    "SELECT id, rule_text, required FROM strategy_rules
                     WHERE strategy_id = $1 ORDER BY id",
                    &[&strategy_id],
                )
                .map_err(query_err)?;

            strategy.rules = rule_rows
                .into_iter()
                .map(|row| StrategyRule {
                    id: Some(row.get(0)),
                    text: row.get(1),
                    required: row.get(2),
                })
                .collect();
        }

        Ok(strategies)
    }

    fn fetch_trades_for_strategy(&self, strategy_id: i64) -> Result<Vec<Trade>, VeroTradeError> {
        let rows = self
            .conn()?
            .query(
                "SELECT id, symbol, side, quantity, entry_price, exit_price, pnl,
                        trade_date, strategy_id, notes
                 FROM trades
                 WHERE strategy_id = $1
                 ORDER BY trade_date ASC, id ASC",
                &[&strategy_id],
            )
            .map_err(query_err)?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in &rows {
            trades.push(Self::trade_from_row(row)?);
        }

        self.attach_emotions(&mut trades)?;
        Ok(trades)
    }

    fn record_rule_check(
        &self,
        trade_id: i64,
        rule_id: i64,
        honored: bool,
    ) -> Result<(), VeroTradeError> {
        self.conn()?
            .execute(
                "INSERT INTO strategy_stats (trade_id, rule_id, honored)
                 VALUES ($1, $2, $3)
                 ON CONFLICT (trade_id, rule_id) DO UPDATE SET honored = EXCLUDED.honored",
                &[&trade_id, &rule_id, &honored],
            )
            .map_err(query_err)?;

        Ok(())
    }

    fn fetch_rule_checks(&self, strategy_id: i64) -> Result<Vec<RuleCheck>, VeroTradeError> {
        let rows = self
            .conn()?
            .query(
                "SELECT ss.trade_id, ss.rule_id, ss.honored
                 FROM strategy_stats ss
                 JOIN strategy_rules sr ON sr.id = ss.rule_id
                 WHERE sr.strategy_id = $1
                 ORDER BY ss.trade_id, ss.rule_id",
                &[&strategy_id],
            )
            .map_err(query_err)?;

        Ok(rows
            .into_iter()
            .map(|row| RuleCheck {
                trade_id: row.get(0),
                rule_id: row.get(1),
                honored: row.get(2),
            })
            .collect())
    }
}
