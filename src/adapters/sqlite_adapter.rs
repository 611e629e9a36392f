//! SQLite journal adapter.

use std::collections::HashMap;

use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

use crate::domain::error::VeroTradeError;
use crate::domain::strategy::{RuleCheck, Strategy, StrategyRule};
use crate::domain::trade::{Side, Trade};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn db_err(e: r2d2::Error) -> VeroTradeError {
    VeroTradeError::Database {
        reason: e.to_string(),
    }
}

fn query_err(e: rusqlite::Error) -> VeroTradeError {
    VeroTradeError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, VeroTradeError> {
        let db_path =
            config
                .get_string("sqlite", "path")
                .ok_or_else(|| VeroTradeError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(db_err)?;

        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, VeroTradeError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).map_err(db_err)?;
        Ok(Self { pool })
    }

    pub fn initialize_schema(&self) -> Result<(), VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS trades (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                symbol TEXT NOT NULL,
                side TEXT NOT NULL,
                quantity REAL NOT NULL,
                entry_price REAL NOT NULL,
                exit_price REAL NOT NULL,
                pnl REAL NOT NULL,
                trade_date TEXT NOT NULL,
                strategy_id INTEGER,
                notes TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_trades_date ON trades(trade_date);
            CREATE INDEX IF NOT EXISTS idx_trades_strategy ON trades(strategy_id);

            CREATE TABLE IF NOT EXISTS trade_emotions (
                trade_id INTEGER NOT NULL REFERENCES trades(id),
                tag TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_trade_emotions_trade ON trade_emotions(trade_id);

            CREATE TABLE IF NOT EXISTS strategies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS strategy_rules (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                strategy_id INTEGER NOT NULL REFERENCES strategies(id),
                rule_text TEXT NOT NULL,
                required INTEGER NOT NULL DEFAULT 1
            );
            CREATE INDEX IF NOT EXISTS idx_strategy_rules_strategy
                ON strategy_rules(strategy_id);

            CREATE TABLE IF NOT EXISTS strategy_stats (
                trade_id INTEGER NOT NULL REFERENCES trades(id),
                rule_id INTEGER NOT NULL REFERENCES strategy_rules(id),
                honored INTEGER NOT NULL,
                PRIMARY KEY (trade_id, rule_id)
            );",
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn trade_from_row(row: &rusqlite::Row<'_>) -> Result<Trade, rusqlite::Error> {
        let date_str: String = row.get(7)?;
        let trade_date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                date_str.len(),
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })?;

        let side_str: String = row.get(2)?;
        let side = Side::parse(&side_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                side_str.len(),
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::other(format!("invalid side: {side_str}"))),
            )
        })?;

        Ok(Trade {
            id: Some(row.get(0)?),
            symbol: row.get(1)?,
            side,
            quantity: row.get(3)?,
            entry_price: row.get(4)?,
            exit_price: row.get(5)?,
            pnl: row.get(6)?,
            trade_date,
            emotions: Vec::new(),
            strategy_id: row.get(8)?,
            notes: row.get(9)?,
        })
    }

    fn attach_emotions(
        conn: &rusqlite::Connection,
        trades: &mut [Trade],
    ) -> Result<(), VeroTradeError> {
        if trades.is_empty() {
            return Ok(());
        }

        let mut stmt = conn
            .prepare("SELECT trade_id, tag FROM trade_emotions ORDER BY rowid")
            .map_err(query_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(query_err)?;

        let mut by_trade: HashMap<i64, Vec<String>> = HashMap::new();
        for row in rows {
            let (trade_id, tag) = row.map_err(query_err)?;
            by_trade.entry(trade_id).or_default().push(tag);
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

impl JournalPort for SqliteAdapter {
    fn insert_trade(&self, trade: &Trade) -> Result<i64, VeroTradeError> {
        trade.validate()?;

        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        tx.execute(
            "INSERT INTO trades
                (symbol, side, quantity, entry_price, exit_price, pnl, trade_date, strategy_id, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                trade.symbol,
                trade.side.as_str(),
                trade.quantity,
                trade.entry_price,
                trade.exit_price,
                trade.pnl,
                trade.trade_date.format("%Y-%m-%d").to_string(),
                trade.strategy_id,
                trade.notes,
            ],
        )
        .map_err(query_err)?;

        let trade_id = tx.last_insert_rowid();

        for tag in &trade.emotions {
            tx.execute(
                "INSERT INTO trade_emotions (trade_id, tag) VALUES (?1, ?2)",
                params![trade_id, tag],
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
        let conn = self.pool.get().map_err(db_err)?;

        let start_str = start_date.format("%Y-%m-%d").to_string();
        let end_str = end_date.format("%Y-%m-%d").to_string();

        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, side, quantity, entry_price, exit_price, pnl,
                        trade_date, strategy_id, notes
                 FROM trades
                 WHERE trade_date >= ?1 AND trade_date <= ?2
                 ORDER BY trade_date ASC, id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![start_str, end_str], Self::trade_from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }

        Self::attach_emotions(&conn, &mut trades)?;
        Ok(trades)
    }

    fn list_symbols(&self) -> Result<Vec<String>, VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM trades ORDER BY symbol")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| row.get(0))
            .map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }

        Ok(symbols)
    }

    fn insert_strategy(&self, strategy: &Strategy) -> Result<i64, VeroTradeError> {
        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn.transaction().map_err(query_err)?;

        tx.execute(
            "INSERT INTO strategies (name, description) VALUES (?1, ?2)",
            params![strategy.name, strategy.description],
        )
        .map_err(query_err)?;

        let strategy_id = tx.last_insert_rowid();

        for rule in &strategy.rules {
            tx.execute(
                "INSERT INTO strategy_rules (strategy_id, rule_text, required)
                 VALUES (?1, ?2, ?3)",
                params![strategy_id, rule.text, rule.required as i64],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(strategy_id)
    }

    fn list_strategies(&self) -> Result<Vec<Strategy>, VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare("SELECT id, name, description FROM strategies ORDER BY name")
            .map_err(query_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok(Strategy {
                    id: Some(row.get(0)?),
                    name: row.get(1)?,
                    description: row.get(2)?,
                    rules: Vec::new(),
                })
            })
            .map_err(query_err)?;

        let mut strategies = Vec::new();
        for row in rows {
            strategies.push(row.map_err(query_err)?);
        }

        let mut rule_stmt = conn
            .prepare(
                "SELECT id, rule_text, required FROM strategy_rules
                 WHERE strategy_id = ?1 ORDER BY id",
            )
            .map_err(query_err)?;

        for strategy in &mut strategies {
            let strategy_id = strategy.id.unwrap_or_default();
            let rules = rule_stmt
                .query_map(params![strategy_id], |row| {
                    Ok(StrategyRule {
                        id: Some(row.get(0)?),
                        text: row.get(1)?,
                        required: row.get::<_, i64>(2)? != 0,
                    })
                })
                .map_err(query_err)?;

            for rule in rules {
                strategy.rules.push(rule.map_err(query_err)?);
            }
        }

        Ok(strategies)
    }

    fn fetch_trades_for_strategy(&self, strategy_id: i64) -> Result<Vec<Trade>, VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT id, symbol, side, quantity, entry_price, exit_price, pnl,
                        trade_date, strategy_id, notes
                 FROM trades
                 WHERE strategy_id = ?1
                 ORDER BY trade_date ASC, id ASC",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![strategy_id], Self::trade_from_row)
            .map_err(query_err)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_err)?);
        }

        Self::attach_emotions(&conn, &mut trades)?;
        Ok(trades)
    }

    fn record_rule_check(
        &self,
        trade_id: i64,
        rule_id: i64,
        honored: bool,
    ) -> Result<(), VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        conn.execute(
            "INSERT OR REPLACE INTO strategy_stats (trade_id, rule_id, honored)
             VALUES (?1, ?2, ?3)",
            params![trade_id, rule_id, honored as i64],
        )
        .map_err(query_err)?;

        Ok(())
    }

    fn fetch_rule_checks(&self, strategy_id: i64) -> Result<Vec<RuleCheck>, VeroTradeError> {
        let conn = self.pool.get().map_err(db_err)?;

        let mut stmt = conn
            .prepare(
                "SELECT ss.trade_id, ss.rule_id, ss.honored
                 FROM strategy_stats ss
                 JOIN strategy_rules sr ON sr.id = ss.rule_id
                 WHERE sr.strategy_id = ?1
                 ORDER BY ss.trade_id, ss.rule_id",
            )
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![strategy_id], |row| {
                Ok(RuleCheck {
                    trade_id: row.get(0)?,
                    rule_id: row.get(1)?,
                    honored: row.get::<_, i64>(2)? != 0,
                })
            })
            .map_err(query_err)?;

        let mut checks = Vec::new();
        for row in rows {
            checks.push(row.map_err(query_err)?);
        }

        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyConfig;

    impl ConfigPort for EmptyConfig {
        fn get_string(&self, _section: &str, _key: &str) -> Option<String> {
            None
        }
        fn get_int(&self, _section: &str, _key: &str, default: i64) -> i64 {
            default
        }
        fn get_double(&self, _section: &str, _key: &str, default: f64) -> f64 {
            default
        }
        fn get_bool(&self, _section: &str, _key: &str, default: bool) -> bool {
            default
        }
    }

    fn make_trade(symbol: &str, date: &str, pnl: f64, emotions: &[&str]) -> Trade {
        Trade {
            id: None,
            symbol: symbol.into(),
            side: Side::Buy,
            quantity: 100.0,
            entry_price: 10.0,
            exit_price: 10.0 + pnl / 100.0,
            pnl,
            trade_date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            emotions: emotions.iter().map(|e| e.to_string()).collect(),
            strategy_id: None,
            notes: String::new(),
        }
    }

    fn full_range() -> (NaiveDate, NaiveDate) {
        (
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2030, 12, 31).unwrap(),
        )
    }

    #[test]
    fn from_config_missing_path() {
        match SqliteAdapter::from_config(&EmptyConfig) {
            Err(VeroTradeError::ConfigMissing { section, key }) => {
                assert_eq!(section, "sqlite");
                assert_eq!(key, "path");
            }
            Err(other) => panic!("expected ConfigMissing, got: {other}"),
            Ok(_) => panic!("expected error, got Ok"),
        }
    }

    #[test]
    fn schema_initializes_in_memory() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();
    }

    #[test]
    fn trade_round_trip_with_emotions() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        let id = adapter
            .insert_trade(&make_trade("BHP", "2024-01-15", 150.0, &["TILT", "fomo"]))
            .unwrap();
        assert!(id > 0);

        let (start, end) = full_range();
        let trades = adapter.fetch_trades(start, end).unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].id, Some(id));
        assert_eq!(trades[0].symbol, "BHP");
        assert_eq!(trades[0].emotions, vec!["TILT", "fomo"]);
        assert!((trades[0].pnl - 150.0).abs() < 1e-9);
    }

    #[test]
    fn fetch_trades_filters_by_date() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        adapter
            .insert_trade(&make_trade("BHP", "2024-01-15", 10.0, &[]))
            .unwrap();
        adapter
            .insert_trade(&make_trade("CBA", "2024-02-15", 20.0, &[]))
            .unwrap();

        let trades = adapter
            .fetch_trades(
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
            )
            .unwrap();
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].symbol, "CBA");
    }

    #[test]
    fn insert_trade_rejects_invalid() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        let mut bad = make_trade("BHP", "2024-01-15", 10.0, &[]);
        bad.quantity = -1.0;
        assert!(matches!(
            adapter.insert_trade(&bad),
            Err(VeroTradeError::InvalidTrade { .. })
        ));
    }

    #[test]
    fn list_symbols_dedupes_and_sorts() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        adapter
            .insert_trade(&make_trade("CBA", "2024-01-15", 10.0, &[]))
            .unwrap();
        adapter
            .insert_trade(&make_trade("BHP", "2024-01-16", 10.0, &[]))
            .unwrap();
        adapter
            .insert_trade(&make_trade("BHP", "2024-01-17", 10.0, &[]))
            .unwrap();

        assert_eq!(adapter.list_symbols().unwrap(), vec!["BHP", "CBA"]);
    }

    #[test]
    fn strategy_round_trip_with_rules() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        let strategy = Strategy {
            id: None,
            name: "Breakout".into(),
            description: "range breakouts".into(),
            rules: vec![
                StrategyRule {
                    id: None,
                    text: "close above resistance".into(),
                    required: true,
                },
                StrategyRule {
                    id: None,
                    text: "screenshot the setup".into(),
                    required: false,
                },
            ],
        };

        let id = adapter.insert_strategy(&strategy).unwrap();
        assert!(id > 0);

        let strategies = adapter.list_strategies().unwrap();
        assert_eq!(strategies.len(), 1);
        assert_eq!(strategies[0].name, "Breakout");
        assert_eq!(strategies[0].rules.len(), 2);
        assert!(strategies[0].rules[0].required);
        assert!(!strategies[0].rules[1].required);
    }

    #[test]
    fn rule_checks_round_trip() {
        let adapter = SqliteAdapter::in_memory().unwrap();
        adapter.initialize_schema().unwrap();

        let strategy_id = adapter
            .insert_strategy(&Strategy {
                id: None,
                name: "Breakout".into(),
                description: String::new(),
                rules: vec![StrategyRule {
                    id: None,
                    text: "close above resistance".into(),
                    required: true,
                }],
            })
            .unwrap();

        let rule_id = adapter.list_strategies().unwrap()[0].rules[0].id.unwrap();

        let mut trade = make_trade("BHP", "2024-01-15", 25.0, &[]);
        trade.strategy_id = Some(strategy_id);
        let trade_id = adapter.insert_trade(&trade).unwrap();

        adapter.record_rule_check(trade_id, rule_id, true).unwrap();
        // Re-recording replaces the previous answer.
        adapter.record_rule_check(trade_id, rule_id, false).unwrap();

        let checks = adapter.fetch_rule_checks(strategy_id).unwrap();
        assert_eq!(checks.len(), 1);
        assert_eq!(checks[0].trade_id, trade_id);
        assert_eq!(checks[0].rule_id, rule_id);
        assert!(!checks[0].honored);

        let strategy_trades = adapter.fetch_trades_for_strategy(strategy_id).unwrap();
        assert_eq!(strategy_trades.len(), 1);
        assert_eq!(strategy_trades[0].id, Some(trade_id));
    }
}
