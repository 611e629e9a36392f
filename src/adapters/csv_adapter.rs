//! CSV journal import/export.
//!
//! Column layout: `date,symbol,side,quantity,entry_price,exit_price,pnl,emotions,notes`
//! with emotion tags pipe-separated inside one field.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::domain::error::VeroTradeError;
use crate::domain::trade::{Side, Trade};

const HEADER: [&str; 9] = [
    "date",
    "symbol",
    "side",
    "quantity",
    "entry_price",
    "exit_price",
    "pnl",
    "emotions",
    "notes",
];

pub fn import_trades<P: AsRef<Path>>(path: P) -> Result<Vec<Trade>, VeroTradeError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| VeroTradeError::Database {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    parse_trades(&content)
}

pub fn parse_trades(content: &str) -> Result<Vec<Trade>, VeroTradeError> {
    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let mut trades = Vec::new();

    for (index, result) in rdr.records().enumerate() {
        // Header occupies line 1.
        let line = index + 2;

        let record = result.map_err(|e| VeroTradeError::CsvImport {
            line,
            reason: e.to_string(),
        })?;

        let field = |column: usize| -> Result<&str, VeroTradeError> {
            record.get(column).ok_or_else(|| VeroTradeError::CsvImport {
                line,
                reason: format!("missing {} column", HEADER[column]),
            })
        };

        let trade_date =
            NaiveDate::parse_from_str(field(0)?, "%Y-%m-%d").map_err(|e| {
                VeroTradeError::CsvImport {
                    line,
                    reason: format!("invalid date: {e}"),
                }
            })?;

        let symbol = field(1)?.trim().to_uppercase();

        let side = Side::parse(field(2)?).ok_or_else(|| VeroTradeError::CsvImport {
            line,
            reason: format!("invalid side: {}", record.get(2).unwrap_or_default()),
        })?;

        let parse_f64 = |column: usize| -> Result<f64, VeroTradeError> {
            field(column)?
                .trim()
                .parse()
                .map_err(|e| VeroTradeError::CsvImport {
                    line,
                    reason: format!("invalid {} value: {}", HEADER[column], e),
                })
        };

        let quantity = parse_f64(3)?;
        let entry_price = parse_f64(4)?;
        let exit_price = parse_f64(5)?;
        let pnl = parse_f64(6)?;

        let emotions: Vec<String> = record
            .get(7)
            .unwrap_or_default()
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect();

        let notes = record.get(8).unwrap_or_default().to_string();

        let trade = Trade {
            id: None,
            symbol,
            side,
            quantity,
            entry_price,
            exit_price,
            pnl,
            trade_date,
            emotions,
            strategy_id: None,
            notes,
        };
        trade
            .validate()
            .map_err(|e| VeroTradeError::CsvImport {
                line,
                reason: e.to_string(),
            })?;
        trades.push(trade);
    }

    trades.sort_by_key(|t| t.trade_date);
    Ok(trades)
}

pub fn export_trades<P: AsRef<Path>>(path: P, trades: &[Trade]) -> Result<(), VeroTradeError> {
    let mut wtr = csv::Writer::from_path(path.as_ref()).map_err(|e| VeroTradeError::Database {
        reason: format!("failed to open {}: {}", path.as_ref().display(), e),
    })?;

    wtr.write_record(HEADER)
        .map_err(|e| VeroTradeError::Database {
            reason: format!("CSV write error: {e}"),
        })?;

    for trade in trades {
        wtr.write_record([
            trade.trade_date.format("%Y-%m-%d").to_string(),
            trade.symbol.clone(),
            trade.side.as_str().to_string(),
            trade.quantity.to_string(),
            trade.entry_price.to_string(),
            trade.exit_price.to_string(),
            trade.pnl.to_string(),
            trade.emotions.join("|"),
            trade.notes.clone(),
        ])
        .map_err(|e| VeroTradeError::Database {
            reason: format!("CSV write error: {e}"),
        })?;
    }

    wtr.flush().map_err(|e| VeroTradeError::Database {
        reason: format!("CSV write error: {e}"),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
date,symbol,side,quantity,entry_price,exit_price,pnl,emotions,notes
2024-01-16,CBA,sell,50,110.0,108.5,-75.0,TILT|revenge,chased the bounce
2024-01-15,BHP,buy,100,42.5,44.0,150.0,DISCIPLINE,clean breakout
2024-01-17,RIO,buy,25,120.0,120.0,0.0,,
";

    #[test]
    fn parse_reads_rows_and_sorts_by_date() {
        let trades = parse_trades(SAMPLE).unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].symbol, "BHP");
        assert_eq!(trades[1].symbol, "CBA");
        assert_eq!(trades[2].symbol, "RIO");
    }

    #[test]
    fn parse_splits_emotions_on_pipe() {
        let trades = parse_trades(SAMPLE).unwrap();
        let cba = trades.iter().find(|t| t.symbol == "CBA").unwrap();
        assert_eq!(cba.emotions, vec!["TILT", "revenge"]);

        let rio = trades.iter().find(|t| t.symbol == "RIO").unwrap();
        assert!(rio.emotions.is_empty());
    }

    #[test]
    fn parse_reports_line_numbers_on_errors() {
        let bad = "\
date,symbol,side,quantity,entry_price,exit_price,pnl,emotions,notes
2024-01-15,BHP,buy,100,42.5,44.0,150.0,,
2024-01-16,CBA,hold,50,110.0,108.5,-75.0,,
";
        match parse_trades(bad) {
            Err(VeroTradeError::CsvImport { line, reason }) => {
                assert_eq!(line, 3);
                assert!(reason.contains("side"), "unexpected reason: {reason}");
            }
            other => panic!("expected CsvImport error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_invalid_quantity() {
        let bad = "\
date,symbol,side,quantity,entry_price,exit_price,pnl,emotions,notes
2024-01-15,BHP,buy,-5,42.5,44.0,150.0,,
";
        assert!(matches!(
            parse_trades(bad),
            Err(VeroTradeError::CsvImport { line: 2, .. })
        ));
    }

    #[test]
    fn export_then_import_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("journal.csv");

        let trades = parse_trades(SAMPLE).unwrap();
        export_trades(&path, &trades).unwrap();
        let reread = import_trades(&path).unwrap();

        assert_eq!(reread.len(), trades.len());
        assert_eq!(reread[0].symbol, trades[0].symbol);
        assert_eq!(reread[0].emotions, trades[0].emotions);
        assert_eq!(reread[2].notes, trades[2].notes);
    }

    #[test]
    fn import_missing_file_errors() {
        assert!(import_trades("/nonexistent/journal.csv").is_err());
    }
}
