//! Journal performance statistics.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::trade::Trade;

/// One point of the cumulative P&L curve, aggregated per trade date.
#[derive(Debug, Clone, PartialEq)]
pub struct PnlPoint {
    pub date: NaiveDate,
    pub cumulative_pnl: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JournalStats {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub expectancy: f64,
    pub pnl_curve: Vec<PnlPoint>,
}

impl JournalStats {
    pub fn compute(trades: &[Trade]) -> Self {
        let mut wins = 0usize;
        let mut losses = 0usize;
        let mut breakeven = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut daily_pnl: BTreeMap<NaiveDate, f64> = BTreeMap::new();

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                wins += 1;
                total_wins += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                losses += 1;
                total_losses += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            } else {
                breakeven += 1;
            }

            *daily_pnl.entry(trade.trade_date).or_insert(0.0) += pnl;
        }

        let total_trades = trades.len();
        let win_rate = if total_trades > 0 {
            wins as f64 / total_trades as f64
        } else {
            0.0
        };

        let profit_factor = if total_losses > 0.0 {
            total_wins / total_losses
        } else if total_wins > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_win = if wins > 0 {
            total_wins / wins as f64
        } else {
            0.0
        };

        let avg_loss = if losses > 0 {
            total_losses / losses as f64
        } else {
            0.0
        };

        let expectancy = win_rate * avg_win - (1.0 - win_rate) * avg_loss;

        let mut cumulative = 0.0;
        let pnl_curve = daily_pnl
            .into_iter()
            .map(|(date, pnl)| {
                cumulative += pnl;
                PnlPoint {
                    date,
                    cumulative_pnl: cumulative,
                }
            })
            .collect();

        JournalStats {
            total_trades,
            wins,
            losses,
            breakeven,
            win_rate,
            profit_factor,
            total_pnl: total_wins - total_losses,
            avg_win,
            avg_loss,
            largest_win,
            largest_loss,
            expectancy,
            pnl_curve,
        }
    }
}
