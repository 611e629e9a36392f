//! V-Rating: weighted composite journal score.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::journal_stats::JournalStats;
use crate::domain::stability::StabilityScore;
use crate::domain::trade::Trade;

const WEIGHT_PROFITABILITY: f64 = 0.25;
const WEIGHT_RISK: f64 = 0.20;
const WEIGHT_CONSISTENCY: f64 = 0.20;
const WEIGHT_EMOTIONAL: f64 = 0.20;
const WEIGHT_JOURNALING: f64 = 0.15;

/// Profit factor at or above this caps the risk-management sub-score.
const RISK_FULL_MARKS_PF: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VRating {
    pub profitability: f64,
    pub risk_management: f64,
    pub consistency: f64,
    pub emotional_discipline: f64,
    pub journaling: f64,
    pub overall: f64,
}

impl VRating {
    pub const NEUTRAL: VRating = VRating {
        profitability: 50.0,
        risk_management: 50.0,
        consistency: 50.0,
        emotional_discipline: 50.0,
        journaling: 50.0,
        overall: 50.0,
    };

    /// Compute the composite from precomputed stats and stability.
    ///
    /// The emotional-discipline component reads the stability index off the
    /// score; it never recomputes it from the discipline/tilt pair.
    pub fn compute(trades: &[Trade], stats: &JournalStats, stability: &StabilityScore) -> Self {
        if trades.is_empty() {
            return VRating::NEUTRAL;
        }

        let profitability = (stats.win_rate * 100.0).clamp(0.0, 100.0);

        let risk_management = if stats.profit_factor.is_infinite() {
            100.0
        } else {
            (stats.profit_factor / RISK_FULL_MARKS_PF * 100.0).clamp(0.0, 100.0)
        };

        let consistency = profitable_day_share(trades);

        let emotional_discipline = stability.stability_index;

        let journaled = trades
            .iter()
            .filter(|t| !t.emotions.is_empty() || !t.notes.trim().is_empty())
            .count();
        let journaling = journaled as f64 / trades.len() as f64 * 100.0;

        let overall = round2(
            profitability * WEIGHT_PROFITABILITY
                + risk_management * WEIGHT_RISK
                + consistency * WEIGHT_CONSISTENCY
                + emotional_discipline * WEIGHT_EMOTIONAL
                + journaling * WEIGHT_JOURNALING,
        );

        VRating {
            profitability: round2(profitability),
            risk_management: round2(risk_management),
            consistency: round2(consistency),
            emotional_discipline: round2(emotional_discipline),
            journaling: round2(journaling),
            overall,
        }
    }
}

/// Share of trading days that closed with positive aggregate P&L.
fn profitable_day_share(trades: &[Trade]) -> f64 {
    let mut daily: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for trade in trades {
        *daily.entry(trade.trade_date).or_insert(0.0) += trade.pnl;
    }
    if daily.is_empty() {
        return 0.0;
    }
    let profitable = daily.values().filter(|pnl| **pnl > 0.0).count();
    profitable as f64 / daily.len() as f64 * 100.0
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
