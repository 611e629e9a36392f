//! Trading strategies, rule checklists, and compliance.

use crate::domain::trade::Trade;

/// One rule of a strategy checklist, e.g. "risk at most 1R per trade".
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRule {
    pub id: Option<i64>,
    pub text: String,
    /// Required rules count toward compliance; optional ones are reminders.
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Strategy {
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub rules: Vec<StrategyRule>,
}

/// A per-trade record of whether one rule was honored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleCheck {
    pub trade_id: i64,
    pub rule_id: i64,
    pub honored: bool,
}

impl Strategy {
    /// Share (0-1) of this strategy's required rules honored by a trade,
    /// given the rule ids the trader ticked off. A strategy without required
    /// rules is trivially complied with.
    pub fn compliance(&self, honored_rule_ids: &[i64]) -> f64 {
        let required: Vec<i64> = self
            .rules
            .iter()
            .filter(|r| r.required)
            .filter_map(|r| r.id)
            .collect();

        if required.is_empty() {
            return 1.0;
        }

        let honored = required
            .iter()
            .filter(|id| honored_rule_ids.contains(id))
            .count();

        honored as f64 / required.len() as f64
    }
}

/// Aggregated per-strategy statistics, recomputed from journal rows.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyStats {
    pub strategy_id: i64,
    pub trades_taken: usize,
    pub wins: usize,
    pub total_pnl: f64,
    /// Mean per-trade compliance, 0-1.
    pub avg_compliance: f64,
}

impl StrategyStats {
    pub fn compute(strategy: &Strategy, trades: &[Trade], checks: &[RuleCheck]) -> Self {
        let strategy_id = strategy.id.unwrap_or_default();

        let mut wins = 0usize;
        let mut total_pnl = 0.0;
        let mut compliance_sum = 0.0;

        for trade in trades {
            if trade.is_win() {
                wins += 1;
            }
            total_pnl += trade.pnl;

            let honored: Vec<i64> = checks
                .iter()
                .filter(|c| Some(c.trade_id) == trade.id && c.honored)
                .map(|c| c.rule_id)
                .collect();
            compliance_sum += strategy.compliance(&honored);
        }

        let avg_compliance = if trades.is_empty() {
            0.0
        } else {
            compliance_sum / trades.len() as f64
        };

        StrategyStats {
            strategy_id,
            trades_taken: trades.len(),
            wins,
            total_pnl,
            avg_compliance,
        }
    }
}
