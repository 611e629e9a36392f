//! HTML templates using Askama.
//!
//! Handlers pre-digest domain values into display strings so templates stay
//! plain interpolation; every numeric display value is formatted here, and
//! the stability index is copied from the scored field, never re-derived.

use askama::Template;

use crate::domain::emotion::EmotionClass;
use crate::domain::emotion_score::EmotionBucket;
use crate::domain::journal_stats::JournalStats;
use crate::domain::rating::VRating;
use crate::domain::stability::StabilityScore;
use crate::domain::strategy::{Strategy, StrategyStats};
use crate::domain::trade::Trade;

pub struct StatsView {
    pub total_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakeven: usize,
    pub win_rate_pct: String,
    pub profit_factor: String,
    pub total_pnl: String,
    pub avg_win: String,
    pub avg_loss: String,
    pub expectancy: String,
}

pub fn stats_view(stats: &JournalStats) -> StatsView {
    StatsView {
        total_trades: stats.total_trades,
        wins: stats.wins,
        losses: stats.losses,
        breakeven: stats.breakeven,
        win_rate_pct: format!("{:.1}", stats.win_rate * 100.0),
        profit_factor: if stats.profit_factor.is_infinite() {
            "∞".to_string()
        } else {
            format!("{:.2}", stats.profit_factor)
        },
        total_pnl: format!("{:+.2}", stats.total_pnl),
        avg_win: format!("{:.2}", stats.avg_win),
        avg_loss: format!("{:.2}", stats.avg_loss),
        expectancy: format!("{:+.2}", stats.expectancy),
    }
}

pub struct StabilityView {
    pub discipline_level: String,
    pub tilt_control: String,
    pub stability_index: String,
}

pub fn stability_view(score: &StabilityScore) -> StabilityView {
    StabilityView {
        discipline_level: format!("{:.2}", score.discipline_level),
        tilt_control: format!("{:.2}", score.tilt_control),
        stability_index: format!("{:.2}", score.stability_index),
    }
}

pub struct RatingView {
    pub profitability: String,
    pub risk_management: String,
    pub consistency: String,
    pub emotional_discipline: String,
    pub journaling: String,
    pub overall: String,
}

pub fn rating_view(rating: &VRating) -> RatingView {
    RatingView {
        profitability: format!("{:.1}", rating.profitability),
        risk_management: format!("{:.1}", rating.risk_management),
        consistency: format!("{:.1}", rating.consistency),
        emotional_discipline: format!("{:.1}", rating.emotional_discipline),
        journaling: format!("{:.1}", rating.journaling),
        overall: format!("{:.1}", rating.overall),
    }
}

pub struct TradeRow {
    pub date: String,
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub entry_price: String,
    pub exit_price: String,
    pub pnl: String,
    pub emotions: String,
    pub notes: String,
}

pub fn trade_rows<'a, I: IntoIterator<Item = &'a Trade>>(trades: I) -> Vec<TradeRow> {
    trades
        .into_iter()
        .map(|trade| TradeRow {
            date: trade.trade_date.format("%Y-%m-%d").to_string(),
            symbol: trade.symbol.clone(),
            side: trade.side.as_str().to_string(),
            quantity: format!("{:.0}", trade.quantity),
            entry_price: format!("{:.2}", trade.entry_price),
            exit_price: format!("{:.2}", trade.exit_price),
            pnl: format!("{:+.2}", trade.pnl),
            emotions: trade.emotions.join(", "),
            notes: trade.notes.clone(),
        })
        .collect()
}

pub struct BucketRow {
    pub tag: String,
    pub class_label: String,
    pub count: usize,
    pub share_pct: String,
    pub trade_count: usize,
}

pub fn bucket_rows(distribution: &[EmotionBucket]) -> Vec<BucketRow> {
    distribution
        .iter()
        .map(|bucket| BucketRow {
            tag: bucket.tag.clone(),
            class_label: match bucket.known.map(|t| t.class()) {
                Some(EmotionClass::Positive) => "positive".to_string(),
                Some(EmotionClass::Negative) => "negative".to_string(),
                Some(EmotionClass::Neutral) => "neutral".to_string(),
                None => "unknown".to_string(),
            },
            count: bucket.count,
            share_pct: format!("{:.1}", bucket.share_pct),
            trade_count: bucket.trade_count,
        })
        .collect()
}

pub struct RuleRow {
    pub text: String,
    pub required: bool,
}

pub struct StrategyRow {
    pub name: String,
    pub description: String,
    pub rules: Vec<RuleRow>,
    pub trades_taken: usize,
    pub wins: usize,
    pub total_pnl: String,
    pub avg_compliance_pct: String,
}

pub fn strategy_row(strategy: &Strategy, stats: &StrategyStats) -> StrategyRow {
    StrategyRow {
        name: strategy.name.clone(),
        description: strategy.description.clone(),
        rules: strategy
            .rules
            .iter()
            .map(|rule| RuleRow {
                text: rule.text.clone(),
                required: rule.required,
            })
            .collect(),
        trades_taken: stats.trades_taken,
        wins: stats.wins,
        total_pnl: format!("{:+.2}", stats.total_pnl),
        avg_compliance_pct: format!("{:.0}", stats.avg_compliance * 100.0),
    }
}

pub struct StrategyOption {
    pub id: i64,
    pub name: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub error_message: String,
    pub next: String,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub stats: StatsView,
    pub stability: StabilityView,
    pub rating: RatingView,
    pub recent_trades: Vec<TradeRow>,
}

impl DashboardTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Dashboard</h1>");
        html.push_str(&format!(
            "<p>{} trades, win rate {}%, total P&amp;L {}</p>",
            self.stats.total_trades, self.stats.win_rate_pct, self.stats.total_pnl
        ));
        html.push_str(&format!(
            "<p>Stability index {} (discipline {}, tilt control {})</p>",
            self.stability.stability_index,
            self.stability.discipline_level,
            self.stability.tilt_control
        ));
        html.push_str(&format!("<p>V-Rating {}</p>", self.rating.overall));
        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "trades.html")]
pub struct TradesTemplate {
    pub trades: Vec<TradeRow>,
}

impl TradesTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Trades</h1><table>");
        html.push_str(
            "<tr><th>Date</th><th>Symbol</th><th>Side</th><th>Qty</th><th>PnL</th><th>Emotions</th></tr>",
        );
        for trade in &self.trades {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                trade.date, trade.symbol, trade.side, trade.quantity, trade.pnl, trade.emotions
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "trade_form.html")]
pub struct TradeFormTemplate {
    pub tags: Vec<String>,
    pub strategies: Vec<StrategyOption>,
    pub default_date: String,
}

impl TradeFormTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>New Trade</h1>");
        html.push_str("<form method=\"post\" action=\"/trades\">");
        html.push_str("<label>Symbol: <input name=\"symbol\"></label><br>");
        html.push_str(&format!(
            "<label>Date: <input type=\"date\" name=\"trade_date\" value=\"{}\"></label><br>",
            self.default_date
        ));
        html.push_str(&format!(
            "<label>Emotions: <input name=\"emotions\" placeholder=\"{}\"></label><br>",
            self.tags.join(",")
        ));
        html.push_str("<button type=\"submit\">Save</button></form></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "strategies.html")]
pub struct StrategiesTemplate {
    pub strategies: Vec<StrategyRow>,
}

impl StrategiesTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Strategies</h1>");
        for strategy in &self.strategies {
            html.push_str(&format!(
                "<p><strong>{}</strong>: {} trades, {} wins, compliance {}%</p>",
                strategy.name, strategy.trades_taken, strategy.wins, strategy.avg_compliance_pct
            ));
        }
        html.push_str("</div>");
        html
    }
}

#[derive(Template)]
#[template(path = "analytics.html")]
pub struct AnalyticsTemplate {
    pub buckets: Vec<BucketRow>,
    pub stability: StabilityView,
    pub rating: RatingView,
    pub pnl_svg: String,
    pub emotion_svg: String,
}

impl AnalyticsTemplate {
    pub fn fragment(&self) -> String {
        let mut html = String::from("<div id=\"content\"><h1>Analytics</h1>");
        html.push_str(&format!(
            "<p>Stability index {}</p>",
            self.stability.stability_index
        ));
        html.push_str("<table><tr><th>Tag</th><th>Count</th><th>Share</th></tr>");
        for bucket in &self.buckets {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}%</td></tr>",
                bucket.tag, bucket.count, bucket.share_pct
            ));
        }
        html.push_str("</table></div>");
        html
    }
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate {
    pub message: String,
    pub status: u16,
}

impl ErrorTemplate {
    pub fn fragment(&self) -> String {
        format!(
            "<div id=\"error\" class=\"error\"><h1>Error {}</h1><p>{}</p></div>",
            self.status, self.message
        )
    }
}
