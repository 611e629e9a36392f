//! HTTP request handlers for the web adapter.

use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use chrono::NaiveDate;
use std::sync::Arc;

use crate::domain::emotion::EmotionTag;
use crate::domain::emotion_score::aggregate;
use crate::domain::journal_stats::JournalStats;
use crate::domain::rating::VRating;
use crate::domain::stability;
use crate::domain::strategy::{Strategy, StrategyRule, StrategyStats};
use crate::domain::trade::{Side, Trade};

use super::auth::{AuthSession, Credentials};
use super::templates::{self, StrategyOption};
use super::{chart_svg, is_htmx_request, AppState, WebError};

/// Journal queries span the whole journal; the range exists because the
/// port filters by trade date.
fn journal_range() -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(1970, 1, 1).expect("valid date"),
        NaiveDate::from_ymd_opt(2100, 12, 31).expect("valid date"),
    )
}

fn render_page<T: Template>(template: &T) -> Result<Response, WebError> {
    let html = template
        .render()
        .map_err(|e| WebError::internal(e.to_string()))?;
    Ok(Html(html).into_response())
}

fn fetch_all_trades(state: &AppState) -> Result<Vec<Trade>, WebError> {
    let (start, end) = journal_range();
    Ok(state.journal.fetch_trades(start, end)?)
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let trades = fetch_all_trades(&state)?;
    let stats = JournalStats::compute(&trades);
    let distribution = aggregate(&trades);
    let score = stability::score(&distribution);
    let rating = VRating::compute(&trades, &stats, &score);

    let recent: Vec<&Trade> = trades.iter().rev().take(10).collect();

    let template = templates::DashboardTemplate {
        stats: templates::stats_view(&stats),
        stability: templates::stability_view(&score),
        rating: templates::rating_view(&rating),
        recent_trades: templates::trade_rows(recent),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_page(&template)
    }
}

pub async fn trades(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let trades = fetch_all_trades(&state)?;

    let template = templates::TradesTemplate {
        trades: templates::trade_rows(trades.iter().rev()),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_page(&template)
    }
}

pub async fn trade_form(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let strategies = state
        .journal
        .list_strategies()?
        .into_iter()
        .filter_map(|s| {
            s.id.map(|id| StrategyOption {
                id,
                name: s.name,
            })
        })
        .collect();

    let template = templates::TradeFormTemplate {
        tags: EmotionTag::ALL.iter().map(|t| t.to_string()).collect(),
        strategies,
        default_date: String::new(),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_page(&template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct TradeFormData {
    pub symbol: String,
    pub side: String,
    pub quantity: String,
    pub entry_price: String,
    pub exit_price: String,
    pub pnl: String,
    pub trade_date: String,
    pub emotions: String,
    pub strategy_id: String,
    pub honored_rules: String,
    pub notes: String,
}

pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    Form(form): Form<TradeFormData>,
) -> Result<Response, WebError> {
    let trade_date = NaiveDate::parse_from_str(&form.trade_date, "%Y-%m-%d")
        .map_err(|_| WebError::bad_request("Invalid trade date format"))?;

    let side = Side::parse(&form.side)
        .ok_or_else(|| WebError::bad_request("Side must be buy or sell"))?;

    let quantity: f64 = form
        .quantity
        .parse()
        .map_err(|_| WebError::bad_request("Invalid quantity"))?;
    let entry_price: f64 = form
        .entry_price
        .parse()
        .map_err(|_| WebError::bad_request("Invalid entry price"))?;
    let exit_price: f64 = form
        .exit_price
        .parse()
        .map_err(|_| WebError::bad_request("Invalid exit price"))?;

    // Blank P&L is derived from the fill prices.
    let pnl: f64 = if form.pnl.trim().is_empty() {
        match side {
            Side::Buy => (exit_price - entry_price) * quantity,
            Side::Sell => (entry_price - exit_price) * quantity,
        }
    } else {
        form.pnl
            .parse()
            .map_err(|_| WebError::bad_request("Invalid P&L"))?
    };

    let strategy_id: Option<i64> = if form.strategy_id.trim().is_empty() {
        None
    } else {
        Some(
            form.strategy_id
                .trim()
                .parse()
                .map_err(|_| WebError::bad_request("Invalid strategy"))?,
        )
    };

    let emotions: Vec<String> = form
        .emotions
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect();

    if let Some(id) = strategy_id {
        let known = state
            .journal
            .list_strategies()?
            .iter()
            .any(|s| s.id == Some(id));
        if !known {
            return Err(crate::domain::error::VeroTradeError::UnknownStrategy { id }.into());
        }
    }

    let trade = Trade {
        id: None,
        symbol: form.symbol.trim().to_uppercase(),
        side,
        quantity,
        entry_price,
        exit_price,
        pnl,
        trade_date,
        emotions,
        strategy_id,
        notes: form.notes.trim().to_string(),
    };

    let trade_id = state.journal.insert_trade(&trade)?;

    // Checklist answers only make sense when the trade names a strategy.
    if strategy_id.is_some() {
        for raw in form.honored_rules.split(',') {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            let rule_id: i64 = raw
                .parse()
                .map_err(|_| WebError::bad_request("Invalid rule id"))?;
            state.journal.record_rule_check(trade_id, rule_id, true)?;
        }
    }

    Ok(Redirect::to("/trades").into_response())
}

pub async fn strategies(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let strategies = state.journal.list_strategies()?;

    let mut rows = Vec::with_capacity(strategies.len());
    for strategy in &strategies {
        let Some(id) = strategy.id else { continue };
        let trades = state.journal.fetch_trades_for_strategy(id)?;
        let checks = state.journal.fetch_rule_checks(id)?;
        let stats = StrategyStats::compute(strategy, &trades, &checks);
        rows.push(templates::strategy_row(strategy, &stats));
    }

    let template = templates::StrategiesTemplate { strategies: rows };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_page(&template)
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct StrategyFormData {
    pub name: String,
    pub description: String,
    /// One rule per line; a leading `?` marks the rule optional.
    pub rules: String,
}

pub async fn create_strategy(
    State(state): State<Arc<AppState>>,
    Form(form): Form<StrategyFormData>,
) -> Result<Response, WebError> {
    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Err(WebError::bad_request("Strategy name must not be empty"));
    }

    let rules: Vec<StrategyRule> = form
        .rules
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('?') {
            Some(rest) => StrategyRule {
                id: None,
                text: rest.trim().to_string(),
                required: false,
            },
            None => StrategyRule {
                id: None,
                text: line.to_string(),
                required: true,
            },
        })
        .collect();

    let strategy = Strategy {
        id: None,
        name,
        description: form.description.trim().to_string(),
        rules,
    };

    state.journal.insert_strategy(&strategy)?;

    Ok(Redirect::to("/strategies").into_response())
}

pub async fn analytics(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, WebError> {
    let trades = fetch_all_trades(&state)?;
    let stats = JournalStats::compute(&trades);
    let distribution = aggregate(&trades);
    let score = stability::score(&distribution);
    let rating = VRating::compute(&trades, &stats, &score);

    let template = templates::AnalyticsTemplate {
        buckets: templates::bucket_rows(&distribution),
        stability: templates::stability_view(&score),
        rating: templates::rating_view(&rating),
        pnl_svg: chart_svg::pnl_curve_svg(&stats.pnl_curve),
        emotion_svg: chart_svg::emotion_distribution_svg(&distribution),
    };

    if is_htmx_request(&headers) {
        Ok(Html(template.fragment()).into_response())
    } else {
        render_page(&template)
    }
}

pub async fn pnl_chart_svg(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let trades = fetch_all_trades(&state)?;
    let stats = JournalStats::compute(&trades);
    let svg = chart_svg::pnl_curve_svg(&stats.pnl_curve);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

pub async fn emotion_chart_svg(State(state): State<Arc<AppState>>) -> Result<Response, WebError> {
    let trades = fetch_all_trades(&state)?;
    let distribution = aggregate(&trades);
    let svg = chart_svg::emotion_distribution_svg(&distribution);
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response())
}

#[derive(Debug, serde::Deserialize)]
pub struct NextParams {
    pub next: Option<String>,
}

pub async fn login_form(Query(params): Query<NextParams>) -> Result<Response, WebError> {
    let template = templates::LoginTemplate {
        error_message: String::new(),
        next: params.next.unwrap_or_default(),
    };
    render_page(&template)
}

pub async fn login(
    mut auth_session: AuthSession,
    Form(creds): Form<Credentials>,
) -> Result<Response, WebError> {
    let user = match auth_session.authenticate(creds.clone()).await {
        Ok(Some(user)) => user,
        _ => {
            let template = templates::LoginTemplate {
                error_message: "Invalid username or password".to_string(),
                next: creds.next.unwrap_or_default(),
            };
            return render_page(&template);
        }
    };

    if auth_session.login(&user).await.is_err() {
        return Err(WebError::internal("failed to create session"));
    }

    let dest = match creds.next.as_deref() {
        Some(next) if !next.is_empty() => next,
        _ => "/",
    };
    Ok(Redirect::to(dest).into_response())
}

pub async fn logout(mut auth_session: AuthSession) -> Result<Response, WebError> {
    if auth_session.logout().await.is_err() {
        return Err(WebError::internal("failed to destroy session"));
    }
    Ok(Redirect::to("/login").into_response())
}

pub async fn not_found() -> Response {
    WebError::not_found("page not found").into_response()
}
