//! Web server adapter.
//!
//! Axum web server with an HTMX-friendly frontend for journaling trades and
//! viewing the dashboards. All journal routes sit behind the session login;
//! only `/login` and static assets are public.

mod auth;
pub mod chart_svg;
mod error;
mod handlers;
mod templates;

pub use auth::{AuthSession, Backend, Credentials, User};
pub use error::{status_from_error, WebError};
pub use handlers::*;
pub use templates::*;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use axum_login::{login_required, AuthManagerLayerBuilder};
use time::Duration;
use tower_http::services::ServeDir;
use tower_sessions::{cookie::Key, Expiry, MemoryStore, SessionManagerLayer};

use crate::domain::error::VeroTradeError;
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_port::JournalPort;

pub struct AppState {
    pub journal: Arc<dyn JournalPort + Send + Sync>,
    pub config: Arc<dyn ConfigPort + Send + Sync>,
}

pub fn build_router(state: AppState) -> Result<Router, VeroTradeError> {
    let config = Arc::clone(&state.config);

    let username =
        config
            .get_string("auth", "username")
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "auth".into(),
                key: "username".into(),
            })?;
    let password_hash =
        config
            .get_string("auth", "password_hash")
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "auth".into(),
                key: "password_hash".into(),
            })?;
    let secret_hex =
        config
            .get_string("auth", "session_secret")
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "auth".into(),
                key: "session_secret".into(),
            })?;

    let secret = hex::decode(secret_hex.trim()).map_err(|e| VeroTradeError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason: e.to_string(),
    })?;
    let key = Key::try_from(&secret[..]).map_err(|e| VeroTradeError::ConfigInvalid {
        section: "auth".into(),
        key: "session_secret".into(),
        reason: e.to_string(),
    })?;

    let session_lifetime = config.get_int("auth", "session_lifetime", 86_400);

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(Duration::seconds(session_lifetime)))
        .with_signed(key);

    let backend = Backend::new(username, password_hash);
    let auth_layer = AuthManagerLayerBuilder::new(backend, session_layer).build();

    let router = Router::new()
        .route("/", get(handlers::dashboard))
        .route(
            "/trades",
            get(handlers::trades).post(handlers::create_trade),
        )
        .route("/trades/new", get(handlers::trade_form))
        .route(
            "/strategies",
            get(handlers::strategies).post(handlers::create_strategy),
        )
        .route("/analytics", get(handlers::analytics))
        .route("/analytics/pnl-chart", get(handlers::pnl_chart_svg))
        .route(
            "/analytics/emotion-chart",
            get(handlers::emotion_chart_svg),
        )
        .route("/logout", post(handlers::logout))
        .route_layer(login_required!(Backend, login_url = "/login"))
        .route("/login", get(handlers::login_form).post(handlers::login))
        .nest_service("/static", ServeDir::new("static"))
        .fallback(handlers::not_found)
        .layer(auth_layer)
        .with_state(Arc::new(state));

    Ok(router)
}

fn is_htmx_request(headers: &axum::http::HeaderMap) -> bool {
    headers.get("HX-Request").is_some()
}
