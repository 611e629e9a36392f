//! HTTP error responses for the web adapter.

use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::domain::error::VeroTradeError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl From<VeroTradeError> for WebError {
    fn from(err: VeroTradeError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

pub fn status_from_error(err: &VeroTradeError) -> StatusCode {
    match err {
        VeroTradeError::ConfigMissing { .. }
        | VeroTradeError::ConfigInvalid { .. }
        | VeroTradeError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
        VeroTradeError::InvalidTrade { .. } | VeroTradeError::CsvImport { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        VeroTradeError::UnknownStrategy { .. } => StatusCode::NOT_FOUND,
        VeroTradeError::Database { .. }
        | VeroTradeError::DatabaseQuery { .. }
        | VeroTradeError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let template = super::templates::ErrorTemplate {
            message: self.message.clone(),
            status: self.status.as_u16(),
        };
        match template.render() {
            Ok(html) => (self.status, Html(html)).into_response(),
            Err(_) => (self.status, self.message).into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_from_error(&VeroTradeError::ConfigMissing {
                section: "auth".into(),
                key: "username".into()
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_from_error(&VeroTradeError::InvalidTrade {
                reason: "bad".into()
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_from_error(&VeroTradeError::UnknownStrategy { id: 9 }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_from_error(&VeroTradeError::Database {
                reason: "down".into()
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
