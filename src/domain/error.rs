//! Domain error types.

/// Top-level error type for verotrade.
#[derive(Debug, thiserror::Error)]
pub enum VeroTradeError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid trade: {reason}")]
    InvalidTrade { reason: String },

    #[error("CSV import error on line {line}: {reason}")]
    CsvImport { line: usize, reason: String },

    #[error("no strategy with id {id}")]
    UnknownStrategy { id: i64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&VeroTradeError> for std::process::ExitCode {
    fn from(err: &VeroTradeError) -> Self {
        let code: u8 = match err {
            VeroTradeError::Io(_) => 1,
            VeroTradeError::ConfigParse { .. }
            | VeroTradeError::ConfigMissing { .. }
            | VeroTradeError::ConfigInvalid { .. } => 2,
            VeroTradeError::Database { .. } | VeroTradeError::DatabaseQuery { .. } => 3,
            VeroTradeError::InvalidTrade { .. } | VeroTradeError::CsvImport { .. } => 4,
            VeroTradeError::UnknownStrategy { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
