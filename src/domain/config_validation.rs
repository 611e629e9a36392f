//! Configuration validation.
//!
//! Validates config fields up front so the CLI and the web server fail
//! with a config error instead of a mid-request surprise.

use crate::domain::error::VeroTradeError;
use crate::ports::config_port::ConfigPort;

/// Minimum decoded length of the session-cookie signing secret.
const SESSION_SECRET_BYTES: usize = 64;

pub fn validate_database_config(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    let has_sqlite = config.get_string("sqlite", "path").is_some();
    let has_postgres = config
        .get_string("postgres", "connection_string")
        .or_else(|| config.get_string("database", "conninfo"))
        .is_some();

    if !has_sqlite && !has_postgres {
        return Err(VeroTradeError::ConfigMissing {
            section: "sqlite".to_string(),
            key: "path".to_string(),
        });
    }

    let pool_size = config.get_int("sqlite", "pool_size", 4);
    if pool_size <= 0 {
        return Err(VeroTradeError::ConfigInvalid {
            section: "sqlite".to_string(),
            key: "pool_size".to_string(),
            reason: "pool_size must be positive".to_string(),
        });
    }

    Ok(())
}

pub fn validate_web_config(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    validate_listen(config)?;
    validate_auth_user(config)?;
    validate_session_secret(config)?;
    validate_session_lifetime(config)?;
    Ok(())
}

fn validate_listen(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    if let Some(listen) = config.get_string("web", "listen") {
        if listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(VeroTradeError::ConfigInvalid {
                section: "web".to_string(),
                key: "listen".to_string(),
                reason: "listen must be a host:port socket address".to_string(),
            });
        }
    }
    Ok(())
}

fn validate_auth_user(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    let username = config
        .get_string("auth", "username")
        .ok_or_else(|| VeroTradeError::ConfigMissing {
            section: "auth".to_string(),
            key: "username".to_string(),
        })?;
    if username.trim().is_empty() {
        return Err(VeroTradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "username".to_string(),
            reason: "username must not be empty".to_string(),
        });
    }

    let password_hash =
        config
            .get_string("auth", "password_hash")
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "auth".to_string(),
                key: "password_hash".to_string(),
            })?;
    if !password_hash.starts_with("$argon2") {
        return Err(VeroTradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "password_hash".to_string(),
            reason: "password_hash must be an argon2 PHC string (use hash-password)".to_string(),
        });
    }

    Ok(())
}

fn validate_session_secret(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    let secret =
        config
            .get_string("auth", "session_secret")
            .ok_or_else(|| VeroTradeError::ConfigMissing {
                section: "auth".to_string(),
                key: "session_secret".to_string(),
            })?;

    let decoded_len = if secret.len() % 2 == 0
        && secret.chars().all(|c| c.is_ascii_hexdigit())
    {
        secret.len() / 2
    } else {
        return Err(VeroTradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_secret".to_string(),
            reason: "session_secret must be a hex string".to_string(),
        });
    };

    if decoded_len < SESSION_SECRET_BYTES {
        return Err(VeroTradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_secret".to_string(),
            reason: format!("session_secret must decode to at least {SESSION_SECRET_BYTES} bytes"),
        });
    }

    Ok(())
}

fn validate_session_lifetime(config: &dyn ConfigPort) -> Result<(), VeroTradeError> {
    let lifetime = config.get_int("auth", "session_lifetime", 86_400);
    if lifetime <= 0 {
        return Err(VeroTradeError::ConfigInvalid {
            section: "auth".to_string(),
            key: "session_lifetime".to_string(),
            reason: "session_lifetime must be positive seconds".to_string(),
        });
    }
    Ok(())
}
