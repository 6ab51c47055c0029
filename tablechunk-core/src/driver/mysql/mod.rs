//! MySQL driver backed by a single `sqlx` connection.
//!
//! # Module Structure
//! - `session`: the shared connection, its cursors and their lifecycle
//! - `values`: MySQL value to JSON conversion
//!
//! Statements go over the text protocol exactly as written; nothing is
//! prepared or parameterized.

mod session;
mod values;

pub use session::{MySqlCursor, MySqlSession};

use super::{Connection, Driver};
use crate::error::TableChunkError;
use crate::{Credentials, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};

/// Opens `sqlx` MySQL connections.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDriver;

impl MySqlDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Driver for MySqlDriver {
    async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn Connection>> {
        let options = connect_options(credentials)?;
        tracing::debug!("Connecting to {}", credentials);
        let session = MySqlSession::connect(&options).await?;
        Ok(Box::new(session))
    }
}

/// Builds `sqlx` connect options from a credential record.
///
/// Recognized extra options: `port`, `socket`/`unix_socket`, `charset`,
/// `collation`, `ssl_mode`, `ssl_ca`, `statement_cache_capacity`. Anything
/// else is logged and ignored.
///
/// # Errors
/// Returns a configuration error when a recognized option has a value of the
/// wrong type.
pub fn connect_options(credentials: &Credentials) -> Result<MySqlConnectOptions> {
    let mut options = MySqlConnectOptions::new()
        .host(&credentials.host)
        .username(&credentials.user)
        .password(&credentials.password)
        .database(&credentials.database);

    for (key, value) in &credentials.extra {
        options = match key.as_str() {
            "port" => options.port(option_number(key, value)?),
            "socket" | "unix_socket" => options.socket(option_str(key, value)?),
            "charset" => options.charset(option_str(key, value)?),
            "collation" => options.collation(option_str(key, value)?),
            "ssl_mode" => {
                let raw = option_str(key, value)?;
                let mode = raw.parse::<MySqlSslMode>().map_err(|_| {
                    TableChunkError::configuration(format!("Unknown ssl_mode '{}'", raw))
                })?;
                options.ssl_mode(mode)
            }
            "ssl_ca" => options.ssl_ca(option_str(key, value)?),
            "statement_cache_capacity" => {
                options.statement_cache_capacity(option_number(key, value)?)
            }
            _ => {
                tracing::warn!("Ignoring unsupported driver option '{}'", key);
                options
            }
        };
    }

    Ok(options)
}

fn option_str<'a>(key: &str, value: &'a JsonValue) -> Result<&'a str> {
    value.as_str().ok_or_else(|| {
        TableChunkError::configuration(format!("Driver option '{}' must be a string", key))
    })
}

/// Accepts JSON numbers and numeric strings.
fn option_number<T>(key: &str, value: &JsonValue) -> Result<T>
where
    T: TryFrom<u64> + std::str::FromStr,
{
    let parsed = match value {
        JsonValue::Number(n) => n.as_u64().and_then(|n| T::try_from(n).ok()),
        JsonValue::String(s) => s.trim().parse::<T>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        TableChunkError::configuration(format!(
            "Driver option '{}' must be a non-negative integer in range",
            key
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_number_accepts_numbers_and_strings() {
        assert_eq!(option_number::<u16>("port", &json!(3307)).unwrap(), 3307);
        assert_eq!(option_number::<u16>("port", &json!("3308")).unwrap(), 3308);
        assert!(option_number::<u16>("port", &json!(70000)).is_err());
        assert!(option_number::<u16>("port", &json!(true)).is_err());
    }

    #[test]
    fn test_connect_options_apply_extras() {
        let creds = Credentials::new("u", "p", "db.internal", "sales")
            .with_extra("port", 3307)
            .with_extra("charset", "utf8mb4")
            .with_extra("ssl_mode", "disabled")
            .with_extra("autocommit", true);

        let options = connect_options(&creds).unwrap();
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_username(), "u");
        assert_eq!(options.get_database(), Some("sales"));
    }

    #[test]
    fn test_connect_options_reject_bad_values() {
        let creds = Credentials::new("u", "p", "h", "d").with_extra("port", "not-a-port");
        assert!(connect_options(&creds).is_err());

        let creds = Credentials::new("u", "p", "h", "d").with_extra("ssl_mode", "sometimes");
        assert!(connect_options(&creds).is_err());

        let creds = Credentials::new("u", "p", "h", "d").with_extra("charset", 8);
        assert!(connect_options(&creds).is_err());
    }
}
