//! Server configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_CHAT_REPLY_DELAY_MS: u64 = 700;
pub const DEFAULT_CHAT_SESSION_TTL_SECS: u64 = 3600;
pub const DEFAULT_CHAT_SESSION_SWEEP_SECS: u64 = 60;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var}: {value:?} ({reason})")]
    Invalid { var: &'static str, value: String, reason: &'static str },
    #[error("STORE_BACKEND=postgres requires DATABASE_URL")]
    MissingDatabaseUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String, max_connections: u32 },
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub reply_delay: Duration,
    pub responses_path: Option<PathBuf>,
    pub session_ttl: Duration,
    pub sweep_interval: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            reply_delay: Duration::from_millis(DEFAULT_CHAT_REPLY_DELAY_MS),
            responses_path: None,
            session_ttl: Duration::from_secs(DEFAULT_CHAT_SESSION_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_CHAT_SESSION_SWEEP_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    pub store: StoreBackend,
    pub chat: ChatConfig,
    pub query_cache: bool,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `PORT`: default 3000
    /// - `DATABASE_URL`: selects the Postgres store when set
    /// - `STORE_BACKEND`: `postgres` or `memory`
    /// - `DB_MAX_CONNECTIONS`: default 5
    /// - `CHAT_REPLY_DELAY_MS`: default 700
    /// - `CHAT_RESPONSES_PATH`: YAML response table
    /// - `CHAT_SESSION_TTL_SECS`: default 3600
    /// - `CHAT_SESSION_SWEEP_SECS`: default 60
    /// - `QUERY_CACHE`: `on` (default) or `off`
    ///
    /// # Errors
    ///
    /// Returns an error for unparsable values or a Postgres backend with no URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::from_env`] over an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`AppConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or(&var, "PORT", DEFAULT_PORT)?;
        let database_url = var("DATABASE_URL");
        let store = match (var("STORE_BACKEND").as_deref(), database_url) {
            (Some("memory"), _) | (None, None) => StoreBackend::Memory,
            (Some("postgres") | None, Some(database_url)) => StoreBackend::Postgres {
                database_url,
                max_connections: parse_or(&var, "DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS)?,
            },
            (Some("postgres"), None) => return Err(ConfigError::MissingDatabaseUrl),
            (Some(other), _) => {
                return Err(ConfigError::Invalid {
                    var: "STORE_BACKEND",
                    value: other.to_owned(),
                    reason: "expected postgres or memory",
                });
            }
        };

        let chat = ChatConfig {
            reply_delay: Duration::from_millis(parse_or(&var, "CHAT_REPLY_DELAY_MS", DEFAULT_CHAT_REPLY_DELAY_MS)?),
            responses_path: var("CHAT_RESPONSES_PATH").map(PathBuf::from),
            session_ttl: Duration::from_secs(parse_or(&var, "CHAT_SESSION_TTL_SECS", DEFAULT_CHAT_SESSION_TTL_SECS)?),
            sweep_interval: Duration::from_secs(parse_or(
                &var,
                "CHAT_SESSION_SWEEP_SECS",
                DEFAULT_CHAT_SESSION_SWEEP_SECS,
            )?),
        };

        let query_cache = match var("QUERY_CACHE").as_deref() {
            None | Some("on") => true,
            Some("off") => false,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "QUERY_CACHE",
                    value: other.to_owned(),
                    reason: "expected on or off",
                });
            }
        };

        Ok(Self { port, store, chat, query_cache })
    }
}

fn parse_or<T>(var: &impl Fn(&str) -> Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match var(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { var: key, value: raw, reason: "not a valid number" }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
