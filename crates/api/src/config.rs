//! Application configuration loaded from environment variables.

use std::str::FromStr;
use std::time::Duration;

use common::ChatId;
use domain::TransitionPolicy;
use thiserror::Error;

/// Errors raised while reading the environment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default `"0.0.0.0"`)
/// - `PORT`: listen port (default `3000`)
/// - `RUST_LOG`: tracing filter directive (default `"info"`)
/// - `DATABASE_URL`: PostgreSQL URL; the in-memory store is used when unset
/// - `ADMIN_CHAT_ID`: chat id of the administrator (required)
/// - `BOT_TOKEN`: transport token; notifications are only logged when unset
/// - `RATE_LIMIT_PER_MINUTE`: actions per actor per minute (default `20`)
/// - `CACHE_CAPACITY`: cached entries per entity type (default `1024`)
/// - `ORDER_TRANSITIONS`: `strict` or `permissive` (default `strict`)
/// - `NOTIFY_TIMEOUT_SECS`: upper bound on one notification send (default `10`)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub database_url: Option<String>,
    pub admin_chat_id: ChatId,
    pub bot_token: Option<String>,
    pub rate_limit_per_minute: u32,
    pub cache_capacity: usize,
    pub order_transitions: TransitionPolicy,
    pub notify_timeout: Duration,
}

impl Config {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Config::default();

        let admin_chat_id: i64 =
            parse("ADMIN_CHAT_ID", get("ADMIN_CHAT_ID"))?.ok_or(ConfigError::Missing("ADMIN_CHAT_ID"))?;
        let notify_timeout = parse::<u64>("NOTIFY_TIMEOUT_SECS", get("NOTIFY_TIMEOUT_SECS"))?
            .map(Duration::from_secs)
            .unwrap_or(defaults.notify_timeout);

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse("PORT", get("PORT"))?.unwrap_or(defaults.port),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
            database_url: get("DATABASE_URL"),
            admin_chat_id: ChatId::new(admin_chat_id),
            bot_token: get("BOT_TOKEN"),
            rate_limit_per_minute: parse("RATE_LIMIT_PER_MINUTE", get("RATE_LIMIT_PER_MINUTE"))?
                .unwrap_or(defaults.rate_limit_per_minute),
            cache_capacity: parse("CACHE_CAPACITY", get("CACHE_CAPACITY"))?
                .unwrap_or(defaults.cache_capacity),
            order_transitions: parse("ORDER_TRANSITIONS", get("ORDER_TRANSITIONS"))?
                .unwrap_or(defaults.order_transitions),
            notify_timeout,
        })
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(name: &'static str, raw: Option<String>) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
            value,
        })
    })
    .transpose()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "info".to_string(),
            database_url: None,
            admin_chat_id: ChatId::new(0),
            bot_token: None,
            rate_limit_per_minute: bot::rate_limit::DEFAULT_ACTIONS_PER_WINDOW,
            cache_capacity: store::DEFAULT_CACHE_CAPACITY,
            order_transitions: TransitionPolicy::Strict,
            notify_timeout: domain::DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_with_admin() {
        let config = load(&[("ADMIN_CHAT_ID", "12345")]).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_level, "info");
        assert_eq!(config.admin_chat_id, ChatId::new(12345));
        assert_eq!(config.database_url, None);
        assert_eq!(config.bot_token, None);
        assert_eq!(config.rate_limit_per_minute, 20);
        assert_eq!(config.cache_capacity, 1024);
        assert_eq!(config.order_transitions, TransitionPolicy::Strict);
        assert_eq!(config.notify_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_admin_is_required() {
        assert_eq!(load(&[]), Err(ConfigError::Missing("ADMIN_CHAT_ID")));
        assert_eq!(
            load(&[("ADMIN_CHAT_ID", "  ")]),
            Err(ConfigError::Missing("ADMIN_CHAT_ID"))
        );
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("ADMIN_CHAT_ID", "-100"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/bot"),
            ("BOT_TOKEN", "secret"),
            ("RATE_LIMIT_PER_MINUTE", "5"),
            ("CACHE_CAPACITY", "16"),
            ("ORDER_TRANSITIONS", "permissive"),
            ("NOTIFY_TIMEOUT_SECS", "3"),
        ])
        .unwrap();
        assert_eq!(config.admin_chat_id, ChatId::new(-100));
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/bot"));
        assert_eq!(config.bot_token.as_deref(), Some("secret"));
        assert_eq!(config.rate_limit_per_minute, 5);
        assert_eq!(config.cache_capacity, 16);
        assert_eq!(config.order_transitions, TransitionPolicy::Permissive);
        assert_eq!(config.notify_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("ADMIN_CHAT_ID", "1"), ("PORT", "http")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));

        let err = load(&[("ADMIN_CHAT_ID", "1"), ("ORDER_TRANSITIONS", "loose")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "ORDER_TRANSITIONS",
                ..
            }
        ));

        let err = load(&[("ADMIN_CHAT_ID", "admin")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "ADMIN_CHAT_ID",
                ..
            }
        ));
    }
}
