use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::services::calendar::WindowPolicy;

pub mod cors;
pub mod media_type;

pub use cors::create_cors_layer;
pub use media_type::create_media_type_layer;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ivana";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000,http://localhost:5173";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres => f.write_str("postgres"),
            Self::Memory => f.write_str("memory"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: String,
    pub max_connections: u32,
    pub store_timeout: Duration,
    pub port: u16,
    pub window_policy: WindowPolicy,
    pub cors_allowed_origins: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_backend: StoreBackend::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            store_timeout: Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS),
            port: DEFAULT_PORT,
            window_policy: WindowPolicy::default(),
            cors_allowed_origins: DEFAULT_ALLOWED_ORIGINS.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unparseable values keep the
    /// default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            store_backend: parsed(&lookup, "STORE_BACKEND", defaults.store_backend),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            max_connections: positive(&lookup, "DATABASE_MAX_CONNECTIONS", defaults.max_connections),
            store_timeout: Duration::from_secs(positive(
                &lookup,
                "STORE_TIMEOUT_SECS",
                defaults.store_timeout.as_secs(),
            )),
            port: parsed(&lookup, "PORT", defaults.port),
            window_policy: parsed(&lookup, "EVENT_WINDOW_POLICY", defaults.window_policy),
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .unwrap_or(defaults.cors_allowed_origins),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            tracing::warn!("Config: invalid {}='{}' ({}), using {}", key, raw, e, default);
            default
        }),
    }
}

/// Like [`parsed`], but zero is also rejected.
fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + fmt::Display + PartialEq + Default + Copy,
    T::Err: fmt::Display,
{
    let value = parsed(lookup, key, default);
    if value == T::default() {
        tracing::warn!("Config: {} must be greater than zero, using {}", key, default);
        return default;
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.port, 3001);
        assert_eq!(config.store_timeout, Duration::from_secs(5));
        assert_eq!(config.window_policy, WindowPolicy::Week);
    }

    #[test]
    fn test_values_are_read() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "memory"),
            ("DATABASE_URL", "postgres://db/other"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("STORE_TIMEOUT_SECS", "2"),
            ("PORT", "8080"),
            ("EVENT_WINDOW_POLICY", "month"),
            ("CORS_ALLOWED_ORIGINS", "https://app.example.com"),
        ]));

        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.database_url, "postgres://db/other");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.store_timeout, Duration::from_secs(2));
        assert_eq!(config.port, 8080);
        assert_eq!(config.window_policy, WindowPolicy::Month);
        assert_eq!(config.cors_allowed_origins, "https://app.example.com");
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_BACKEND", "mongo"),
            ("PORT", "not-a-port"),
            ("EVENT_WINDOW_POLICY", "fortnight"),
        ]));

        assert_eq!(config.store_backend, StoreBackend::Postgres);
        assert_eq!(config.port, 3001);
        assert_eq!(config.window_policy, WindowPolicy::Week);
    }

    #[test]
    fn test_zero_pool_settings_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("STORE_TIMEOUT_SECS", "0"),
            ("DATABASE_MAX_CONNECTIONS", "0"),
        ]));

        assert_eq!(config.store_timeout, Duration::from_secs(DEFAULT_STORE_TIMEOUT_SECS));
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
    }
}
