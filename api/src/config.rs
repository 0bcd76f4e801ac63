use crate::database::DEFAULT_DATABASE_URL;
use crate::query_sanitizer::DEFAULT_MAX_DEPTH;
use std::env;

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub database_url: String,
    pub environment: String,
    /// Nesting ceiling for list filters.
    pub filter_max_depth: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            environment: "development".to_string(),
            filter_max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ApiConfig {
    /// Reads the configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(lookup("PORT"), "PORT", defaults.port),
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            filter_max_depth: parse_or(
                lookup("FILTER_MAX_DEPTH"),
                "FILTER_MAX_DEPTH",
                defaults.filter_max_depth,
            ),
        }
    }
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            default
        }),
    }
}
