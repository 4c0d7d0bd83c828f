//! Configuration loading from environment.

use std::env;

use anyhow::{Context, anyhow};

use inventory_hex::outbound::{DEFAULT_RATE_POINTER, DEFAULT_RATE_SOURCE_URL};
use inventory_types::Rate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration.
#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub rate_source_url: String,
    /// JSON pointer to the rate inside the source payload
    pub rate_source_pointer: String,
    pub default_rate: Rate,
    pub refresh_enabled: bool,
    pub log_format: LogFormat,
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = lookup("PORT")
            .unwrap_or_else(|| "3000".to_string())
            .parse()
            .context("PORT must be a port number")?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow!("DATABASE_URL environment variable is required"))?;

        let default_rate = match lookup("DEFAULT_EXCHANGE_RATE") {
            Some(raw) => {
                let value: f64 = raw
                    .trim()
                    .parse()
                    .context("DEFAULT_EXCHANGE_RATE must be a number")?;
                Rate::new(value).context("DEFAULT_EXCHANGE_RATE")?
            }
            None => Rate::default(),
        };

        let refresh_enabled = match lookup("RATE_REFRESH_ENABLED") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("RATE_REFRESH_ENABLED must be true or false, got {raw:?}"))?,
            None => true,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(f) if f.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            port,
            database_url,
            rate_source_url: lookup("RATE_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_RATE_SOURCE_URL.to_string()),
            rate_source_pointer: lookup("RATE_SOURCE_POINTER")
                .unwrap_or_else(|| DEFAULT_RATE_POINTER.to_string()),
            default_rate,
            refresh_enabled,
            log_format,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.trim().is_empty()),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "sqlite::memory:")]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_rate.value(), 36.5);
        assert!(config.refresh_enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.rate_source_url, DEFAULT_RATE_SOURCE_URL);
        assert_eq!(config.rate_source_pointer, DEFAULT_RATE_POINTER);
        assert!(config.otlp_endpoint.is_none());
    }

    #[test]
    fn test_database_url_required() {
        let err = load(&[]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgres://localhost/inventory"),
            ("PORT", "8080"),
            ("DEFAULT_EXCHANGE_RATE", "40.25"),
            ("RATE_REFRESH_ENABLED", "off"),
            ("LOG_FORMAT", "JSON"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.default_rate.value(), 40.25);
        assert!(!config.refresh_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_invalid_default_rate_rejected() {
        for bad in ["0", "-3", "abc"] {
            let result = load(&[("DATABASE_URL", "x"), ("DEFAULT_EXCHANGE_RATE", bad)]);
            assert!(result.is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_invalid_refresh_flag_rejected() {
        let result = load(&[("DATABASE_URL", "x"), ("RATE_REFRESH_ENABLED", "maybe")]);
        assert!(result.is_err());
    }
}
