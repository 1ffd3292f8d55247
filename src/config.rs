//! Service configuration, loaded from the environment (and `.env` if present).

use std::env;
use std::str::FromStr;

use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// PostgreSQL connection string
    pub database_url: String,
    pub port: u16,
    /// NATS server; events are dropped when unset
    pub nats_url: Option<String>,
    pub db_max_connections: u32,
    /// Largest accepted difference between a gateway amount and the order total
    pub payment_amount_tolerance: Decimal,
    pub payment_confirmed_subject: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let config = AppConfig {
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty())
                .ok_or_else(|| ConfigError::MissingRequired("DATABASE_URL".to_string()))?,
            port: parse_or(&lookup, "PORT", 8083)?,
            nats_url: lookup("NATS_URL").filter(|v| !v.is_empty()),
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 10)?,
            payment_amount_tolerance: parse_or(&lookup, "PAYMENT_AMOUNT_TOLERANCE", Decimal::new(1, 2))?,
            payment_confirmed_subject: lookup("PAYMENT_CONFIRMED_SUBJECT").unwrap_or_else(|| "orders.payment_confirmed".to_string()),
        };

        if config.payment_amount_tolerance < Decimal::ZERO {
            return Err(ConfigError::InvalidValue("PAYMENT_AMOUNT_TOLERANCE".to_string()));
        }
        Ok(config)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgres://localhost/shop")]).unwrap();
        assert_eq!(config.port, 8083);
        assert_eq!(config.db_max_connections, 10);
        assert_eq!(config.payment_amount_tolerance, Decimal::new(1, 2));
        assert_eq!(config.payment_confirmed_subject, "orders.payment_confirmed");
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_missing_and_invalid_values() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingRequired(_))));
        assert!(matches!(
            load(&[("DATABASE_URL", "postgres://x"), ("PORT", "http")]),
            Err(ConfigError::InvalidValue(key)) if key == "PORT"
        ));
        assert!(load(&[("DATABASE_URL", "postgres://x"), ("PAYMENT_AMOUNT_TOLERANCE", "-1")]).is_err());
    }
}
