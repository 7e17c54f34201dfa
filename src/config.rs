use std::env;

use crate::engine::dashboard::DEFAULT_LEADERBOARD_SIZE;
use crate::error::AppError;
use crate::models::payment::PaymentRates;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    /// `compact` (default) or `json`.
    pub log_format: String,
    pub event_buffer_size: usize,
    pub leaderboard_size: usize,
    /// Starting rate table. Operators can replace it at runtime.
    pub payment_rates: PaymentRates,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let event_buffer_size = parse_or_default("EVENT_BUFFER_SIZE", 1024)?;
        if event_buffer_size == 0 {
            return Err(AppError::Internal(
                "invalid EVENT_BUFFER_SIZE: must be > 0".to_string(),
            ));
        }

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
            event_buffer_size,
            leaderboard_size: parse_or_default("LEADERBOARD_SIZE", DEFAULT_LEADERBOARD_SIZE)?,
            payment_rates: PaymentRates {
                per_order: parse_or_default("PAY_PER_ORDER", 50.0)?,
                per_kilometer: parse_or_default("PAY_PER_KILOMETER", 10.0)?,
                per_hour: parse_or_default("PAY_PER_HOUR", 20.0)?,
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            log_format: "compact".to_string(),
            event_buffer_size: 1024,
            leaderboard_size: DEFAULT_LEADERBOARD_SIZE,
            payment_rates: PaymentRates {
                per_order: 50.0,
                per_kilometer: 10.0,
                per_hour: 20.0,
            },
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::parse_or_default;

    #[test]
    fn missing_variable_falls_back_to_default() {
        let value: f64 = parse_or_default("DELIVERY_LEDGER_UNSET_FOR_TEST", 12.5).unwrap();
        assert_eq!(value, 12.5);
    }
}
