use std::env;
use std::time::Duration;

use crate::error::AppError;
use crate::geo::distance::DEFAULT_DISTANCE_MATRIX_URL;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub database_url: String,
    pub database_max_connections: u32,
    pub distance_api_url: String,
    pub distance_api_key: Option<String>,
    pub distance_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") | Err(_) => LogFormat::Compact,
            Ok(other) => {
                return Err(AppError::Internal(format!("invalid LOG_FORMAT: {other}")));
            }
        };

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 8080)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://orders.db".to_string()),
            database_max_connections: parse_or_default("DATABASE_MAX_CONNECTIONS", 5)?,
            distance_api_url: env::var("DISTANCE_API_URL")
                .unwrap_or_else(|_| DEFAULT_DISTANCE_MATRIX_URL.to_string()),
            distance_api_key: env::var("DISTANCE_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            distance_timeout: Duration::from_millis(parse_or_default("DISTANCE_TIMEOUT_MS", 5000)?),
        })
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
