use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::AppError;
use crate::models::courier::LatLng;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackendKind {
    Memory,
    File,
}

impl std::str::FromStr for StoreBackendKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackendKind::Memory),
            "file" => Ok(StoreBackendKind::File),
            other => Err(format!("unknown store backend {other}, expected memory/file")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub admin: Duration,
    pub customer: Duration,
    pub courier: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            admin: Duration::from_secs(10),
            customer: Duration::from_secs(3),
            courier: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_dishes: usize,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub store_backend: StoreBackendKind,
    pub store_path: PathBuf,
    pub poll: PollConfig,
    pub suggest: SuggestConfig,
    pub courier_agent_id: Option<String>,
    pub courier_origin: LatLng,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            store_backend: parse_or_default("STORE_BACKEND", StoreBackendKind::Memory)?,
            store_path: PathBuf::from(env::var("STORE_PATH").unwrap_or_else(|_| "data".to_string())),
            poll: PollConfig {
                admin: Duration::from_secs(parse_or_default("ADMIN_POLL_SECS", 10)?),
                customer: Duration::from_secs(parse_or_default("CUSTOMER_POLL_SECS", 3)?),
                courier: Duration::from_secs(parse_or_default("COURIER_POLL_SECS", 5)?),
            },
            suggest: SuggestConfig {
                endpoint: env::var("SUGGEST_ENDPOINT").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                model: env::var("SUGGEST_MODEL")
                    .unwrap_or_else(|_| "gemini-3-flash-preview".to_string()),
                api_key: env::var("SUGGEST_API_KEY").ok().filter(|key| !key.is_empty()),
                max_dishes: parse_or_default("SUGGEST_MAX_DISHES", 3)?,
            },
            courier_agent_id: env::var("COURIER_AGENT_ID").ok().filter(|id| !id.is_empty()),
            courier_origin: LatLng {
                lat: parse_or_default("COURIER_ORIGIN_LAT", 18.4861)?,
                lng: parse_or_default("COURIER_ORIGIN_LNG", -69.9312)?,
            },
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
