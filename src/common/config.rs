use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, Result, anyhow};
use tracing::info;

use crate::domain::{DuplicatePaymentPolicy, TransitionPolicy};

const DEFAULT_CHATBOT_WEBHOOK_URL: &str = "https://n8n.quicktoolbox.in/webhook/on";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow!("unknown storage backend `{other}`")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

/// Business rules that are a deployment decision rather than code.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderPolicies {
    pub transitions: TransitionPolicy,
    pub duplicate_payments: DuplicatePaymentPolicy,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: String,
    pub server: ServerConfig,
    pub storage: StorageBackend,
    pub database: DatabaseConfig,
    pub policies: OrderPolicies,
    pub chatbot_webhook_url: String,
}

impl Config {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Reads the configuration from the process environment.
///
/// `DATABASE_URL` wins; otherwise the URL is assembled from `DB_HOST`,
/// `DB_PORT`, `DB_USER`, `DB_PASSWORD` and `DB_NAME`.
pub fn load() -> Result<Config> {
    let storage: StorageBackend = try_load("STORAGE", "postgres")?;

    let url = match env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => database_url_from_parts().unwrap_or_default(),
    };
    if storage == StorageBackend::Postgres && url.is_empty() {
        return Err(anyhow!(
            "DATABASE_URL (or DB_HOST/DB_USER/DB_NAME) must be set for postgres storage"
        ));
    }

    let config = Config {
        environment: try_load("APP_ENV", "development")?,
        server: ServerConfig {
            port: try_load("PORT", "3001")?,
            request_timeout_secs: try_load("REQUEST_TIMEOUT_SECS", "30")?,
        },
        storage,
        database: DatabaseConfig {
            url,
            max_connections: try_load("DB_MAX_CONNECTIONS", "10")?,
        },
        policies: OrderPolicies {
            transitions: try_load("ORDER_TRANSITIONS", "lenient")?,
            duplicate_payments: try_load("DUPLICATE_PAYMENTS", "supersede")?,
        },
        chatbot_webhook_url: try_load("CHATBOT_WEBHOOK_URL", DEFAULT_CHATBOT_WEBHOOK_URL)?,
    };

    info!(
        environment = %config.environment,
        storage = ?config.storage,
        transitions = ?config.policies.transitions,
        duplicate_payments = ?config.policies.duplicate_payments,
        "Configuration loaded"
    );

    Ok(config)
}

fn database_url_from_parts() -> Option<String> {
    let host = env::var("DB_HOST").ok()?;
    let user = env::var("DB_USER").ok()?;
    let name = env::var("DB_NAME").ok()?;
    let port = env::var("DB_PORT").unwrap_or_else(|_| "5432".into());
    let password = env::var("DB_PASSWORD").unwrap_or_default();

    Some(format!("postgres://{user}:{password}@{host}:{port}/{name}"))
}

fn try_load<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("Invalid value for {key}: `{raw}`"))
}
