use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Service settings gathered from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub checkout_service_url: String,
    pub public_site_url: String,
    pub import_max_bytes: usize,
}

const DEFAULT_IMPORT_MAX_BYTES: usize = 5 * 1024 * 1024;

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = match lookup("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => 8082,
        };

        let import_max_bytes = match lookup("IMPORT_MAX_BYTES") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "IMPORT_MAX_BYTES",
                value,
            })?,
            None => DEFAULT_IMPORT_MAX_BYTES,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            database_url: lookup("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            checkout_service_url: lookup("CHECKOUT_SERVICE_URL")
                .unwrap_or_else(|| "http://localhost:8090".to_string()),
            public_site_url: lookup("PUBLIC_SITE_URL")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            import_max_bytes,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
