//! Process configuration.
//!
//! Built once in `main` from the environment and handed to
//! `initialize_backend`; nothing reads configuration globally after startup.

use std::net::SocketAddr;

const DEFAULT_DATABASE_URL: &str = "sqlite:university.db";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:8080";

/// Immutable runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection URL
    pub database_url: String,
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Origin allowed by the CORS layer
    pub cors_origin: String,
}

impl Config {
    /// Read configuration from the environment, falling back to development
    /// defaults for anything unset.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("UNIVERSITY_DATABASE_URL")
            .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let bind_addr = std::env::var("UNIVERSITY_BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
            .parse()?;

        let cors_origin = std::env::var("UNIVERSITY_CORS_ORIGIN")
            .unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        Ok(Self {
            database_url,
            bind_addr,
            cors_origin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Env vars are unset in the test environment
        let config = Config::from_env().expect("Failed to build config");
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.cors_origin, DEFAULT_CORS_ORIGIN);
    }
}
