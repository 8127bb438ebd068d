//! Application configuration loaded from environment variables.

use std::env;

use blog_infra::{JwtConfig, PasswordConfig};
use blog_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub jwt: JwtConfig,
    pub passwords: PasswordConfig,
    pub session: SessionConfig,
}

/// Session cookie settings.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Send the session cookie over HTTPS only.
    pub cookie_secure: bool,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

fn env_flag(key: &str, default: bool) -> bool {
    env::var(key)
        .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"))
        .unwrap_or(default)
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS").unwrap_or(20),
            min_connections: env_parse("DB_MIN_CONNECTIONS").unwrap_or(2),
            auto_migrate: env_flag("AUTO_MIGRATE", true),
        });

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_parse("PORT").unwrap_or(8080),
            database,
            jwt: JwtConfig::from_env(),
            passwords: PasswordConfig::from_env(),
            session: SessionConfig {
                cookie_secure: env_flag("SESSION_COOKIE_SECURE", false),
            },
        }
    }
}
