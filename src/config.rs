// Application configuration loaded from the environment

use std::{env, net::IpAddr, str::FromStr};

/// Errors raised while reading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Process configuration, read once at startup and passed to whatever needs it
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// When unset the in-memory user store is used
    pub database_url: Option<String>,
    /// HMAC secret for signing tokens. Never logged.
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_hours: i64,
    /// `None` admits every client address
    pub allowed_ips: Option<Vec<IpAddr>>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            database_url: None,
            jwt_secret: "test_secret_key_for_testing_purposes".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_hours: 168,
            allowed_ips: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, reading `.env` first if present
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 8080)?,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
            jwt_secret,
            access_token_ttl_minutes: check_ttl(
                "ACCESS_TOKEN_TTL_MIN",
                parse_var("ACCESS_TOKEN_TTL_MIN", 15)?,
                MAX_ACCESS_TOKEN_TTL_MIN,
            )?,
            refresh_token_ttl_hours: check_ttl(
                "REFRESH_TOKEN_TTL_HOUR",
                parse_var("REFRESH_TOKEN_TTL_HOUR", 168)?,
                MAX_REFRESH_TOKEN_TTL_HOUR,
            )?,
            allowed_ips: match env::var("ALLOWED_IPS") {
                Ok(raw) if !raw.trim().is_empty() => Some(parse_ip_list(&raw)?),
                _ => None,
            },
        };

        tracing::info!(
            host = %config.host,
            port = config.port,
            database = config.database_url.is_some(),
            jwt_secret_loaded = true,
            access_ttl_min = config.access_token_ttl_minutes,
            refresh_ttl_hour = config.refresh_token_ttl_hours,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

/// One day
pub const MAX_ACCESS_TOKEN_TTL_MIN: i64 = 24 * 60;
/// One year
pub const MAX_REFRESH_TOKEN_TTL_HOUR: i64 = 365 * 24;

/// TTLs must be positive and no larger than `max`
pub fn check_ttl(name: &'static str, value: i64, max: i64) -> Result<i64, ConfigError> {
    if value <= 0 || value > max {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must be between 1 and {}, got {}", max, value),
        });
    }
    Ok(value)
}

/// Parse a comma-separated IP list such as `127.0.0.1, 172.19.0.1`
pub fn parse_ip_list(raw: &str) -> Result<Vec<IpAddr>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<IpAddr>().map_err(|e| ConfigError::Invalid {
                name: "ALLOWED_IPS",
                reason: format!("'{}': {}", s, e),
            })
        })
        .collect()
}
