/*
 * Responsibility
 * - Read settings from the environment (APP_ENV, PORT, CORS profile / allow-list, HTTP limits)
 * - Validate them once at startup (invalid values abort startup)
 * - Build the selected CORS PolicyConfig
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;

use crate::services::cors::{CorsProfile, PolicyConfig};

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    /// Only an explicit `development` (or `dev`) turns on development behaviour.
    /// Unset or unknown values are treated as production.
    pub fn parse(value: Option<&str>) -> Self {
        match value
            .map(|s| s.trim().to_ascii_lowercase())
            .as_deref()
        {
            Some("development") | Some("dev") => Self::Development,
            _ => Self::Production,
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub cors_profile: CorsProfile,
    // Exact-match origins for the strict profile
    pub cors_allowed_origins: Vec<String>,

    pub body_limit_bytes: usize,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port: u16 = parse_or(&lookup, "PORT", 3000)?;
        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let cors_profile: CorsProfile = parse_or(&lookup, "CORS_PROFILE", CorsProfile::Strict)?;

        // An explicitly empty value means "no origins", not "use the default".
        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let body_limit_bytes: usize = parse_or(&lookup, "HTTP_BODY_LIMIT_BYTES", 1024 * 1024)?;
        let timeout_seconds: u64 = parse_or(&lookup, "HTTP_TIMEOUT_SECONDS", 30)?;
        if timeout_seconds == 0 {
            return Err(ConfigError::Invalid("HTTP_TIMEOUT_SECONDS"));
        }

        Ok(Self {
            addr,
            app_env,
            cors_profile,
            cors_allowed_origins,
            body_limit_bytes,
            timeout: Duration::from_secs(timeout_seconds),
        })
    }

    pub fn policy_config(&self) -> PolicyConfig {
        match self.cors_profile {
            CorsProfile::Strict => PolicyConfig::strict(self.cors_allowed_origins.iter().cloned()),
            CorsProfile::Permissive => PolicyConfig::permissive(),
        }
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|_| ConfigError::Invalid(key))
        }
        _ => Ok(default),
    }
}
