use std::path::PathBuf;
use std::str::FromStr;

use crate::auth::jwt::JwtConfig;

/// A missing or unparseable environment variable.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string.
    pub database_url: String,
    /// Frontend origins allowed by CORS.
    pub cors_origins: Vec<String>,
    /// Uploads of ten large files take a while, hence the generous default.
    pub request_timeout_secs: u64,
    /// Root directory for attachment files, served under `/uploads`.
    pub upload_dir: PathBuf,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from the environment.
    ///
    /// | Env Var                | Default                 |
    /// |------------------------|-------------------------|
    /// | `HOST`                 | `0.0.0.0`               |
    /// | `PORT`                 | `5000`                  |
    /// | `DATABASE_URL`         | required                |
    /// | `CORS_ORIGINS`         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS` | `120`                   |
    /// | `UPLOAD_DIR`           | `uploads`               |
    ///
    /// See [`JwtConfig::from_env`] for the token settings.
    pub fn from_env() -> Result<Self, ConfigError> {
        let cors_origins = env_or("CORS_ORIGINS", "http://localhost:5173".to_string())?
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host: env_or("HOST", "0.0.0.0".to_string())?,
            port: env_or("PORT", 5000)?,
            database_url: env_required("DATABASE_URL")?,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 120)?,
            upload_dir: env_or("UPLOAD_DIR", PathBuf::from("uploads"))?,
            jwt: JwtConfig::from_env()?,
        })
    }
}

/// Read and parse `var`, falling back to `default` when it is unset.
pub(crate) fn env_or<T>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(value) => parse(var, value),
        Err(_) => Ok(default),
    }
}

/// Read a variable that must be present and non-empty.
pub(crate) fn env_required(var: &'static str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn parse<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}
