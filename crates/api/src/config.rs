//! Process configuration, read from the environment once at startup.

use std::net::SocketAddr;

use chrono::Duration;
use thiserror::Error;

use reading_auth::{CredentialConfig, SigningKey, TokenConfig, TokenConfigError};
use reading_observability::LogFormat;

const DEV_SECRET: &str = "dev-secret";
const DEFAULT_BIND: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error(transparent)]
    Token(#[from] TokenConfigError),
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Everything the API needs to start.
///
/// | variable         | default          |
/// |------------------|------------------|
/// | `BIND_ADDR`      | `0.0.0.0:8080`   |
/// | `JWT_SECRET`     | dev secret (warned about) |
/// | `TOKEN_TTL_SECS` | `3600`           |
/// | `DATABASE_URL`   | unset: in-memory store |
/// | `LOG_FORMAT`     | `json`           |
#[derive(Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    pub credentials: CredentialConfig,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source (the environment, or a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let bind_addr = non_empty("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let token_ttl = match non_empty("TOKEN_TTL_SECS") {
            Some(raw) => {
                let secs = raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| ConfigError::invalid("TOKEN_TTL_SECS", e.to_string()))?;
                if secs <= 0 {
                    return Err(ConfigError::invalid("TOKEN_TTL_SECS", "must be positive"));
                }
                if secs > TokenConfig::MAX_VALIDITY_SECS {
                    return Err(ConfigError::invalid(
                        "TOKEN_TTL_SECS",
                        format!("must not exceed {}", TokenConfig::MAX_VALIDITY_SECS),
                    ));
                }
                Duration::try_seconds(secs)
                    .ok_or_else(|| ConfigError::invalid("TOKEN_TTL_SECS", "out of range"))?
            }
            None => Duration::seconds(TokenConfig::DEFAULT_VALIDITY_SECS),
        };

        let log_format = match non_empty("LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::invalid("LOG_FORMAT", e))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret: non_empty("JWT_SECRET").unwrap_or_else(|| DEV_SECRET.to_string()),
            token_ttl,
            database_url: non_empty("DATABASE_URL"),
            log_format,
            credentials: CredentialConfig::default(),
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_SECRET
    }

    pub fn token_config(&self) -> Result<TokenConfig, ConfigError> {
        let key = SigningKey::new(self.jwt_secret.clone().into_bytes())?;
        Ok(TokenConfig::new(key, self.token_ttl)?)
    }
}

impl core::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("token_ttl", &self.token_ttl)
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("log_format", &self.log_format)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
