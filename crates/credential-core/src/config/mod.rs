//! Configuration for credential-core
//!
//! Loaded in layers: built-in defaults, then an optional TOML file, then
//! `PARISH_*` environment variables (`__` separates nested keys, e.g.
//! `PARISH_CREDENTIAL__SIGNING_SECRET`).

use std::path::Path;

use chrono::Duration;
use serde::Deserialize;

use crate::credential::{SigningSecret, DEFAULT_TTL_SECONDS};
use crate::logging::LoggingConfig;
use crate::{Error, Result};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "PARISH";

/// Longest accepted credential lifetime: one year.
pub const MAX_TTL_SECONDS: i64 = 365 * 86_400;

/// Main configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub bind_address: String,
    /// Registering with this email produces an elevated account.
    pub admin_email: Option<String>,
    pub credential: CredentialConfig,
    pub password: PasswordConfig,
    pub logging: LoggingConfig,
}

/// Credential signing configuration
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CredentialConfig {
    /// Required; there is deliberately no default.
    pub signing_secret: Option<String>,
    pub ttl_seconds: i64,
}

/// Password configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub min_length: usize,
    pub argon2_memory_cost: u32,
    pub argon2_time_cost: u32,
    pub argon2_parallelism: u32,
}

impl ServiceConfig {
    /// Load configuration from an optional file plus the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: ServiceConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    pub fn validate(&self) -> Result<()> {
        self.credential.ttl()?;
        if self.password.min_length == 0 {
            return Err(Error::Config("password.min_length must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn with_signing_secret(mut self, secret: impl Into<String>) -> Self {
        self.credential.signing_secret = Some(secret.into());
        self
    }
}

impl CredentialConfig {
    /// Fails when the secret is absent or empty.
    pub fn signing_secret(&self) -> Result<SigningSecret> {
        match self.signing_secret.as_deref() {
            Some(secret) if !secret.is_empty() => SigningSecret::new(secret),
            _ => Err(Error::Config(format!(
                "credential.signing_secret is not set (use {}_CREDENTIAL__SIGNING_SECRET)",
                ENV_PREFIX
            ))),
        }
    }

    /// Fails unless `ttl_seconds` is in `1..=MAX_TTL_SECONDS`.
    pub fn ttl(&self) -> Result<Duration> {
        if !(1..=MAX_TTL_SECONDS).contains(&self.ttl_seconds) {
            return Err(Error::Config(format!(
                "credential.ttl_seconds must be between 1 and {}",
                MAX_TTL_SECONDS
            )));
        }
        Duration::try_seconds(self.ttl_seconds)
            .ok_or_else(|| Error::Config("credential.ttl_seconds is out of range".to_string()))
    }
}

impl PasswordConfig {
    /// Cheapest Argon2 parameters; for tests and local tinkering.
    pub fn low_cost() -> Self {
        Self {
            argon2_memory_cost: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..Self::default()
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            admin_email: None,
            credential: CredentialConfig::default(),
            password: PasswordConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CredentialConfig {
    fn default() -> Self {
        Self {
            signing_secret: None,
            ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl std::fmt::Debug for CredentialConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("signing_secret", &self.signing_secret.as_ref().map(|_| "<redacted>"))
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            min_length: 6,
            argon2_memory_cost: 65536,
            argon2_time_cost: 3,
            argon2_parallelism: 4,
        }
    }
}
