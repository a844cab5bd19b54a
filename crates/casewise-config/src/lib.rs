//! # casewise-config
//!
//! Layered configuration loading for Casewise using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`CASEWISE_*` prefix, `__` as separator)
//! 2. Project-level `.casewise/config.toml`
//! 3. User-level `~/.config/casewise/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `CASEWISE_AI__API_KEY` -> `ai.api_key`,
//! `CASEWISE_SERVER__PORT` -> `server.port`, etc. The `__` (double
//! underscore) separates nested config sections.
//!
//! # Usage
//!
//! ```no_run
//! use casewise_config::CasewiseConfig;
//!
//! let config = CasewiseConfig::load_with_dotenv().expect("config");
//!
//! if config.ai.is_configured() {
//!     println!("Chat model: {}", config.ai.chat_model);
//! }
//! ```

mod ai;
mod auth;
mod database;
mod error;
mod general;
mod server;

pub use ai::AiConfig;
pub use auth::AuthConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use general::GeneralConfig;
pub use server::ServerConfig;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CasewiseConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl CasewiseConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy`; use [`Self::load_with_dotenv`] for `.env`
    /// file loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Figment` if a source fails to parse or a value
    /// has the wrong type.
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    /// Load configuration with `.env` file support.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        // A missing .env file is normal.
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests and the CLI can layer further providers on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".casewise/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("CASEWISE_").split("__"))
    }

    /// Check cross-field constraints that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `NotConfigured` when auth is enabled without a password, or
    /// `InvalidValue` for out-of-range numbers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.auth.is_configured() {
            return Err(ConfigError::NotConfigured {
                section: "auth".into(),
                hint: "set auth.password (CASEWISE_AUTH__PASSWORD) or auth.enabled = false".into(),
            });
        }
        if self.auth.session_ttl_hours == 0 {
            return Err(invalid("auth.session_ttl_hours", "must be at least 1"));
        }
        if self.auth.cookie_name.is_empty()
            || !self
                .auth
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid(
                "auth.cookie_name",
                "must be non-empty and contain only [A-Za-z0-9_-]",
            ));
        }
        if self.database.retry_max_attempts == 0 {
            return Err(invalid("database.retry_max_attempts", "must be at least 1"));
        }
        if self.database.retry_base_delay_ms > self.database.retry_max_delay_ms {
            return Err(invalid(
                "database.retry_base_delay_ms",
                "must not exceed retry_max_delay_ms",
            ));
        }
        if self.server.max_body_bytes == 0 {
            return Err(invalid("server.max_body_bytes", "must be positive"));
        }
        if self.server.worker_threads == 0 {
            return Err(invalid("server.worker_threads", "must be at least 1"));
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            return Err(invalid("ai.temperature", "must be between 0 and 2"));
        }
        if self.general.default_limit == 0 || self.general.default_limit > self.general.max_limit {
            return Err(invalid(
                "general.default_limit",
                "must be between 1 and general.max_limit",
            ));
        }
        Ok(())
    }

    /// Path to the user-global config file.
    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("casewise").join("config.toml"))
    }
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.into(),
        reason: reason.into(),
    }
}
