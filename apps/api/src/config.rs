//! API configuration module.
//!
//! Layered with the `config` crate:
//!
//! ```text
//! built-in defaults  →  ./micks.toml (optional)  →  MICKS_* environment
//!      (lowest)                                         (highest)
//! ```
//!
//! e.g. `MICKS_PORT=9000`, `MICKS_SMTP_ENABLED=true`,
//! `MICKS_ADMIN_PASSWORD_HASH='$argon2id$...'`.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

/// Secret used when none is configured. Fine for local runs only.
pub const DEV_JWT_SECRET: &str = "micks-dev-secret-change-in-production";

/// API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Interface to listen on
    pub bind_addr: String,

    /// HTTP port
    pub port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Connection pool size
    pub db_max_connections: u32,

    /// Admin login name
    pub admin_username: String,

    /// Admin password as an argon2 PHC string (preferred)
    pub admin_password_hash: Option<String>,

    /// Admin password in clear text, hashed at startup (development)
    pub admin_password: Option<String>,

    /// JWT secret key for signing admin tokens
    pub jwt_secret: String,

    /// Admin token lifetime in seconds
    pub jwt_lifetime_secs: i64,

    /// Send e-mails through SMTP; when false notifications are only logged
    pub smtp_enabled: bool,

    pub smtp_host: String,

    pub smtp_port: u16,

    /// Per-message SMTP timeout in seconds
    pub smtp_timeout_secs: u64,

    /// Sender address of notification e-mails
    pub mail_from: String,

    /// Mailbox that receives a copy of every new sale
    pub operations_email: String,
}

impl ApiConfig {
    /// Load configuration from `micks.toml` and `MICKS_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let config = Self::defaults()?
            .add_source(File::with_name("micks").required(false))
            .add_source(Environment::with_prefix("MICKS").try_parsing(true))
            .build()?;

        Self::from_config(config)
    }

    /// Built-in defaults, the lowest layer.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Ok(Config::builder()
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("port", 8000)?
            .set_default("database_path", "./data/micks.db")?
            .set_default("db_max_connections", 5)?
            .set_default("admin_username", "admin")?
            .set_default("jwt_secret", DEV_JWT_SECRET)?
            .set_default("jwt_lifetime_secs", 3600)? // 1 hour
            .set_default("smtp_enabled", false)?
            .set_default("smtp_host", "mail")?
            .set_default("smtp_port", 1025)?
            .set_default("smtp_timeout_secs", 10)?
            .set_default("mail_from", "no-reply@micks.com.br")?
            .set_default("operations_email", "vendas@micks.com.br")?)
    }

    /// Deserializes and validates a built configuration.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let config: ApiConfig = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("port".to_string()));
        }

        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt_secret".to_string()));
        }

        if self.jwt_lifetime_secs <= 0 {
            return Err(ConfigError::InvalidValue("jwt_lifetime_secs".to_string()));
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("db_max_connections".to_string()));
        }

        let has_password = |value: &Option<String>| {
            value.as_deref().is_some_and(|v| !v.trim().is_empty())
        };
        if !has_password(&self.admin_password_hash) && !has_password(&self.admin_password) {
            return Err(ConfigError::MissingRequired(
                "admin_password_hash or admin_password".to_string(),
            ));
        }

        Ok(())
    }

    /// Address the HTTP server binds to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("bind_addr".to_string()))
    }

    pub fn smtp_timeout(&self) -> Duration {
        Duration::from_secs(self.smtp_timeout_secs)
    }

    /// True when the signing secret is still the development default.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
impl ApiConfig {
    /// Defaults plus a dev password, without reading files or the environment.
    pub fn for_tests() -> Self {
        let config = Self::defaults()
            .and_then(|builder| Ok(builder.set_override("admin_password", "s3nha-forte")?))
            .and_then(|builder| Ok(builder.build()?))
            .expect("test configuration builds");
        Self::from_config(config).expect("test configuration is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(overrides: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let mut builder = ApiConfig::defaults()?;
        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }
        ApiConfig::from_config(builder.build()?)
    }

    #[test]
    fn test_defaults() {
        let config = build(&[("admin_password", "secret")]).unwrap();

        assert_eq!(config.port, 8000);
        assert_eq!(config.bind_addr, "0.0.0.0");
        assert_eq!(config.database_path, PathBuf::from("./data/micks.db"));
        assert_eq!(config.admin_username, "admin");
        assert_eq!(config.jwt_lifetime_secs, 3600);
        assert!(!config.smtp_enabled);
        assert_eq!(config.smtp_host, "mail");
        assert_eq!(config.smtp_port, 1025);
        assert!(config.uses_dev_secret());
        assert_eq!(config.socket_addr().unwrap().port(), 8000);
    }

    #[test]
    fn test_admin_password_is_required() {
        assert!(matches!(build(&[]), Err(ConfigError::MissingRequired(_))));
        assert!(matches!(
            build(&[("admin_password", "  ")]),
            Err(ConfigError::MissingRequired(_))
        ));
        assert!(build(&[("admin_password_hash", "$argon2id$v=19$...")]).is_ok());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            build(&[("admin_password", "x"), ("port", "0")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(matches!(
            build(&[("admin_password", "x"), ("jwt_secret", "")]),
            Err(ConfigError::InvalidValue(_))
        ));
        assert!(build(&[("admin_password", "x"), ("port", "not-a-port")]).is_err());
    }

    #[test]
    fn test_bad_bind_addr() {
        let config = build(&[("admin_password", "x"), ("bind_addr", "nowhere")]).unwrap();
        assert!(config.socket_addr().is_err());
    }
}
