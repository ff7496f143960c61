//! # Configuration
//!
//! Process-wide settings, read once at startup and shared read-only behind
//! an `Arc` for the lifetime of the server.
//!
//! Sources, lowest priority first:
//! - built-in defaults
//! - optional `config/default.toml`
//! - environment variables (`BACKEND_DOMAIN`, `JWT_SECRET`, ...)

use serde::{Deserialize, Serialize};
use crate::error::{AppError, Result};

/// Default signing secret; refused in production.
pub const DEFAULT_JWT_SECRET: &str = "change-me-in-production";

/// Application settings
///
/// `backend_domain` is the public host used for every generated href
/// (`https://{backend_domain}/api/...`). `frontend_domain` is where OAuth
/// callbacks send the browser back to.
///
/// ```rust
/// use kiwiscript_api::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.backend_domain, "localhost:5000");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,

    pub port: u16,

    /// Host part of every absolute link in response bodies
    pub backend_domain: String,

    /// Host of the web client
    pub frontend_domain: String,

    pub jwt_secret: String,

    pub jwt_access_ttl_sec: i64,

    pub jwt_refresh_ttl_sec: i64,

    /// Lifetime of confirmation and password-reset tokens
    pub jwt_email_ttl_sec: i64,

    pub jwt_oauth_ttl_sec: i64,

    #[serde(default)]
    pub github_client_id: String,

    #[serde(default)]
    pub google_client_id: String,

    /// Base URL files and pictures are served from
    pub object_storage_host: String,

    pub request_timeout_sec: u64,

    pub environment: Environment,
}

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[serde(alias = "dev")]
    Development,

    #[serde(alias = "test")]
    Testing,

    #[serde(alias = "prod")]
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

impl From<String> for Environment {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "testing" | "test" => Environment::Testing,
            _ => Environment::Development,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            backend_domain: "localhost:5000".to_string(),
            frontend_domain: "localhost:3000".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_access_ttl_sec: 300,
            jwt_refresh_ttl_sec: 259_200,
            jwt_email_ttl_sec: 3_600,
            jwt_oauth_ttl_sec: 120,
            github_client_id: String::new(),
            google_client_id: String::new(),
            object_storage_host: "https://objects.localhost".to_string(),
            request_timeout_sec: 30,
            environment: Environment::Development,
        }
    }
}

impl Config {
    /// Load settings from `config/default.toml` (if present) and the
    /// environment, on top of [`Config::default`].
    ///
    /// # Errors
    /// `AppError::Config` when a value has the wrong type or the result
    /// fails [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let settings = ::config::Config::builder()
            .set_default("host", defaults.host)
            .and_then(|b| b.set_default("port", i64::from(defaults.port)))
            .and_then(|b| b.set_default("backend_domain", defaults.backend_domain))
            .and_then(|b| b.set_default("frontend_domain", defaults.frontend_domain))
            .and_then(|b| b.set_default("jwt_secret", defaults.jwt_secret))
            .and_then(|b| b.set_default("jwt_access_ttl_sec", defaults.jwt_access_ttl_sec))
            .and_then(|b| b.set_default("jwt_refresh_ttl_sec", defaults.jwt_refresh_ttl_sec))
            .and_then(|b| b.set_default("jwt_email_ttl_sec", defaults.jwt_email_ttl_sec))
            .and_then(|b| b.set_default("jwt_oauth_ttl_sec", defaults.jwt_oauth_ttl_sec))
            .and_then(|b| b.set_default("object_storage_host", defaults.object_storage_host))
            .and_then(|b| b.set_default("request_timeout_sec", defaults.request_timeout_sec as i64))
            .and_then(|b| b.set_default("environment", "development"))
            .map_err(|e| AppError::Config(e.to_string()))?
            .add_source(::config::File::with_name("config/default").required(false))
            .add_source(::config::Environment::default().try_parsing(true))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce a broken or unsafe server.
    pub fn validate(&self) -> Result<()> {
        if self.environment.is_production() && self.jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::Config(
                "JWT_SECRET must be changed in production".to_string()
            ));
        }

        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }

        // Links are rendered as https://{domain}/api/..., a scheme here doubles it
        if self.backend_domain.is_empty() || self.backend_domain.contains("://") {
            return Err(AppError::Config(
                "BACKEND_DOMAIN must be a bare host, e.g. api.kiwiscript.com".to_string()
            ));
        }

        if self.jwt_access_ttl_sec <= 0 || self.jwt_refresh_ttl_sec <= 0 {
            return Err(AppError::Config("token lifetimes must be positive".to_string()));
        }

        Ok(())
    }

    #[must_use]
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Where the OAuth flow hands the browser back to the web client.
    #[must_use]
    pub fn frontend_callback_url(&self) -> String {
        format!("https://{}/auth/callback", self.frontend_domain)
    }
}

// =====================================
// Builder Pattern
// =====================================
/// Builds a [`Config`] piece by piece, mostly for tests.
///
/// ```rust
/// use kiwiscript_api::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .port(8080)
///     .backend_domain("api.kiwiscript.com")
///     .build();
/// assert_eq!(config.port, 8080);
/// ```
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    #[must_use]
    pub fn backend_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.backend_domain = domain.into();
        self
    }

    #[must_use]
    pub fn frontend_domain(mut self, domain: impl Into<String>) -> Self {
        self.config.frontend_domain = domain.into();
        self
    }

    #[must_use]
    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    #[must_use]
    pub fn github_client_id(mut self, id: impl Into<String>) -> Self {
        self.config.github_client_id = id.into();
        self
    }

    #[must_use]
    pub fn google_client_id(mut self, id: impl Into<String>) -> Self {
        self.config.google_client_id = id.into();
        self
    }

    #[must_use]
    pub fn object_storage_host(mut self, host: impl Into<String>) -> Self {
        self.config.object_storage_host = host.into();
        self
    }

    #[must_use]
    pub fn environment(mut self, env: Environment) -> Self {
        self.config.environment = env;
        self
    }

    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }

    /// # Errors
    /// Same as [`Config::validate`].
    pub fn build_validated(self) -> Result<Config> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}
