//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub ai: AiConfig,
    pub catalog: CatalogConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 8080)
    pub port: u16,
    /// Public domain (e.g., "catalog.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
}

impl ServerConfig {
    /// Get the base URL for the instance
    ///
    /// # Returns
    /// Full URL like "https://catalog.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Storage backend selector
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Volatile in-process collections
    #[default]
    Memory,
    /// SQLite file holding JSON documents
    Sqlite,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    /// Path to SQLite database file (sqlite backend only)
    pub path: PathBuf,
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Key shared with the identity provider for signing identity tokens (32+ bytes)
    pub identity_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
    /// Emails granted the admin role on sign-in
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl AuthConfig {
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email.trim()))
    }
}

/// Text generation provider (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// Base URL, e.g. "https://api.openai.com/v1"
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_seconds: u64,
}

/// Listing and ledger tuning
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Public listing page size (default: 12)
    pub page_size: usize,
    /// Admin listing page size (default: 20)
    pub admin_page_size: usize,
    /// Related items on detail pages (default: 3)
    pub related_limit: usize,
    /// Watch history entries kept per user (default: 100)
    pub history_retention: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (ATELIER__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("server.domain", "localhost")?
            .set_default("server.protocol", "http")?
            .set_default("database.backend", "memory")?
            .set_default("database.path", "data/atelier.db")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("ai.enabled", false)?
            .set_default("ai.endpoint", "https://api.openai.com/v1")?
            .set_default("ai.model", "gpt-4o-mini")?
            .set_default("ai.timeout_seconds", 30)?
            .set_default("catalog.page_size", 12)?
            .set_default("catalog.admin_page_size", 20)?
            .set_default("catalog.related_limit", 3)?
            .set_default("catalog.history_retention", 100)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (ATELIER__*)
            .add_source(
                Environment::with_prefix("ATELIER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.admin_emails")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.len() < MIN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if self.auth.identity_secret.len() < MIN_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.identity_secret must be at least {} bytes",
                MIN_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        if self.catalog.page_size == 0 || self.catalog.admin_page_size == 0 {
            return Err(crate::error::AppError::Config(
                "catalog page sizes must be greater than 0".to_string(),
            ));
        }

        if self.catalog.history_retention == 0 {
            return Err(crate::error::AppError::Config(
                "catalog.history_retention must be greater than 0".to_string(),
            ));
        }

        if self.ai.enabled && url::Url::parse(&self.ai.endpoint).is_err() {
            return Err(crate::error::AppError::Config(format!(
                "ai.endpoint is not a valid URL: {}",
                self.ai.endpoint
            )));
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
