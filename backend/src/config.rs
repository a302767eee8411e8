//! Configuration management for the FAPECAFES report gateway
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with FAPE__ prefix

use std::time::Duration;

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Upstream REST backend
    pub upstream: UpstreamConfig,

    /// Snapshot refresh scheduling
    pub refresh: RefreshConfig,

    /// JWT authentication configuration for the served API
    pub jwt: JwtConfig,

    /// Exported document settings
    pub report: ReportConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the REST API, e.g. `https://api.fapecafes.org/api/`
    pub base_url: String,

    /// Static bearer token; takes precedence over username/password
    pub token: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    /// Token endpoint used with username/password, relative to `base_url`
    pub token_path: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Also fetch tasks, unloadings and machinery usage for accounting
    pub include_activity: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RefreshConfig {
    /// Run the periodic refresh loop
    pub enabled: bool,

    /// Seconds between refreshes
    pub interval_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for verifying API bearer tokens
    pub secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    /// Organization name printed in document titles
    pub organization: String,

    /// Footer line printed on every PDF page
    pub footer: String,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("FAPE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("upstream.base_url", "http://localhost:8000/api/")?
            .set_default("upstream.token_path", "token/")?
            .set_default("upstream.timeout_secs", 30)?
            .set_default("upstream.include_activity", true)?
            .set_default("refresh.enabled", true)?
            .set_default("refresh.interval_secs", 300)?
            .set_default("jwt.secret", "development-secret-key")?
            .set_default("report.organization", "FAPECAFE")?
            .set_default("report.footer", "FAPECAFE - Sistema de Gestión de Café")?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (FAPE_ prefix)
            .add_source(
                Environment::with_prefix("FAPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl RefreshConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(5))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            organization: "FAPECAFE".to_string(),
            footer: "FAPECAFE - Sistema de Gestión de Café".to_string(),
        }
    }
}
