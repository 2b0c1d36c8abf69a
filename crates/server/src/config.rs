//! # Application Configuration
//!
//! This module defines the configuration structure for the `shopadmin-server`
//! and provides the logic for loading it from an optional `config.yml` file
//! and environment variables. Top-level keys like `port` and `db_url` are
//! overridden by `PORT` and `DB_URL`; nested keys are overridden by
//! `SHOPADMIN_...` variables (e.g., `SHOPADMIN_ADMIN__USERNAME`).

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use regex::Regex;
use serde::Deserialize;
use std::env;
use std::fs;
use tracing::info;

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite database file. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Where uploaded plugin archives are staged and extracted.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// How long an admin session stays valid after login.
    #[serde(default = "default_session_lifetime")]
    pub session_lifetime_secs: u64,
    /// Seed credentials for the admin account created at startup.
    #[serde(default)]
    pub admin: AdminConfig,
}

/// Provides a default value for the `port` field if not set in the environment.
fn default_port() -> u16 {
    9090
}
/// Provides a default value for the `db_url` field if not set in the environment.
fn default_db_url() -> String {
    "db/shopadmin.db".to_string()
}

fn default_upload_dir() -> String {
    "uploads/plugins".to_string()
}

fn default_session_lifetime() -> u64 {
    3600
}

/// Seed credentials for the admin account. The account is created only if it
/// does not exist yet; an existing account keeps its stored password hash.
#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_username")]
    pub username: String,
    /// The seed password. Override this in any real deployment via
    /// `SHOPADMIN_ADMIN__PASSWORD`.
    #[serde(default = "default_admin_password")]
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: default_admin_username(),
            password: default_admin_password(),
        }
    }
}

fn default_admin_username() -> String {
    "admin".to_string()
}

fn default_admin_password() -> String {
    "admin".to_string()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let re = Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").unwrap();
    let expanded_content = re.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|_| "".to_string())
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// The `config.yml` file is optional; when it is absent, defaults and
/// environment variables fully define the configuration. An explicit
/// `config_path_override` that points at a missing file is an error.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = ConfigBuilder::builder();

    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        format!("{}/config.yml", env!("CARGO_MANIFEST_DIR"))
    };

    match read_and_substitute(&main_config_path)? {
        Some(content) => {
            info!("Loading configuration from '{main_config_path}'.");
            builder = builder.add_source(File::from_str(&content, FileFormat::Yaml));
        }
        None if config_path_override.is_some() => {
            return Err(ConfigError::NotFound(format!(
                "Config file not found at '{main_config_path}'."
            )));
        }
        None => {
            info!("No '{main_config_path}' found; using defaults and environment variables.");
        }
    }

    let settings = builder
        // Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("SHOPADMIN")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
