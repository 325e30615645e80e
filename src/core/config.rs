//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.japps/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::HubClientConfig;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct JappsConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub hub: HubConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub log_file: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HubConfig {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub retries: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/services/japps";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
/// One automatic retry before a failure is surfaced.
pub const DEFAULT_RETRIES: u32 = 1;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;
pub const DEFAULT_LOG_FILE: &str = "japps.log";
pub const DEFAULT_LOG_LEVEL: &str = "debug";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub api_token: Option<String>,
    pub request_timeout: Duration,
    pub retries: u32,
    pub retry_delay: Duration,
    pub log_file: String,
    pub log_level: String,
}

impl ResolvedConfig {
    pub fn hub_client_config(&self) -> HubClientConfig {
        HubClientConfig {
            base_url: self.base_url.clone(),
            api_token: self.api_token.clone(),
            timeout: self.request_timeout,
            retries: self.retries,
            retry_delay: self.retry_delay,
        }
    }
}

/// Values given on the command line. `None` = not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub api_token: Option<String>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.japps/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".japps").join("config.toml"))
}

/// Load config from `~/.japps/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `JappsConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<JappsConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(JappsConfig::default());
        }
    };

    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(&path);
        return Ok(JappsConfig::default());
    }

    let contents = fs::read_to_string(&path).map_err(ConfigError::Io)?;
    let config = parse_config(&contents)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

pub fn parse_config(contents: &str) -> Result<JappsConfig, ConfigError> {
    let config: JappsConfig = toml::from_str(contents).map_err(ConfigError::Parse)?;
    // Token stays out of the log
    debug!(
        "Config: general={:?}, hub.base_url={:?}, hub.retries={:?}",
        config.general, config.hub.base_url, config.hub.retries
    );
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &PathBuf) {
    let default_content = r#"# japps Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# log_file = "japps.log"
# log_level = "debug"                # "error", "warn", "info", "debug", "trace"

# [hub]
# base_url = "http://localhost:8000/services/japps"   # Or set JAPPS_BASE_URL
# api_token = "..."                  # Or set JUPYTERHUB_API_TOKEN
# request_timeout_secs = 30
# retries = 1                        # Automatic retries before an error is shown
# retry_delay_ms = 1000
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &JappsConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`] with an injectable environment lookup.
pub fn resolve_with_env(
    config: &JappsConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env("JAPPS_BASE_URL"))
        .or_else(|| config.hub.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Token: CLI → env → config
    let api_token = cli
        .api_token
        .clone()
        .or_else(|| env("JUPYTERHUB_API_TOKEN"))
        .or_else(|| config.hub.api_token.clone());

    // Log level: env → config → default
    let log_level = env("JAPPS_LOG_LEVEL")
        .or_else(|| config.general.log_level.clone())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    ResolvedConfig {
        base_url,
        api_token,
        request_timeout: Duration::from_secs(
            config
                .hub
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        ),
        retries: config.hub.retries.unwrap_or(DEFAULT_RETRIES),
        retry_delay: Duration::from_millis(
            config.hub.retry_delay_ms.unwrap_or(DEFAULT_RETRY_DELAY_MS),
        ),
        log_file: config
            .general
            .log_file
            .clone()
            .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        log_level,
    }
}
