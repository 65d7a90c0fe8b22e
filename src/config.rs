//! Optional configuration for the Software Add-on client.
//!
//! Nothing in this crate reads configuration on its own; it is loaded only
//! when the host application calls [`get_config`] / [`WooConfig::load`] or
//! builds a client with [`SoftwareAddOn::from_config`](crate::SoftwareAddOn::from_config).
//!
//! Configuration is loaded from multiple sources with the following precedence:
//! 1. Environment variables (highest priority)
//! 2. `woo_software.toml` file
//! 3. Default values (lowest priority)
//!
//! # Environment Variables
//!
//! - `WOO_SOFTWARE_HOST` - Host name of the WooCommerce site
//! - `WOO_SOFTWARE_BASE_URL` - Base URL (scheme, host and port only), overrides the `https://<host>` default
//! - `WOO_SOFTWARE_PRODUCT_ID` - Product id licenses are issued for
//! - `WOO_SOFTWARE_EMAIL` - Email bound to the client
//! - `WOO_SOFTWARE_TIMEOUT_SECS` - Request timeout in seconds (0 = no timeout)
//! - `WOO_SOFTWARE_ACTIVATION_PLATFORM` - Default platform sent on activation
//! - `WOO_SOFTWARE_CHECK_PLATFORM` - Default platform matched on check
//! - `WOO_SOFTWARE_LOGGING_ENABLED` - Install a log subscriber in [`crate::logging::init_logging`]
//! - `WOO_SOFTWARE_LOG_LEVEL` - Log level (trace, debug, info, warn, error)
//!
//! Platform settings accept `system` (the local system-info string), `none`
//! (no platform) or any literal platform name. The names `system` and `none`
//! are always read as these keywords, so a platform literally called
//! `system` or `none` can only be passed per call with [`Platform::Named`].

use config::Config;
use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::sync::OnceLock;
use std::time::Duration;

use crate::client::matcher::Platform;
use crate::errors::{LicenseError, LicenseResult};

/// Global configuration singleton.
static CONFIG: OnceLock<WooConfig> = OnceLock::new();

/// Name of the optional configuration file (extension is resolved by `config`).
pub const CONFIG_FILE: &str = "woo_software";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WooConfig {
    /// Remote site and bound values
    pub api: ApiConfig,
    /// Platform defaults
    pub platform: PlatformConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Remote site configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Host name of the WooCommerce site
    pub host: String,
    /// Base URL without a path (`http://127.0.0.1:8080`); when set it takes
    /// precedence over `host`
    pub base_url: String,
    /// Product id licenses are issued for
    pub product_id: String,
    /// Email bound to the client (empty = none)
    pub email: String,
    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn email(&self) -> Option<&str> {
        Some(self.email.as_str()).filter(|e| !e.is_empty())
    }
}

/// Default platforms used when a call does not name one.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Platform sent with `activation`
    pub activation: String,
    /// Platform matched by `check`
    pub check: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            activation: "system".to_string(),
            check: "system".to_string(),
        }
    }
}

impl PlatformConfig {
    pub fn activation_platform(&self) -> Platform {
        Platform::from_setting(&self.activation)
    }

    pub fn check_platform(&self) -> Platform {
        Platform::from_setting(&self.check)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
        }
    }
}

fn config_error(e: config::ConfigError) -> LicenseError {
    LicenseError::ConfigError(e.to_string())
}

impl WooConfig {
    /// Load configuration from `woo_software.toml` and the environment.
    ///
    /// Unlike [`get_config`] this always reads the sources again.
    pub fn load() -> LicenseResult<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load configuration using `file` (path without extension) as the file source.
    ///
    /// Configuration is loaded in this order (later sources override earlier):
    /// 1. Default values
    /// 2. The configuration file (optional)
    /// 3. Environment variables
    pub fn load_from(file: &str) -> LicenseResult<Self> {
        let builder = Config::builder()
            // Start with defaults
            .set_default("api.host", "")
            .map_err(config_error)?
            .set_default("api.base_url", "")
            .map_err(config_error)?
            .set_default("api.product_id", "")
            .map_err(config_error)?
            .set_default("api.email", "")
            .map_err(config_error)?
            .set_default("api.timeout_secs", 0)
            .map_err(config_error)?
            .set_default("platform.activation", "system")
            .map_err(config_error)?
            .set_default("platform.check", "system")
            .map_err(config_error)?
            .set_default("logging.enabled", false)
            .map_err(config_error)?
            .set_default("logging.level", "info")
            .map_err(config_error)?
            // Load from the configuration file (optional)
            .add_source(config::File::with_name(file).required(false))
            // Override with environment variables
            .set_override_option("api.host", env::var("WOO_SOFTWARE_HOST").ok())
            .map_err(config_error)?
            .set_override_option("api.base_url", env::var("WOO_SOFTWARE_BASE_URL").ok())
            .map_err(config_error)?
            .set_override_option("api.product_id", env::var("WOO_SOFTWARE_PRODUCT_ID").ok())
            .map_err(config_error)?
            .set_override_option("api.email", env::var("WOO_SOFTWARE_EMAIL").ok())
            .map_err(config_error)?
            .set_override_option(
                "api.timeout_secs",
                env::var("WOO_SOFTWARE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse::<i64>().ok()),
            )
            .map_err(config_error)?
            .set_override_option(
                "platform.activation",
                env::var("WOO_SOFTWARE_ACTIVATION_PLATFORM").ok(),
            )
            .map_err(config_error)?
            .set_override_option("platform.check", env::var("WOO_SOFTWARE_CHECK_PLATFORM").ok())
            .map_err(config_error)?
            .set_override_option(
                "logging.enabled",
                env::var("WOO_SOFTWARE_LOGGING_ENABLED")
                    .ok()
                    .and_then(|v| v.parse::<bool>().ok()),
            )
            .map_err(config_error)?
            .set_override_option("logging.level", env::var("WOO_SOFTWARE_LOG_LEVEL").ok())
            .map_err(config_error)?;

        let settings = builder
            .build()
            .map_err(|e| LicenseError::ConfigError(format!("failed to build config: {e}")))?;

        let config: Self = settings
            .try_deserialize()
            .map_err(|e| LicenseError::ConfigError(format!("failed to deserialize config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.api.host.contains('/') {
            return Err(LicenseError::ConfigError(format!(
                "api.host must be a bare host name, got '{}' (use api.base_url for URLs)",
                self.api.host
            )));
        }

        if !self.api.base_url.is_empty()
            && !(self.api.base_url.starts_with("https://") || self.api.base_url.starts_with("http://"))
        {
            return Err(LicenseError::ConfigError(format!(
                "api.base_url must start with http:// or https://, got '{}'",
                self.api.base_url
            )));
        }

        if !self.api.base_url.is_empty() {
            let base = Url::parse(&self.api.base_url).map_err(|e| {
                LicenseError::ConfigError(format!("api.base_url '{}': {e}", self.api.base_url))
            })?;
            if base.path() != "/" || base.query().is_some() {
                return Err(LicenseError::ConfigError(format!(
                    "api.base_url must not carry a path or query, got '{}'",
                    self.api.base_url
                )));
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(LicenseError::ConfigError(format!(
                    "logging.level must be one of: trace, debug, info, warn, error. Got '{other}'"
                )));
            }
        }

        Ok(())
    }

    /// Validate that a client can be built from this configuration.
    pub fn validate_client(&self) -> LicenseResult<()> {
        if self.api.host.is_empty() && self.api.base_url.is_empty() {
            return Err(LicenseError::ConfigError(
                "either api.host or api.base_url must be set".to_string(),
            ));
        }
        if self.api.product_id.is_empty() {
            return Err(LicenseError::ConfigError(
                "api.product_id cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the global configuration.
///
/// This loads the configuration on first access and caches it.
/// Returns an error if configuration loading or validation fails.
pub fn get_config() -> LicenseResult<&'static WooConfig> {
    if let Some(config) = CONFIG.get() {
        return Ok(config);
    }

    let config = WooConfig::load()?;

    // Another thread may have won the race; either value is equivalent.
    Ok(CONFIG.get_or_init(|| config))
}
