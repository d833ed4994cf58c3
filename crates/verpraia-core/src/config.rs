use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;

/// Default IMA-SC balneability API base.
pub const DEFAULT_API_BASE_URL: &str = "https://balneabilidade.ima.sc.gov.br";

/// Origin header value the upstream API expects on every call.
pub const DEFAULT_API_ORIGIN: &str = "https://balneabilidade.ima.sc.gov.br";

/// Default per-request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

pub const ENV_API_BASE_URL: &str = "VERPRAIA_API_BASE_URL";
pub const ENV_API_ORIGIN: &str = "VERPRAIA_API_ORIGIN";
pub const ENV_API_TIMEOUT_MS: &str = "VERPRAIA_API_TIMEOUT_MS";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Upstream balneability API settings
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value sent in the `Origin` header of every request
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_origin() -> String {
    DEFAULT_API_ORIGIN.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            origin: default_origin(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Config {
    /// Resolve the process-wide configuration: defaults, then the config
    /// file, then `VERPRAIA_API_*` environment overrides.
    pub fn resolve() -> Result<Self> {
        let mut config = Self::load()?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if
    /// the file is missing.
    ///
    /// Failing to write the defaults is not fatal; the defaults are used.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(config_path) {
                tracing::warn!(
                    "Could not write default config to {}: {:#}",
                    config_path.display(),
                    e
                );
            }
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Resolve configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn resolve_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::resolve()?;
        let validation = config.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Overlay environment-style overrides on top of the loaded values.
    ///
    /// `lookup` maps a variable name to its value, if set.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_API_BASE_URL) {
            tracing::debug!("Overriding api.base_url from {}", ENV_API_BASE_URL);
            self.api.base_url = base_url;
        }

        if let Some(origin) = lookup(ENV_API_ORIGIN) {
            tracing::debug!("Overriding api.origin from {}", ENV_API_ORIGIN);
            self.api.origin = origin;
        }

        if let Some(raw) = lookup(ENV_API_TIMEOUT_MS) {
            self.api.timeout_ms = raw.trim().parse().map_err(|_| {
                ConfigError::Invalid(format!(
                    "{} must be a whole number of milliseconds, got {:?}",
                    ENV_API_TIMEOUT_MS, raw
                ))
            })?;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.api.base_url, "api.base_url", &mut result);
        validate_url(&self.api.origin, "api.origin", &mut result);

        if self.api.timeout_ms == 0 {
            result.add_error("api.timeout_ms", "Timeout must be greater than 0");
        } else if self.api.timeout_ms > 120_000 {
            result.add_warning(
                "api.timeout_ms",
                "Timeout is unusually long (more than 2 minutes)",
            );
        }

        result
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ConfigError::NotFound("platform config directory".to_string()))?
            .join("verpraia");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
