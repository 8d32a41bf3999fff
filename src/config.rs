// File: ./src/config.rs
// Handles configuration loading, environment overrides, validation and defaults.
use crate::context::AppContext;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::time::Duration;
use thiserror::Error;

/// Prefix of the environment variables that override config file values.
pub const ENV_PREFIX: &str = "SKYSYNC_";

fn default_true() -> bool {
    true
}

fn default_webdriver_url() -> String {
    "http://localhost:9515".to_string()
}

fn default_login_timeout() -> u64 {
    10
}

fn default_calendar_timeout() -> u64 {
    30
}

fn default_render_timeout() -> u64 {
    30
}

fn default_api_base() -> String {
    "https://api.notion.com/v1".to_string()
}

fn default_api_version() -> String {
    "2022-06-28".to_string()
}

fn default_max_retries() -> usize {
    3
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required configuration: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Config {
    /// Sign-in page of the student information system.
    #[serde(default)]
    pub auth_url: String,
    /// Deep link into the calendar (carries the date range parameters).
    #[serde(default)]
    pub calendar_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub notion_token: String,
    #[serde(default)]
    pub database_id: String,

    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_true")]
    pub headless: bool,

    #[serde(default = "default_login_timeout")]
    pub login_timeout_secs: u64,
    #[serde(default = "default_calendar_timeout")]
    pub calendar_timeout_secs: u64,
    #[serde(default = "default_render_timeout")]
    pub render_timeout_secs: u64,

    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            auth_url: String::new(),
            calendar_url: String::new(),
            username: String::new(),
            password: String::new(),
            notion_token: String::new(),
            database_id: String::new(),
            // Match the serde defaults
            webdriver_url: default_webdriver_url(),
            headless: true,
            login_timeout_secs: 10,
            calendar_timeout_secs: 30,
            render_timeout_secs: 30,
            api_base: default_api_base(),
            api_version: default_api_version(),
            max_retries: 3,
        }
    }
}

impl Config {
    /// Load the configuration using an explicit context, then apply
    /// `SKYSYNC_*` environment overrides.
    ///
    /// A missing config file is not an error: everything may come from the
    /// environment. Presence of the required keys is checked separately by
    /// [`Config::validate`].
    pub fn load(ctx: &dyn AppContext) -> Result<Self> {
        let path = ctx.get_config_file_path()?;

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e)
            })?;
            toml::from_str::<Config>(&contents).map_err(|e| {
                anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e)
            })?
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup. `lookup` receives the full
    /// variable name (e.g. `SKYSYNC_PASSWORD`).
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |field: &str| lookup(&format!("{}{}", ENV_PREFIX, field.to_uppercase()));

        for (field, slot) in [
            ("auth_url", &mut self.auth_url),
            ("calendar_url", &mut self.calendar_url),
            ("username", &mut self.username),
            ("password", &mut self.password),
            ("notion_token", &mut self.notion_token),
            ("database_id", &mut self.database_id),
            ("webdriver_url", &mut self.webdriver_url),
            ("api_base", &mut self.api_base),
            ("api_version", &mut self.api_version),
        ] {
            if let Some(v) = get(field) {
                *slot = v;
            }
        }

        if let Some(v) = get("headless") {
            self.headless = parse_bool("headless", &v)?;
        }
        for (field, slot) in [
            ("login_timeout_secs", &mut self.login_timeout_secs),
            ("calendar_timeout_secs", &mut self.calendar_timeout_secs),
            ("render_timeout_secs", &mut self.render_timeout_secs),
        ] {
            if let Some(v) = get(field) {
                *slot = parse_number(field, &v)?;
            }
        }
        if let Some(v) = get("max_retries") {
            self.max_retries = parse_number("max_retries", &v)?;
        }
        Ok(())
    }

    /// Check that every value the pipeline needs is present.
    /// All missing keys are reported at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require(&[
            ("auth_url", &self.auth_url),
            ("calendar_url", &self.calendar_url),
            ("username", &self.username),
            ("password", &self.password),
            ("webdriver_url", &self.webdriver_url),
            ("notion_token", &self.notion_token),
            ("database_id", &self.database_id),
        ])
    }

    /// Like [`Config::validate`] but without the record-store keys.
    pub fn validate_for_extraction(&self) -> Result<(), ConfigError> {
        Self::require(&[
            ("auth_url", &self.auth_url),
            ("calendar_url", &self.calendar_url),
            ("username", &self.username),
            ("password", &self.password),
            ("webdriver_url", &self.webdriver_url),
        ])
    }

    fn require(values: &[(&'static str, &String)]) -> Result<(), ConfigError> {
        let missing: Vec<&'static str> = values
            .iter()
            .filter(|(_, v)| v.trim().is_empty())
            .map(|(k, _)| *k)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Missing(missing))
        }
    }

    /// Write a template config file. Refuses to overwrite an existing one.
    pub fn write_template(ctx: &dyn AppContext) -> Result<std::path::PathBuf> {
        let path = ctx.get_config_file_path()?;
        if path.exists() {
            return Err(anyhow::anyhow!(
                "Config file '{}' already exists",
                path.display()
            ));
        }
        let toml_str = toml::to_string_pretty(&Config::default())?;
        fs::write(&path, toml_str).map_err(|e| {
            anyhow::anyhow!("Failed to write config file '{}': {}", path.display(), e)
        })?;
        Ok(path)
    }

    /// Get the config file path as a string using an explicit context.
    pub fn path_string(ctx: &dyn AppContext) -> Result<String> {
        let path = ctx.get_config_file_path()?;
        Ok(path.to_string_lossy().to_string())
    }

    pub fn login_timeout(&self) -> Duration {
        Duration::from_secs(self.login_timeout_secs)
    }

    pub fn calendar_timeout(&self) -> Duration {
        Duration::from_secs(self.calendar_timeout_secs)
    }

    pub fn render_timeout(&self) -> Duration {
        Duration::from_secs(self.render_timeout_secs)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        })
}
