//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

/// Default number of accounts per result page when the user has no preference
pub const DEFAULT_ACCOUNT_COUNT: i64 = 12;

/// Lockbox configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub search: SearchConfig,
    pub auth: AuthConfig,
    pub database: DatabaseSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size used when the user has no results-per-page preference
    pub account_count: i64,
    /// Results are displayed as cards (shorter text fields)
    pub results_as_cards: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub ldap_enabled: bool,
    /// Directory group required to log in, `*` for any
    pub ldap_group: String,
    pub ldap_server: String,
    pub ldap_base: String,
    /// Public URL used in password recovery messages
    pub base_url: String,
    /// Recovery requests allowed per user inside `recovery_window_secs`
    pub recovery_limit: u32,
    pub recovery_window_secs: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            auth: AuthConfig::default(),
            database: DatabaseSection { path: None },
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            account_count: DEFAULT_ACCOUNT_COUNT,
            results_as_cards: false,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            ldap_enabled: false,
            ldap_group: "*".to_string(),
            ldap_server: String::new(),
            ldap_base: String::new(),
            base_url: "http://localhost".to_string(),
            recovery_limit: 3,
            recovery_window_secs: 3600,
        }
    }
}

impl SearchConfig {
    /// Maximum length of free-text fields in search results
    pub fn text_max_length(&self) -> usize {
        if self.results_as_cards { 40 } else { 60 }
    }
}

impl AuthConfig {
    /// Whether the directory settings are complete enough to attempt a bind
    pub fn ldap_params_ok(&self) -> bool {
        !self.ldap_server.trim().is_empty()
            && !self.ldap_base.trim().is_empty()
            && !self.ldap_group.trim().is_empty()
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var("LOCKBOX_CONFIG_DIR") {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("lockbox")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> anyhow::Result<()> {
        self.validate()?;

        let dir = Self::config_dir()?;
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;

        let path = Self::config_path()?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.search.account_count < 0 {
            return Err(anyhow!("search.account_count must be non-negative"));
        }
        if self.auth.recovery_window_secs <= 0 {
            return Err(anyhow!("auth.recovery_window_secs must be positive"));
        }
        Ok(())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "search.account_count" => Ok(self.search.account_count.to_string()),
            "search.results_as_cards" => Ok(self.search.results_as_cards.to_string()),

            "auth.ldap_enabled" => Ok(self.auth.ldap_enabled.to_string()),
            "auth.ldap_group" => Ok(self.auth.ldap_group.clone()),
            "auth.ldap_server" => Ok(self.auth.ldap_server.clone()),
            "auth.ldap_base" => Ok(self.auth.ldap_base.clone()),
            "auth.base_url" => Ok(self.auth.base_url.clone()),
            "auth.recovery_limit" => Ok(self.auth.recovery_limit.to_string()),
            "auth.recovery_window_secs" => Ok(self.auth.recovery_window_secs.to_string()),

            "database.path" => Ok(self
                .database
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(default)".to_string())),

            _ => Err(anyhow!(
                "Unknown configuration key: {}. Use `lockbox config list` to see available keys.",
                key
            )),
        }
    }

    /// Set a configuration value by key
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "search.account_count" => {
                let count: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid account_count value: {}", value))?;
                if count < 0 {
                    return Err(anyhow!("Account count must be non-negative"));
                }
                self.search.account_count = count;
            }
            "search.results_as_cards" => {
                self.search.results_as_cards = parse_bool(value)?;
            }
            "auth.ldap_enabled" => {
                self.auth.ldap_enabled = parse_bool(value)?;
            }
            "auth.ldap_group" => {
                if value.trim().is_empty() {
                    return Err(anyhow!("Directory group cannot be empty, use `*` for any"));
                }
                self.auth.ldap_group = value.to_string();
            }
            "auth.ldap_server" => {
                self.auth.ldap_server = value.to_string();
            }
            "auth.ldap_base" => {
                self.auth.ldap_base = value.to_string();
            }
            "auth.base_url" => {
                self.auth.base_url = value.trim_end_matches('/').to_string();
            }
            "auth.recovery_limit" => {
                self.auth.recovery_limit = value
                    .parse()
                    .with_context(|| format!("Invalid recovery_limit value: {}", value))?;
            }
            "auth.recovery_window_secs" => {
                let secs: i64 = value
                    .parse()
                    .with_context(|| format!("Invalid recovery_window_secs value: {}", value))?;
                if secs <= 0 {
                    return Err(anyhow!("Recovery window must be positive"));
                }
                self.auth.recovery_window_secs = secs;
            }
            "database.path" => {
                self.database.path = Some(PathBuf::from(value));
            }
            _ => {
                return Err(anyhow!(
                    "Unknown configuration key: {}. Use `lockbox config list` to see available keys.",
                    key
                ));
            }
        }
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        let keys = vec![
            "search.account_count",
            "search.results_as_cards",
            "auth.ldap_enabled",
            "auth.ldap_group",
            "auth.ldap_server",
            "auth.ldap_base",
            "auth.base_url",
            "auth.recovery_limit",
            "auth.recovery_window_secs",
            "database.path",
        ];

        keys.into_iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        let path = Self::config_path()?;
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> anyhow::Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("Invalid boolean value: {}", value)),
    }
}
