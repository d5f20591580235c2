//! Layered configuration for the CLI
//!
//! Defaults, then `config.toml` under the platform config directory, then
//! `ANIDB_UDP_*` environment variables with `__` separating nested keys
//! (`ANIDB_UDP_SERVER__HOST`, `ANIDB_UDP_ACCOUNT__PASSWORD`).

use crate::output::OutputFormat;
use crate::paths;
use anidb_udp_core::SecureString;
use anidb_udp_core::protocol::codec::TextEncoding;
use anidb_udp_core::protocol::{
    ClientIdentity, Credentials, EngineConfig, ServerEndpoint, TuningConfig,
};
use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "ANIDB_UDP_";

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerEndpoint,

    #[serde(default)]
    pub client: ClientIdentity,

    #[serde(default = "default_encoding")]
    pub encoding: TextEncoding,

    #[serde(default)]
    pub tuning: TuningConfig,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// AniDB account; the password is never written back out
#[derive(Deserialize, Serialize, Debug, Default, Clone)]
pub struct AccountConfig {
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    pub password: Option<SecureString>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    /// Format when `--format` is not given
    pub default_format: OutputFormat,
    pub color_enabled: bool,
}

fn default_encoding() -> TextEncoding {
    EngineConfig::default().encoding
}

impl Default for AppConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            server: engine.server,
            client: engine.client,
            encoding: engine.encoding,
            tuning: engine.tuning,
            account: AccountConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_format: OutputFormat::Text,
            color_enabled: true,
        }
    }
}

impl AppConfig {
    /// Engine configuration with the given credentials
    pub fn engine_config(&self, credentials: Option<Credentials>) -> EngineConfig {
        EngineConfig {
            server: self.server.clone(),
            client: self.client.clone(),
            encoding: self.encoding,
            credentials,
            tuning: self.tuning.clone(),
        }
    }

    /// Credentials when both username and password are configured
    pub fn credentials(&self) -> Option<Credentials> {
        let username = self.account.username.as_deref()?;
        let password = self.account.password.clone()?;
        Some(Credentials::new(username, password))
    }
}

/// Loads and edits the configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigManager {
    /// Manager for the platform configuration file
    pub fn new() -> Self {
        Self {
            config_path: paths::get_config_path(),
        }
    }

    /// Manager for a specific file (for testing)
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    pub fn get_config_path(&self) -> PathBuf {
        self.config_path.clone()
    }

    /// Load configuration with layered priority: ENV > File > Defaults
    pub fn load(&self) -> Result<AppConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(AppConfig::default()));

        if self.config_path.exists() {
            figment = figment.merge(Toml::file(&self.config_path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to load configuration")
    }

    /// Effective configuration as TOML, password omitted
    pub fn show(&self) -> Result<String> {
        let config = self.load()?;
        toml::to_string_pretty(&config).context("Failed to render configuration")
    }

    /// Get a configuration value by dotted key
    pub fn get(&self, key: &str) -> Result<String> {
        let config = self.load()?;
        let value = toml::Value::try_from(&config)?;

        let mut current = &value;
        for part in key.split('.') {
            current = current
                .get(part)
                .ok_or_else(|| anyhow::anyhow!("Key '{key}' not found"))?;
        }

        match current {
            toml::Value::String(s) => Ok(s.clone()),
            toml::Value::Integer(i) => Ok(i.to_string()),
            toml::Value::Boolean(b) => Ok(b.to_string()),
            toml::Value::Float(f) => Ok(f.to_string()),
            _ => anyhow::bail!("Value at '{key}' is not a simple type"),
        }
    }

    /// Set a configuration value by dotted key in the configuration file
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parsed = parse_config_value(key, value)?;

        let mut document = if self.config_path.exists() {
            let content = fs::read_to_string(&self.config_path)?;
            toml::from_str(&content)?
        } else {
            toml::Value::Table(toml::map::Map::new())
        };

        let parts: Vec<&str> = key.split('.').collect();
        let Some((last, sections)) = parts.split_last() else {
            anyhow::bail!("Empty key");
        };

        let mut current = &mut document;
        for part in sections {
            let toml::Value::Table(table) = current else {
                anyhow::bail!("Invalid key path: expected table at '{part}'");
            };
            current = table
                .entry(part.to_string())
                .or_insert(toml::Value::Table(toml::map::Map::new()));
        }
        let toml::Value::Table(table) = current else {
            anyhow::bail!("Cannot set value on non-table");
        };
        table.insert(last.to_string(), parsed);

        // Reject files that no longer load
        let candidate: AppConfig = Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::string(&toml::to_string(&document)?))
            .extract()
            .with_context(|| format!("Invalid value for {key}"))?;
        log::debug!("Configuration now targets {}", candidate.server);

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.config_path, toml::to_string_pretty(&document)?)?;
        Ok(())
    }
}

/// Parse a value to the TOML type its key expects
fn parse_config_value(key: &str, value: &str) -> Result<toml::Value> {
    match key {
        "server.port" | "server.local_port" | "client.version" => {
            let number: u32 = value.parse().context("Expected a positive integer")?;
            Ok(toml::Value::Integer(number.into()))
        }
        k if k.starts_with("tuning.") => {
            let number: u64 = value.parse().context("Expected a positive integer")?;
            Ok(toml::Value::Integer(
                i64::try_from(number).context("Value too large")?,
            ))
        }
        "output.color_enabled" => {
            let flag: bool = value.parse().context("Value must be 'true' or 'false'")?;
            Ok(toml::Value::Boolean(flag))
        }
        "encoding" => match value {
            "ascii" | "utf-16" | "utf16" => Ok(toml::Value::String(value.to_string())),
            _ => anyhow::bail!("encoding must be 'ascii' or 'utf-16'"),
        },
        "account.password" => {
            anyhow::bail!("Set the password through {ENV_PREFIX}ACCOUNT__PASSWORD instead")
        }
        _ => Ok(toml::Value::String(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "api.anidb.net");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.encoding, TextEncoding::Utf16);
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_credentials_need_both_fields() {
        let mut config = AppConfig::default();
        config.account.username = Some("bob".to_string());
        assert!(config.credentials().is_none());

        config.account.password = Some(SecureString::from("secret"));
        let credentials = config.credentials().unwrap();
        assert_eq!(credentials.username, "bob");

        let engine = config.engine_config(Some(credentials));
        assert!(engine.credentials.is_some());
        assert_eq!(engine.server, config.server);
    }

    #[test]
    fn test_parse_config_value() {
        assert_eq!(
            parse_config_value("server.port", "9001").unwrap(),
            toml::Value::Integer(9001)
        );
        assert!(parse_config_value("server.port", "x").is_err());
        assert!(parse_config_value("encoding", "latin1").is_err());
        assert!(parse_config_value("account.password", "secret").is_err());
        assert_eq!(
            parse_config_value("account.username", "bob").unwrap(),
            toml::Value::String("bob".to_string())
        );
    }
}
