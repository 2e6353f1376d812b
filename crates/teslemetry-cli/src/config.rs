//! Configuration file handling for the teslemetry CLI

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use teslemetry_stream::StreamConfig;

/// Configuration for the CLI tool
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Access token
    pub token: Option<String>,
    /// Default vehicle
    pub vin: Option<String>,
    /// Streaming server, discovered when absent
    pub server: Option<String>,
    /// REST API base
    pub api_base: Option<String>,
    /// Default output format
    pub output: Option<String>,
    /// Disable colored output
    pub no_color: Option<bool>,
}

impl Config {
    /// Load configuration from the default config file
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("teslemetry");

        Ok(config_dir.join("config.toml"))
    }

    /// Merge CLI arguments over config file values
    pub fn merge_with_args(&self, args: Overrides<'_>) -> MergedConfig {
        MergedConfig {
            token: args.token.map(String::from).or_else(|| self.token.clone()),
            vin: args.vin.map(String::from).or_else(|| self.vin.clone()),
            server: args.server.map(String::from).or_else(|| self.server.clone()),
            api_base: self.api_base.clone(),
            output: args
                .output
                .map(String::from)
                .or_else(|| self.output.clone())
                .unwrap_or_else(|| "table".to_string()),
            no_color: args.no_color || self.no_color.unwrap_or(false),
        }
    }
}

/// Values given on the command line or through the environment
#[derive(Debug, Default, Clone, Copy)]
pub struct Overrides<'a> {
    pub token: Option<&'a str>,
    pub vin: Option<&'a str>,
    pub server: Option<&'a str>,
    pub output: Option<&'a str>,
    pub no_color: bool,
}

/// Fully resolved configuration after merging CLI args
#[derive(Debug, Clone)]
pub struct MergedConfig {
    pub token: Option<String>,
    pub vin: Option<String>,
    pub server: Option<String>,
    pub api_base: Option<String>,
    pub output: String,
    pub no_color: bool,
}

impl MergedConfig {
    /// Build the library configuration; fails without a token
    pub fn stream_config(&self) -> Result<StreamConfig> {
        let token = self
            .token
            .as_deref()
            .context("No access token: pass --token or set TESLEMETRY_TOKEN")?;

        let mut builder = StreamConfig::builder(token);
        if let Some(vin) = &self.vin {
            builder = builder.vin(vin.as_str());
        }
        if let Some(server) = &self.server {
            builder = builder.server(server.as_str());
        }
        if let Some(api_base) = &self.api_base {
            builder = builder.api_base(api_base.as_str());
        }

        let config = builder.build();
        config.validate().context("Invalid stream configuration")?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_file() {
        let config: Config = toml::from_str(
            r#"
token = "file-token"
vin = "VIN1"
output = "json"
"#,
        )
        .unwrap();

        let merged = config.merge_with_args(Overrides {
            vin: Some("VIN2"),
            ..Default::default()
        });
        assert_eq!(merged.token.as_deref(), Some("file-token"));
        assert_eq!(merged.vin.as_deref(), Some("VIN2"));
        assert_eq!(merged.output, "json");
        assert!(!merged.no_color);
    }

    #[test]
    fn test_stream_config_requires_token() {
        let merged = Config::default().merge_with_args(Overrides::default());
        assert!(merged.stream_config().is_err());

        let merged = Config::default().merge_with_args(Overrides {
            token: Some("token"),
            server: Some("na.teslemetry.com"),
            ..Default::default()
        });
        let config = merged.stream_config().unwrap();
        assert_eq!(config.connection.server.as_deref(), Some("na.teslemetry.com"));
    }
}
