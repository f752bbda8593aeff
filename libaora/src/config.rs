//! Configuration management for Aora

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::{ConfigError, Result};

/// Number of videos the "latest" rail shows by default
pub const DEFAULT_LATEST_LIMIT: usize = 7;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub feed: FeedConfig,
}

/// Static identifiers of the backend project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub platform: String,
    pub project_id: String,
    pub database_id: String,
    pub user_collection_id: String,
    pub video_collection_id: String,
    pub storage_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    #[serde(default = "default_latest_limit")]
    pub latest_limit: usize,
}

fn default_latest_limit() -> usize {
    DEFAULT_LATEST_LIMIT
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            latest_limit: DEFAULT_LATEST_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from the default location
    ///
    /// Falls back to the built-in project configuration when no file exists.
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default_config());
        }
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            gateway: GatewayConfig {
                endpoint: "https://cloud.appwrite.io/v1".to_string(),
                platform: "com.aora.app".to_string(),
                project_id: "6772ab3f002510596cc8".to_string(),
                database_id: "6772ad2b001fc0e587a7".to_string(),
                user_collection_id: "6772ad41003a52da38de".to_string(),
                video_collection_id: "6772ad800025b65914df".to_string(),
                storage_id: "6772afcb00185023d6f7".to_string(),
            },
            feed: FeedConfig::default(),
        }
    }

    /// Check that every identifier is present and the endpoint parses
    pub fn validate(&self) -> Result<()> {
        let gateway = &self.gateway;
        let required = [
            ("gateway.endpoint", &gateway.endpoint),
            ("gateway.platform", &gateway.platform),
            ("gateway.project_id", &gateway.project_id),
            ("gateway.database_id", &gateway.database_id),
            ("gateway.user_collection_id", &gateway.user_collection_id),
            ("gateway.video_collection_id", &gateway.video_collection_id),
            ("gateway.storage_id", &gateway.storage_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField(name.to_string()).into());
            }
        }

        gateway.endpoint_url()?;

        if self.feed.latest_limit == 0 {
            return Err(ConfigError::MissingField("feed.latest_limit (must be > 0)".to_string()).into());
        }

        Ok(())
    }
}

impl GatewayConfig {
    /// Parsed endpoint, always ending with a slash so relative joins keep the
    /// version path segment
    pub fn endpoint_url(&self) -> Result<Url> {
        let mut raw = self.endpoint.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|e| ConfigError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)).into())
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("AORA_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("aora").join("config.toml"))
}
