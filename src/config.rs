//! Application configuration management.
//!
//! This module handles loading and saving the session-core configuration:
//! the identity-provider and application API base URLs, credential storage
//! lifetimes, and the credential storage directory.
//!
//! Configuration is stored at `~/.config/tokengate/config.json`.

use std::path::PathBuf;

use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::api::REQUEST_TIMEOUT_SECS;
use crate::auth::credentials::{ACCESS_TTL_DAYS, REFRESH_TTL_DAYS};

/// Application name used for config/data directory paths
const APP_NAME: &str = "tokengate";

/// Config file name
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identity-provider base URL (token, registration, password endpoints)
    pub provider_base_url: String,
    /// Application backend base URL (authenticated business calls)
    pub api_base_url: String,
    /// Timeout applied to every outgoing HTTP request, in seconds
    pub request_timeout_secs: u64,
    /// Storage lifetime of the access credential, in days
    pub access_ttl_days: i64,
    /// Storage lifetime of the refresh credential, in days
    pub refresh_ttl_days: i64,
    /// Where the credential file lives; `None` means the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_base_url: "http://localhost:8000/api/v1".to_string(),
            api_base_url: "http://localhost:8000/api/v1".to_string(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            access_ttl_days: ACCESS_TTL_DAYS,
            refresh_ttl_days: REFRESH_TTL_DAYS,
            data_dir: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub fn access_ttl(&self) -> Duration {
        Duration::days(self.access_ttl_days)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::days(self.refresh_ttl_days)
    }

    /// Directory for the credential file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ttls_match_cookie_lifetimes() {
        let config = Config::default();
        assert_eq!(config.access_ttl(), Duration::days(1));
        assert_eq!(config.refresh_ttl(), Duration::days(7));
    }

    #[test]
    fn test_request_timeout_defaults_to_ten_seconds() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(10));

        let config = Config {
            request_timeout_secs: 2,
            ..Config::default()
        };
        assert_eq!(config.request_timeout(), std::time::Duration::from_secs(2));
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let config = Config {
            data_dir: Some(PathBuf::from("/tmp/tokengate-test")),
            ..Config::default()
        };
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/tokengate-test"));
    }
}
