//! Application configuration management.
//!
//! This module handles loading and saving the client configuration, which
//! includes the auth server URL, the last used email, and the token store
//! backend choice.
//!
//! Configuration is stored at `~/.config/latchkey/config.json`; the
//! `LATCHKEY_SERVER_URL` and `LATCHKEY_TOKEN_STORE` environment variables
//! override it.

use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Application name used for config/data directory paths
const APP_NAME: &str = "latchkey";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default auth server during development
const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub server_url: Option<String>,
    pub last_email: Option<String>,
    /// Token store backend: "keyring" (default) or "file".
    pub token_store: Option<String>,
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

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the file-backed token store.
    pub fn store_dir() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }

    /// Effective server URL: environment override, then config, then the
    /// development default.
    pub fn server_url(&self) -> String {
        std::env::var("LATCHKEY_SERVER_URL")
            .ok()
            .or_else(|| self.server_url.clone())
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
    }

    /// Effective token store backend name.
    pub fn token_store(&self) -> String {
        std::env::var("LATCHKEY_TOKEN_STORE")
            .ok()
            .or_else(|| self.token_store.clone())
            .unwrap_or_else(|| "keyring".to_string())
    }
}
