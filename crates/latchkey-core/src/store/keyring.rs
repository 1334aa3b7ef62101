use anyhow::{Context, Result};
use async_trait::async_trait;
use keyring::Entry;

use super::{TokenStore, TOKEN_KEY};

/// Keychain service name the token entry is registered under.
const SERVICE_NAME: &str = "latchkey";

/// OS keychain backend, the canonical secure store for the session token.
/// Keychain calls are blocking and run on the blocking thread pool.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    /// Use a non-default keychain service name (one token per service).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenStore for KeyringStore {
    async fn get(&self) -> Result<Option<String>> {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || {
            let entry =
                Entry::new(&service, TOKEN_KEY).context("Failed to create keyring entry")?;
            match entry.get_password() {
                Ok(token) => Ok(Some(token)),
                Err(keyring::Error::NoEntry) => Ok(None),
                Err(e) => Err(e).context("Failed to read token from keychain"),
            }
        })
        .await
        .context("Keychain task failed")?
    }

    async fn set(&self, token: &str) -> Result<()> {
        let service = self.service.clone();
        let token = token.to_string();
        tokio::task::spawn_blocking(move || {
            let entry =
                Entry::new(&service, TOKEN_KEY).context("Failed to create keyring entry")?;
            entry
                .set_password(&token)
                .context("Failed to store token in keychain")
        })
        .await
        .context("Keychain task failed")?
    }

    async fn delete(&self) -> Result<()> {
        let service = self.service.clone();
        tokio::task::spawn_blocking(move || {
            let entry =
                Entry::new(&service, TOKEN_KEY).context("Failed to create keyring entry")?;
            match entry.delete_credential() {
                // Deleting an absent token is a no-op, not an error
                Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
                Err(e) => Err(e).context("Failed to delete token from keychain"),
            }
        })
        .await
        .context("Keychain task failed")?
    }
}
