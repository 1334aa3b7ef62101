//! Token storage backends.
//!
//! The store is the durable owner of the session token; the session only
//! holds a transient copy. One trait, three backends:
//!
//! - `KeyringStore`: OS keychain, the canonical secure backend
//! - `FileStore`: owner-only JSON file for headless environments
//! - `MemoryStore`: in-process, for tests and embedding

pub mod file;
pub mod keyring;
pub mod memory;

pub use file::FileStore;
pub use keyring::KeyringStore;
pub use memory::MemoryStore;

use anyhow::Result;
use async_trait::async_trait;

/// Storage key under which the bearer token is kept.
pub const TOKEN_KEY: &str = "token";

/// Persistent owner of the session token.
///
/// All operations may suspend. `get` returning `Ok(None)` means no token
/// is stored; `Err` is reserved for backend failures.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self) -> Result<Option<String>>;
    async fn set(&self, token: &str) -> Result<()>;
    async fn delete(&self) -> Result<()>;
}

#[async_trait]
impl TokenStore for Box<dyn TokenStore> {
    async fn get(&self) -> Result<Option<String>> {
        (**self).get().await
    }

    async fn set(&self, token: &str) -> Result<()> {
        (**self).set(token).await
    }

    async fn delete(&self) -> Result<()> {
        (**self).delete().await
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
/// Tokens are never logged or displayed in full.
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    format!("{}...", &token[..12])
}
