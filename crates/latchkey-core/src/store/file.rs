use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TokenStore;

/// Token file name inside the store directory.
const TOKEN_FILE: &str = "token.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at: DateTime<Utc>,
}

/// On-disk JSON backend for headless environments without a keychain.
/// The token file is written with restricted permissions (0600).
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// When the current token was written, if one is stored.
    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        self.read().ok().flatten().map(|stored| stored.saved_at)
    }

    fn token_path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    fn read(&self) -> Result<Option<StoredToken>> {
        let path = self.token_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;

        let stored = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse token file {}", path.display()))?;

        Ok(Some(stored))
    }
}

#[async_trait]
impl TokenStore for FileStore {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.read()?.map(|stored| stored.token))
    }

    async fn set(&self, token: &str) -> Result<()> {
        let path = self.token_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let stored = StoredToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let contents =
            serde_json::to_string_pretty(&stored).context("Failed to serialize token")?;

        // Write with restricted permissions
        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&path)
                .with_context(|| format!("Failed to open {} for writing", path.display()))?;
            file.write_all(contents.as_bytes())
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        #[cfg(not(unix))]
        {
            fs::write(&path, contents)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }

        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        let path = self.token_path();
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove token file {}", path.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = FileStore::new(dir.path().to_path_buf());

        assert_eq!(store.get().await.expect("get failed"), None);

        store.set("abc").await.expect("set failed");
        assert_eq!(store.get().await.expect("get failed").as_deref(), Some("abc"));
        assert!(store.saved_at().is_some());

        // Overwrite replaces the token wholesale
        store.set("def").await.expect("set failed");
        assert_eq!(store.get().await.expect("get failed").as_deref(), Some("def"));
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = FileStore::new(dir.path().to_path_buf());

        store.delete().await.expect("delete on empty store failed");

        store.set("abc").await.expect("set failed");
        store.delete().await.expect("delete failed");
        assert_eq!(store.get().await.expect("get failed"), None);

        store.delete().await.expect("second delete failed");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_token_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir failed");
        let store = FileStore::new(dir.path().to_path_buf());
        store.set("abc").await.expect("set failed");

        let meta = fs::metadata(dir.path().join(TOKEN_FILE)).expect("metadata failed");
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
    }
}
