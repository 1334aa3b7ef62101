use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;

use super::TokenStore;

/// In-process backend for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    token: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn get(&self) -> Result<Option<String>> {
        Ok(self.token.lock().await.clone())
    }

    async fn set(&self, token: &str) -> Result<()> {
        *self.token.lock().await = Some(token.to_string());
        Ok(())
    }

    async fn delete(&self) -> Result<()> {
        *self.token.lock().await = None;
        Ok(())
    }
}
