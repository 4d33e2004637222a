//! Access-token storage
//!
//! The session is a single slot holding the current access token. It is
//! written by login and refresh, cleared by logout, and read by every
//! outgoing request. Implementations are injected into the HTTP client so
//! that tests and embedders can choose where the token lives.

use crate::{CoreError, CoreResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::debug;

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current access token, if a session exists
    async fn get(&self) -> CoreResult<Option<String>>;

    /// Replace the current access token
    async fn set(&self, token: &str) -> CoreResult<()>;

    /// Forget the current access token
    async fn clear(&self) -> CoreResult<()>;
}

/// Process-local session slot
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self) -> CoreResult<Option<String>> {
        let token = self
            .token
            .read()
            .map_err(|_| CoreError::storage_error("session lock poisoned"))?;
        Ok(token.clone())
    }

    async fn set(&self, token: &str) -> CoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| CoreError::storage_error("session lock poisoned"))?;
        *slot = Some(token.to_string());
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        let mut slot = self
            .token
            .write()
            .map_err(|_| CoreError::storage_error("session lock poisoned"))?;
        *slot = None;
        Ok(())
    }
}

/// On-disk layout of the session file
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    token: String,
}

/// Session slot persisted as a small JSON document
///
/// A missing file means there is no session. Clearing removes the file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Default file name inside a data directory
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<data_dir>/session.json`
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self::new(data_dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self) -> CoreResult<Option<String>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file: SessionFile = serde_json::from_str(&content)?;
        if file.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(file.token))
    }

    async fn set(&self, token: &str) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(&SessionFile {
            token: token.to_string(),
        })?;
        tokio::fs::write(&self.path, content).await?;
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    async fn clear(&self) -> CoreResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "Session cleared");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// Mock implementation for testing
#[cfg(any(test, feature = "tests"))]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub SessionStore {}

        #[async_trait]
        impl SessionStore for SessionStore {
            async fn get(&self) -> CoreResult<Option<String>>;
            async fn set(&self, token: &str) -> CoreResult<()>;
            async fn clear(&self) -> CoreResult<()>;
        }
    }
}
