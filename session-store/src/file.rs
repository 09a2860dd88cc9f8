//! File-backed session store.
//!
//! The whole store is one JSON object keyed by user id. The file is read once
//! at open and fully rewritten on every `set`/`clear`; there are no partial
//! writes and no file locking, so concurrent process instances are unsafe.

use crate::error::StoreError;
use crate::SessionStore;
use async_trait::async_trait;
use mbot_core::Session;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Durable store persisting every mutation to a single JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl FileSessionStore {
    /// Opens the store, loading existing sessions from `path` if the file
    /// exists. A missing or empty file starts an empty store.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let sessions = match tokio::fs::read_to_string(&path).await {
            Ok(content) if !content.trim().is_empty() => serde_json::from_str(&content)?,
            Ok(_) => HashMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), "Opened session file");
        Ok(Self {
            path,
            sessions: Arc::new(RwLock::new(sessions)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes the whole map and rewrites the backing file.
    async fn persist(&self, sessions: &HashMap<String, Session>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }
        let content = serde_json::to_string_pretty(sessions)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, id: &str) -> Result<Session, StoreError> {
        Ok(self
            .sessions
            .read()
            .await
            .get(id)
            .cloned()
            .unwrap_or_default())
    }

    async fn set(&self, id: &str, session: &Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id.to_string(), session.clone());
        self.persist(&sessions).await
    }

    async fn clear(&self, id: &str) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        self.persist(&sessions).await
    }
}
