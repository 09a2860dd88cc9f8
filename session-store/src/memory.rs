//! In-memory session store. Data is lost on restart.

use crate::error::StoreError;
use crate::SessionStore;
use async_trait::async_trait;
use mbot_core::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Volatile store backed by a shared map. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
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
        self.sessions
            .write()
            .await
            .insert(id.to_string(), session.clone());
        Ok(())
    }

    async fn clear(&self, id: &str) -> Result<(), StoreError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
