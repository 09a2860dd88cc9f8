//! # session-store
//!
//! Key-value persistence of per-user [`Session`] bags. Two implementations
//! share one contract: [`MemorySessionStore`] (volatile, for tests and
//! development) and [`FileSessionStore`] (durable, whole-file JSON rewrite on
//! every mutation).

pub mod error;
pub mod file;
pub mod memory;

pub use error::StoreError;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use async_trait::async_trait;
use mbot_core::Session;

/// Contract for session persistence, keyed by user id.
///
/// `get` on a never-seen id returns an empty session, never an error. All
/// operations may suspend for I/O. No locking is performed across overlapping
/// events for the same id; the last writer wins.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session for `id`, or an empty one if none is stored.
    async fn get(&self, id: &str) -> Result<Session, StoreError>;

    /// Stores the session for `id`, replacing any previous value.
    async fn set(&self, id: &str, session: &Session) -> Result<(), StoreError>;

    /// Removes the stored session for `id`. Removing an unknown id is a no-op.
    async fn clear(&self, id: &str) -> Result<(), StoreError>;
}
