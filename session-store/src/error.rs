//! Session store error types.

use thiserror::Error;

/// Errors that can occur when loading or persisting sessions.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<StoreError> for mbot_core::MbotError {
    fn from(e: StoreError) -> Self {
        mbot_core::MbotError::Store(e.to_string())
    }
}
