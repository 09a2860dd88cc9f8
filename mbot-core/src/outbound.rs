//! Outbound delivery abstraction and the payload variants it renders.
//!
//! [`OutgoingPayload`] is a tagged sum; the transport adapter matches it
//! exhaustively when building the provider request body. Payload builders live
//! in the transport crate.

use crate::error::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A quick-reply button: visible title plus the payload echoed back on press.
#[derive(Debug, Clone, PartialEq)]
pub struct QuickReply {
    pub title: String,
    pub payload: String,
}

/// A template button.
#[derive(Debug, Clone, PartialEq)]
pub enum Button {
    Postback { title: String, payload: String },
    Url { title: String, url: String },
}

/// What to send to a recipient. Matched exhaustively by [`Outbound`] impls.
#[derive(Debug, Clone, PartialEq)]
pub enum OutgoingPayload {
    Text(String),
    QuickReplies {
        text: String,
        replies: Vec<QuickReply>,
    },
    Buttons {
        text: String,
        buttons: Vec<Button>,
    },
    /// Raw provider attachment object, passed through unchanged.
    Attachment(Value),
}

impl From<&str> for OutgoingPayload {
    fn from(text: &str) -> Self {
        OutgoingPayload::Text(text.to_string())
    }
}

impl From<String> for OutgoingPayload {
    fn from(text: String) -> Self {
        OutgoingPayload::Text(text)
    }
}

/// Abstraction for delivering one message to one recipient. Implementations
/// map to a transport (e.g. the Graph API); tests substitute a recording impl.
#[async_trait]
pub trait Outbound: Send + Sync {
    async fn send_message(&self, recipient_id: &str, payload: &OutgoingPayload) -> Result<()>;
}
