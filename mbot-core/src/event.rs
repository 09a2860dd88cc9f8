//! Inbound event types: sender, message content, attachments, postback.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Top-level classification of an inbound event, used by the `on(...)` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Postback,
}

/// Attachment classification as delivered by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    File,
    Audio,
    Video,
    Location,
    Contact,
    Fallback,
}

/// A single inbound attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub url: Option<String>,
}

/// Free-text message content with optional quick-reply payload and attachments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub text: Option<String>,
    /// Payload of a pressed quick-reply button; routed to action handlers before text matching.
    pub quick_reply: Option<String>,
    pub attachments: Vec<Attachment>,
}

/// A button/action press carrying an opaque payload string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Postback {
    pub payload: String,
}

/// One inbound webhook event. Either `message` or `postback` is set; an event
/// with both is treated as a postback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub sender_id: String,
    pub message: Option<IncomingMessage>,
    pub postback: Option<Postback>,
    pub received_at: DateTime<Utc>,
}

impl Event {
    /// Builds a plain text message event. Used by tests and REPL-style runners.
    pub fn text_message(sender_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            message: Some(IncomingMessage {
                text: Some(text.into()),
                quick_reply: None,
                attachments: Vec::new(),
            }),
            postback: None,
            received_at: Utc::now(),
        }
    }

    /// Builds a postback event with the given payload.
    pub fn postback(sender_id: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            sender_id: sender_id.into(),
            message: None,
            postback: Some(Postback {
                payload: payload.into(),
            }),
            received_at: Utc::now(),
        }
    }

    /// Builds a message event carrying only attachments.
    pub fn attachment_message(sender_id: impl Into<String>, attachments: Vec<Attachment>) -> Self {
        Self {
            sender_id: sender_id.into(),
            message: Some(IncomingMessage {
                text: None,
                quick_reply: None,
                attachments,
            }),
            postback: None,
            received_at: Utc::now(),
        }
    }

    pub fn kind(&self) -> EventKind {
        if self.postback.is_some() {
            EventKind::Postback
        } else {
            EventKind::Message
        }
    }

    pub fn text(&self) -> Option<&str> {
        self.message.as_ref()?.text.as_deref()
    }

    pub fn quick_reply(&self) -> Option<&str> {
        self.message.as_ref()?.quick_reply.as_deref()
    }

    pub fn postback_payload(&self) -> Option<&str> {
        self.postback.as_ref().map(|p| p.payload.as_str())
    }

    pub fn attachments(&self) -> &[Attachment] {
        self.message
            .as_ref()
            .map(|m| m.attachments.as_slice())
            .unwrap_or(&[])
    }
}
