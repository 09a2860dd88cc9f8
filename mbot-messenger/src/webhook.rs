//! Conversion from the provider's webhook shapes to core events, plus the
//! verification handshake.
//!
//! Acknowledgment codes for the transport: 200 after processing a parsed
//! update, 404 for a malformed or unexpected top-level container, 403 when
//! the verification handshake does not match.

use mbot_core::{
    Attachment, AttachmentKind, Event, IncomingMessage, MbotError, Postback, Result,
};
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct RawUpdate {
    object: String,
    #[serde(default)]
    entry: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    messaging: Vec<RawMessaging>,
}

#[derive(Debug, Deserialize)]
struct RawMessaging {
    sender: Option<RawParty>,
    message: Option<RawMessage>,
    postback: Option<RawPostback>,
}

#[derive(Debug, Deserialize)]
struct RawParty {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    text: Option<String>,
    quick_reply: Option<RawQuickReply>,
    #[serde(default)]
    attachments: Vec<RawAttachment>,
}

#[derive(Debug, Deserialize)]
struct RawQuickReply {
    payload: String,
}

#[derive(Debug, Deserialize)]
struct RawAttachment {
    #[serde(rename = "type")]
    kind: String,
    payload: Option<RawAttachmentPayload>,
}

#[derive(Debug, Deserialize)]
struct RawAttachmentPayload {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPostback {
    payload: String,
}

impl RawMessaging {
    /// True for deliveries that carry neither message nor postback (read
    /// receipts, delivery confirmations); those are dropped.
    fn is_empty(&self) -> bool {
        self.message.is_none() && self.postback.is_none()
    }

    fn to_core(&self) -> Event {
        Event {
            sender_id: self
                .sender
                .as_ref()
                .map(|p| p.id.clone())
                .unwrap_or_default(),
            message: self.message.as_ref().map(|m| IncomingMessage {
                text: m.text.clone(),
                quick_reply: m.quick_reply.as_ref().map(|q| q.payload.clone()),
                attachments: m.attachments.iter().map(RawAttachment::to_core).collect(),
            }),
            postback: self.postback.as_ref().map(|p| Postback {
                payload: p.payload.clone(),
            }),
            received_at: chrono::Utc::now(),
        }
    }
}

impl RawAttachment {
    fn to_core(&self) -> Attachment {
        let kind = match self.kind.as_str() {
            "image" => AttachmentKind::Image,
            "file" => AttachmentKind::File,
            "audio" => AttachmentKind::Audio,
            "video" => AttachmentKind::Video,
            "location" => AttachmentKind::Location,
            "contact" => AttachmentKind::Contact,
            _ => AttachmentKind::Fallback,
        };
        Attachment {
            kind,
            url: self.payload.as_ref().and_then(|p| p.url.clone()),
        }
    }
}

/// Parses one webhook POST body into core events. A body that is not a
/// `page` update container is a [`MbotError::Webhook`] (acknowledged 404).
pub fn parse_update(body: &Value) -> Result<Vec<Event>> {
    let update: RawUpdate = serde_json::from_value(body.clone())
        .map_err(|e| MbotError::Webhook(format!("Malformed update: {}", e)))?;
    if update.object != "page" {
        return Err(MbotError::Webhook(format!(
            "Unexpected object: {}",
            update.object
        )));
    }
    Ok(update
        .entry
        .into_iter()
        .flat_map(|entry| entry.messaging)
        .filter(|raw| !raw.is_empty())
        .map(|raw| raw.to_core())
        .collect())
}

/// GET verification handshake. Returns the challenge to echo back with 200
/// when the mode is `subscribe` and the token matches; `None` means the
/// transport should answer 403.
pub fn verify_subscription(
    expected_token: &str,
    mode: &str,
    verify_token: &str,
    challenge: &str,
) -> Option<String> {
    if mode == "subscribe" && verify_token == expected_token {
        Some(challenge.to_string())
    } else {
        None
    }
}
