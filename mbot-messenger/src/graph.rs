//! Graph API implementation of [`Outbound`]. Renders each payload variant to
//! the provider's request shape and POSTs it; errors map to
//! [`MbotError::Transport`] and are handled by the caller.

use async_trait::async_trait;
use mbot_core::{Button, MbotError, Outbound, OutgoingPayload, Result};
use serde_json::{json, Value};
use tracing::debug;

const DEFAULT_API_URL: &str = "https://graph.facebook.com/v19.0";

/// Sends messages through the provider's `/me/messages` endpoint.
pub struct GraphApi {
    http: reqwest::Client,
    page_access_token: String,
    api_url: String,
}

impl GraphApi {
    pub fn new(page_access_token: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            page_access_token,
            api_url: DEFAULT_API_URL.to_string(),
        }
    }

    /// Overrides the API base URL (e.g. for a stub server in tests).
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Renders one payload variant to the `message` object of the request.
    fn message_body(payload: &OutgoingPayload) -> Value {
        match payload {
            OutgoingPayload::Text(text) => json!({ "text": text }),
            OutgoingPayload::QuickReplies { text, replies } => json!({
                "text": text,
                "quick_replies": replies
                    .iter()
                    .map(|r| json!({
                        "content_type": "text",
                        "title": r.title,
                        "payload": r.payload,
                    }))
                    .collect::<Vec<_>>(),
            }),
            OutgoingPayload::Buttons { text, buttons } => json!({
                "attachment": {
                    "type": "template",
                    "payload": {
                        "template_type": "button",
                        "text": text,
                        "buttons": buttons.iter().map(button_body).collect::<Vec<_>>(),
                    }
                }
            }),
            OutgoingPayload::Attachment(raw) => json!({ "attachment": raw }),
        }
    }
}

fn button_body(button: &Button) -> Value {
    match button {
        Button::Postback { title, payload } => json!({
            "type": "postback",
            "title": title,
            "payload": payload,
        }),
        Button::Url { title, url } => json!({
            "type": "web_url",
            "title": title,
            "url": url,
        }),
    }
}

#[async_trait]
impl Outbound for GraphApi {
    async fn send_message(&self, recipient_id: &str, payload: &OutgoingPayload) -> Result<()> {
        let body = json!({
            "recipient": { "id": recipient_id },
            "message": Self::message_body(payload),
        });
        debug!(recipient_id = %recipient_id, "Sending message");

        let response = self
            .http
            .post(format!("{}/me/messages", self.api_url))
            .query(&[("access_token", self.page_access_token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| MbotError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MbotError::Transport(format!(
                "Send failed with {}: {}",
                status, text
            )));
        }
        Ok(())
    }
}
