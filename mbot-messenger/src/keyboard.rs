//! Builders for quick-reply and button payloads. Pure constructors; the
//! transport adapter decides how each variant is rendered.

use mbot_core::{Button, OutgoingPayload, QuickReply};

pub fn quick_reply(title: impl Into<String>, payload: impl Into<String>) -> QuickReply {
    QuickReply {
        title: title.into(),
        payload: payload.into(),
    }
}

/// A text message with tappable quick replies underneath.
pub fn quick_replies(text: impl Into<String>, replies: Vec<QuickReply>) -> OutgoingPayload {
    OutgoingPayload::QuickReplies {
        text: text.into(),
        replies,
    }
}

pub fn postback_button(title: impl Into<String>, payload: impl Into<String>) -> Button {
    Button::Postback {
        title: title.into(),
        payload: payload.into(),
    }
}

pub fn url_button(title: impl Into<String>, url: impl Into<String>) -> Button {
    Button::Url {
        title: title.into(),
        url: url.into(),
    }
}

/// A button-template message.
pub fn button_template(text: impl Into<String>, buttons: Vec<Button>) -> OutgoingPayload {
    OutgoingPayload::Buttons {
        text: text.into(),
        buttons,
    }
}
