// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook payloads and the subscription handshake.

use plugline_core::{ConversationId, InboundContent, InboundEvent, MessageId};
use serde::Deserialize;
use thiserror::Error;

/// The only `object` value this endpoint accepts.
pub const BUSINESS_ACCOUNT_OBJECT: &str = "whatsapp_business_account";

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("malformed webhook payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unexpected webhook object `{0}`")]
    UnexpectedObject(String),
}

#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
pub struct Change {
    #[serde(default)]
    pub value: ChangeValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChangeValue {
    /// Absent on delivery/read status callbacks.
    #[serde(default)]
    pub messages: Vec<WireMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub from: String,
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub text: Option<TextBody>,
    #[serde(default)]
    pub image: Option<Media>,
    #[serde(default)]
    pub audio: Option<Media>,
}

#[derive(Debug, Deserialize)]
pub struct TextBody {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct Media {
    pub id: String,
    #[serde(default)]
    pub caption: Option<String>,
}

impl WireMessage {
    fn into_event(self) -> InboundEvent {
        let WireMessage {
            from,
            id,
            kind,
            text,
            image,
            audio,
        } = self;
        let content = match kind.as_str() {
            "text" => text.map(|t| InboundContent::Text(t.body)),
            "image" => image.map(|i| InboundContent::Image {
                media_id: i.id,
                caption: i.caption,
            }),
            "audio" => audio.map(|a| InboundContent::Audio { media_id: a.id }),
            _ => None,
        };
        InboundEvent {
            message_id: MessageId(id),
            sender: ConversationId::new(from),
            content: content.unwrap_or(InboundContent::Unsupported(kind)),
        }
    }
}

/// Parses a webhook body into inbound events, one per message. Status
/// callbacks yield an empty list.
pub fn parse_webhook(body: &[u8]) -> Result<Vec<InboundEvent>, WebhookError> {
    let payload: WebhookPayload = serde_json::from_slice(body)?;
    if payload.object != BUSINESS_ACCOUNT_OBJECT {
        return Err(WebhookError::UnexpectedObject(payload.object));
    }
    Ok(payload
        .entry
        .into_iter()
        .flat_map(|entry| entry.changes)
        .flat_map(|change| change.value.messages)
        .map(WireMessage::into_event)
        .collect())
}

/// Checks a `GET /webhook` subscription handshake. Returns the challenge to
/// echo back when the mode is `subscribe` and the token matches.
pub fn verify_subscription<'a>(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&'a str>,
    expected_token: Option<&str>,
) -> Option<&'a str> {
    let expected = expected_token.filter(|t| !t.is_empty())?;
    match (mode, token, challenge) {
        (Some("subscribe"), Some(token), Some(challenge)) if token == expected => Some(challenge),
        _ => None,
    }
}
