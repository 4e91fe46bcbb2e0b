// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the adapters and the routing core.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable per-customer key: the customer's messaging address.
///
/// Used as the join key across the session store, order registry,
/// human-override set, and persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-assigned message identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Menu,
}

// --- Inbound ---

/// Kind-specific payload of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundContent {
    /// Plain text body.
    Text(String),
    /// Image, referenced by the provider's media id.
    Image {
        media_id: String,
        caption: Option<String>,
    },
    /// Voice note or audio clip.
    Audio { media_id: String },
    /// Anything else (stickers, locations, reactions...). Carries the raw type name.
    Unsupported(String),
}

impl InboundContent {
    /// Short name of the message kind, for logging.
    pub fn kind(&self) -> &str {
        match self {
            InboundContent::Text(_) => "text",
            InboundContent::Image { .. } => "image",
            InboundContent::Audio { .. } => "audio",
            InboundContent::Unsupported(kind) => kind.as_str(),
        }
    }
}

/// One inbound webhook message, normalized across the wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Provider-assigned id, used for duplicate suppression.
    pub message_id: MessageId,
    /// Sender address.
    pub sender: ConversationId,
    /// Message payload.
    pub content: InboundContent,
}

impl InboundEvent {
    /// Convenience constructor for a text message.
    pub fn text(message_id: &str, sender: &str, body: &str) -> Self {
        Self {
            message_id: MessageId(message_id.to_string()),
            sender: ConversationId::new(sender),
            content: InboundContent::Text(body.to_string()),
        }
    }
}

// --- Outbound ---

/// Payload handed to [`ChannelAdapter::send`](crate::ChannelAdapter::send).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundPayload {
    Text(String),
    Image {
        media_id: String,
        caption: Option<String>,
    },
}

impl OutboundPayload {
    pub fn text(body: impl Into<String>) -> Self {
        Self::Text(body.into())
    }

    /// Returns the text body, if this is a text payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            OutboundPayload::Text(body) => Some(body),
            OutboundPayload::Image { .. } => None,
        }
    }
}

// --- Dialogue ---

/// Author of a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One entry in a conversation's dialogue history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// A request to a generative backend: system instruction, prior dialogue,
/// and the new (already composed) user turn.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub system_prompt: String,
    pub history: Vec<Turn>,
    pub message: String,
}
