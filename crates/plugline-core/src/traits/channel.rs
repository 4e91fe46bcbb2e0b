// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound delivery trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::PluglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ConversationId, MessageId, OutboundPayload};

/// Adapter for delivering messages to a messaging platform.
///
/// Each call is independent: callers must not assume atomicity across
/// several sends that make up one logical notification.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Sends one payload to one recipient.
    async fn send(
        &self,
        to: &ConversationId,
        payload: OutboundPayload,
    ) -> Result<MessageId, PluglineError>;
}
