// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for the order persistence collaborator.

use async_trait::async_trait;

use crate::error::PluglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::ConversationId;

/// Adapter for persisting order tickets.
///
/// Failures are never fatal to a conversation; callers log and move on.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connections).
    async fn initialize(&self) -> Result<(), PluglineError>;

    /// Records a pending order ticket for a conversation.
    async fn record_pending_order(
        &self,
        conversation: &ConversationId,
        details: &str,
        order_code: &str,
    ) -> Result<(), PluglineError>;

    /// Marks the newest pending order with this code as confirmed.
    ///
    /// Returns the owning conversation, or `None` if nothing was pending.
    async fn mark_order_confirmed(
        &self,
        order_code: &str,
    ) -> Result<Option<ConversationId>, PluglineError>;
}
