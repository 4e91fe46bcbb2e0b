// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery to customers and the operator recipient set.
//!
//! Every operator send is independent: one failing recipient never stops
//! the others, and failures are logged rather than returned.

use std::sync::Arc;

use futures::future::join_all;
use plugline_config::model::AdminConfig;
use plugline_core::{ChannelAdapter, ConversationId, MessageId, OutboundPayload, PluglineError};
use tracing::{debug, warn};

/// Per-recipient results of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Broadcast {
    pub delivered: usize,
    pub failed: usize,
}

pub struct Notifier {
    channel: Arc<dyn ChannelAdapter>,
    operators: Vec<ConversationId>,
}

impl Notifier {
    /// Recipients are the configured operators plus the super-admin,
    /// de-duplicated, in configuration order.
    pub fn new(channel: Arc<dyn ChannelAdapter>, admin: &AdminConfig) -> Self {
        let mut operators: Vec<ConversationId> = Vec::new();
        for address in admin.operators.iter().chain(admin.super_admin.iter()) {
            let id = ConversationId::new(address.trim());
            if !operators.contains(&id) {
                operators.push(id);
            }
        }
        Self { channel, operators }
    }

    pub fn operators(&self) -> &[ConversationId] {
        &self.operators
    }

    /// Sends text to one recipient. Failures are logged and returned.
    pub async fn send_text(
        &self,
        to: &ConversationId,
        text: &str,
    ) -> Result<MessageId, PluglineError> {
        self.send(to, OutboundPayload::text(text)).await
    }

    pub async fn send(
        &self,
        to: &ConversationId,
        payload: OutboundPayload,
    ) -> Result<MessageId, PluglineError> {
        match self.channel.send(to, payload).await {
            Ok(id) => {
                debug!(recipient = %to, message_id = %id, "message delivered");
                Ok(id)
            }
            Err(e) => {
                warn!(recipient = %to, error = %e, "message delivery failed");
                Err(e)
            }
        }
    }

    /// Sends `payload` to every operator concurrently.
    pub async fn broadcast(&self, payload: OutboundPayload) -> Broadcast {
        let sends = self
            .operators
            .iter()
            .map(|op| self.send(op, payload.clone()));
        let results = join_all(sends).await;

        let delivered = results.iter().filter(|r| r.is_ok()).count();
        Broadcast {
            delivered,
            failed: results.len() - delivered,
        }
    }

    pub async fn broadcast_text(&self, text: &str) -> Broadcast {
        self.broadcast(OutboundPayload::text(text)).await
    }
}

#[cfg(test)]
mod tests {
    use plugline_test_utils::MockChannel;

    use super::*;

    fn admin(operators: &[&str], super_admin: Option<&str>) -> AdminConfig {
        AdminConfig {
            operators: operators.iter().map(|s| s.to_string()).collect(),
            super_admin: super_admin.map(str::to_string),
        }
    }

    #[test]
    fn recipients_include_super_admin_once() {
        let channel = Arc::new(MockChannel::new());
        let n = Notifier::new(channel, &admin(&["111", "222", "111"], Some("222")));
        assert_eq!(
            n.operators(),
            &[ConversationId::new("111"), ConversationId::new("222")]
        );

        let channel = Arc::new(MockChannel::new());
        let n = Notifier::new(channel, &admin(&["111"], Some("999")));
        assert_eq!(n.operators().len(), 2);
    }

    #[tokio::test]
    async fn one_failing_operator_does_not_block_others() {
        let channel = Arc::new(MockChannel::new());
        channel.fail_for("222").await;
        let n = Notifier::new(channel.clone(), &admin(&["111", "222", "333"], None));

        let result = n.broadcast_text("new order").await;
        assert_eq!(result, Broadcast { delivered: 2, failed: 1 });
        assert_eq!(channel.texts_to("111").await, vec!["new order"]);
        assert_eq!(channel.texts_to("333").await, vec!["new order"]);
    }

    #[tokio::test]
    async fn broadcast_with_no_operators_is_noop() {
        let channel = Arc::new(MockChannel::new());
        let n = Notifier::new(channel.clone(), &AdminConfig::default());
        assert_eq!(n.broadcast_text("x").await, Broadcast::default());
        assert_eq!(channel.sent_count().await, 0);
    }
}
