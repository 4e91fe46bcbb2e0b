// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter that captures every outbound send.
//!
//! Individual recipients can be made to fail, to exercise per-recipient
//! isolation in the notification fan-out.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use plugline_core::PluglineError;
use plugline_core::traits::adapter::PluginAdapter;
use plugline_core::traits::channel::ChannelAdapter;
use plugline_core::types::{AdapterType, ConversationId, HealthStatus, MessageId, OutboundPayload};

/// One captured send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: ConversationId,
    pub payload: OutboundPayload,
}

/// A mock messaging channel for testing.
pub struct MockChannel {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    counter: AtomicU64,
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            failing: Arc::new(Mutex::new(HashSet::new())),
            counter: AtomicU64::new(0),
        }
    }

    /// Make every send to `recipient` fail until further notice.
    pub async fn fail_for(&self, recipient: &str) {
        self.failing.lock().await.insert(recipient.to_string());
    }

    /// All successful sends, in order.
    pub async fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Text bodies delivered to `recipient`, in order.
    pub async fn texts_to(&self, recipient: &str) -> Vec<String> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to.as_str() == recipient)
            .filter_map(|m| m.payload.as_text().map(str::to_string))
            .collect()
    }

    /// Image payloads delivered to `recipient` as `(media_id, caption)`.
    pub async fn images_to(&self, recipient: &str) -> Vec<(String, Option<String>)> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to.as_str() == recipient)
            .filter_map(|m| match &m.payload {
                OutboundPayload::Image { media_id, caption } => {
                    Some((media_id.clone(), caption.clone()))
                }
                OutboundPayload::Text(_) => None,
            })
            .collect()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    async fn send(
        &self,
        to: &ConversationId,
        payload: OutboundPayload,
    ) -> Result<MessageId, PluglineError> {
        if self.failing.lock().await.contains(to.as_str()) {
            return Err(PluglineError::channel(format!("delivery to {to} refused")));
        }
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        self.sent.lock().await.push(SentMessage {
            to: to.clone(),
            payload,
        });
        Ok(MessageId(format!("mock-msg-{n}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_and_filters_by_recipient() {
        let channel = MockChannel::new();
        let alice = ConversationId::new("111");
        channel.send(&alice, OutboundPayload::text("hi")).await.unwrap();
        channel
            .send(
                &alice,
                OutboundPayload::Image {
                    media_id: "m1".into(),
                    caption: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(channel.texts_to("111").await, vec!["hi"]);
        assert_eq!(channel.images_to("111").await, vec![("m1".to_string(), None)]);
        assert!(channel.texts_to("222").await.is_empty());
    }

    #[tokio::test]
    async fn injected_failure_is_per_recipient() {
        let channel = MockChannel::new();
        channel.fail_for("222").await;
        assert!(
            channel
                .send(&ConversationId::new("222"), OutboundPayload::text("x"))
                .await
                .is_err()
        );
        assert!(
            channel
                .send(&ConversationId::new("111"), OutboundPayload::text("x"))
                .await
                .is_ok()
        );
        assert_eq!(channel.sent_count().await, 1);
    }
}
