// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human handoff: conversations an operator has taken over.
//!
//! Membership in [`HumanOverrides`] is the single source of truth for
//! whether a conversation is operator-controlled, so it can never be both
//! operator- and responder-controlled at once.

use std::sync::Arc;

use dashmap::DashSet;
use plugline_core::ConversationId;
use tracing::info;

use crate::notify::Notifier;
use crate::registry::OrderRegistry;

#[derive(Default)]
pub struct HumanOverrides {
    set: DashSet<ConversationId>,
}

impl HumanOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the conversation was not already overridden.
    pub fn enter(&self, conversation: &ConversationId) -> bool {
        let added = self.set.insert(conversation.clone());
        if added {
            info!(conversation_id = %conversation, "human override entered");
        }
        added
    }

    /// Returns `true` if the conversation was overridden.
    pub fn leave(&self, conversation: &ConversationId) -> bool {
        let removed = self.set.remove(conversation).is_some();
        if removed {
            info!(conversation_id = %conversation, "human override left");
        }
        removed
    }

    pub fn contains(&self, conversation: &ConversationId) -> bool {
        self.set.contains(conversation)
    }

    /// Current members, sorted.
    pub fn members(&self) -> Vec<ConversationId> {
        let mut members: Vec<_> = self.set.iter().map(|c| c.clone()).collect();
        members.sort();
        members
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    Forwarded,
    NotForwarded,
}

/// Intercepts customer text for overridden conversations.
pub struct HandoffRouter {
    overrides: Arc<HumanOverrides>,
    registry: Arc<OrderRegistry>,
    notifier: Arc<Notifier>,
}

impl HandoffRouter {
    pub fn new(
        overrides: Arc<HumanOverrides>,
        registry: Arc<OrderRegistry>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            overrides,
            registry,
            notifier,
        }
    }

    /// Forwards `text` verbatim to every operator if the conversation is
    /// under human control. Must run before the responder is invoked.
    pub async fn route(&self, conversation: &ConversationId, text: &str) -> Routed {
        if !self.overrides.contains(conversation) {
            return Routed::NotForwarded;
        }
        let code = self.registry.code_for(conversation);
        let forward = format!(
            "💬 {code} ({conversation}) says:\n{text}\n\n\
             Reply: msg {code} <your message>\n\
             Hand back to the bot: resume {code}"
        );
        self.notifier.broadcast_text(&forward).await;
        Routed::Forwarded
    }
}

#[cfg(test)]
mod tests {
    use plugline_config::model::AdminConfig;
    use plugline_test_utils::MockChannel;

    use super::*;

    #[test]
    fn enter_reports_new_vs_existing() {
        let overrides = HumanOverrides::new();
        let c = ConversationId::new("111");
        assert!(overrides.enter(&c));
        assert!(!overrides.enter(&c));
        assert!(overrides.leave(&c));
        assert!(!overrides.leave(&c));
        assert!(!overrides.contains(&c));
    }

    #[tokio::test]
    async fn forwards_only_overridden_conversations() {
        let channel = Arc::new(MockChannel::new());
        let admin = AdminConfig {
            operators: vec!["999".into()],
            super_admin: None,
        };
        let notifier = Arc::new(Notifier::new(channel.clone(), &admin));
        let overrides = Arc::new(HumanOverrides::new());
        let registry = Arc::new(OrderRegistry::new("SP"));
        let router = HandoffRouter::new(overrides.clone(), registry.clone(), notifier);

        let c = ConversationId::new("2348011111111");
        assert_eq!(router.route(&c, "hello").await, Routed::NotForwarded);
        assert_eq!(channel.sent_count().await, 0);

        overrides.enter(&c);
        assert_eq!(router.route(&c, "where is my food").await, Routed::Forwarded);
        let forwarded = &channel.texts_to("999").await[0];
        let code = registry.existing_code(&c).unwrap();
        assert!(forwarded.contains("where is my food"));
        assert!(forwarded.contains(&format!("resume {code}")));
        assert!(forwarded.contains(&format!("msg {code}")));
    }
}
