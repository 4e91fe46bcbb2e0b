// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Top-level routing of one inbound event.
//!
//! Every event ends in exactly one [`Outcome`]; nothing here returns an
//! error. Collaborator failures are logged where they happen.

use std::sync::Arc;

use plugline_core::{ConversationId, InboundContent, InboundEvent, OutboundPayload};
use tracing::{debug, info, instrument};

use crate::admin::AdminInterpreter;
use crate::app::AppContext;
use crate::handoff::Routed;
use crate::responder::ReplyOutcome;

const ADMIN_TEXT_ONLY: &str = "Admin commands must be sent as text. Send `help` for the list.";

/// Terminal result of handling one inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Already processed; nothing sent.
    Duplicate,
    /// Kill-switch active; suspension notice sent.
    Suspended,
    /// Handled as an admin command.
    Admin,
    /// Shop not accepting; closed or paused excuse sent.
    Closed,
    /// Conversation is under human control; forwarded to operators.
    Forwarded,
    /// Media acknowledged without invoking the responder.
    Acknowledged,
    /// Unsupported message kind.
    Ignored,
    /// Answered by the responder.
    Replied(ReplyOutcome),
}

pub struct Dispatcher {
    app: Arc<AppContext>,
    admin: AdminInterpreter,
}

impl Dispatcher {
    pub fn new(app: Arc<AppContext>) -> Self {
        Self {
            admin: AdminInterpreter::new(app.clone()),
            app,
        }
    }

    pub fn app(&self) -> &Arc<AppContext> {
        &self.app
    }

    #[instrument(skip_all, fields(conversation_id = %event.sender, message_id = %event.message_id, kind = event.content.kind()))]
    pub async fn handle(&self, event: InboundEvent) -> Outcome {
        let app = &self.app;
        if !app.dedup.claim(&event.message_id) {
            debug!("duplicate delivery suppressed");
            return Outcome::Duplicate;
        }

        let sender = &event.sender;
        let (active, accepting, excuse) = {
            let shop = app.shop.read().await;
            (
                shop.subscription_active,
                app.hours.is_accepting(&shop, app.clock.now()),
                app.hours.excuse(&shop),
            )
        };

        if !active && !app.is_super_admin(sender) {
            debug!("service suspended, sending notice");
            let _ = app
                .notifier
                .send_text(sender, &app.shop_config.suspension_message)
                .await;
            return Outcome::Suspended;
        }

        if app.is_admin(sender) {
            let reply = match &event.content {
                InboundContent::Text(body) => self.admin.execute(sender, body).await,
                _ => ADMIN_TEXT_ONLY.to_string(),
            };
            let _ = app.notifier.send_text(sender, &reply).await;
            return Outcome::Admin;
        }

        if !accepting {
            debug!("shop not accepting, sending excuse");
            let _ = app.notifier.send_text(sender, &excuse).await;
            return Outcome::Closed;
        }

        match event.content {
            InboundContent::Text(body) => self.converse(sender, &body).await,
            InboundContent::Image { media_id, caption } => {
                self.forward_image(sender, media_id, caption).await
            }
            InboundContent::Audio { .. } => {
                let _ = app
                    .notifier
                    .send_text(sender, &app.shop_config.audio_ack_message)
                    .await;
                Outcome::Acknowledged
            }
            InboundContent::Unsupported(kind) => {
                debug!(kind = %kind, "unsupported message kind ignored");
                Outcome::Ignored
            }
        }
    }

    async fn converse(&self, sender: &ConversationId, body: &str) -> Outcome {
        let app = &self.app;
        if app.handoff.route(sender, body).await == Routed::Forwarded {
            debug!("forwarded to operators");
            return Outcome::Forwarded;
        }

        let reply = app.responder.respond(sender, body).await;
        app.fanout.deliver(sender, body, &reply.text).await;
        if reply.outcome != ReplyOutcome::TotalFailure {
            self.clear_stale_pause().await;
        }
        Outcome::Replied(reply.outcome)
    }

    /// A pause reason left over from before the shop reopened is dropped
    /// after the first customer turn a backend actually answered while
    /// accepting.
    async fn clear_stale_pause(&self) {
        let app = &self.app;
        if app.shop.read().await.pause_reason.is_none() {
            return;
        }
        let mut shop = app.shop.write().await;
        if !app.hours.is_accepting(&shop, app.clock.now()) {
            return;
        }
        if let Some(reason) = shop.pause_reason.take() {
            info!(reason = %reason, "pause reason cleared after reopening");
        }
    }

    async fn forward_image(
        &self,
        sender: &ConversationId,
        media_id: String,
        caption: Option<String>,
    ) -> Outcome {
        let app = &self.app;
        let _ = app
            .notifier
            .send_text(sender, &app.shop_config.image_ack_message)
            .await;

        let code = app.registry.code_for(sender);
        let mut label = format!("📷 Image from {code} ({sender})");
        if let Some(caption) = caption.as_deref().filter(|c| !c.trim().is_empty()) {
            label.push_str(": ");
            label.push_str(caption);
        }
        let result = app
            .notifier
            .broadcast(OutboundPayload::Image {
                media_id,
                caption: Some(label),
            })
            .await;
        info!(
            order_code = %code,
            delivered = result.delivered,
            failed = result.failed,
            "image forwarded to operators"
        );
        Outcome::Acknowledged
    }
}

#[cfg(test)]
mod tests {
    use plugline_core::MessageId;

    use super::*;
    use crate::session::Backend;
    use crate::state::ShopMode;
    use crate::testing::{CUSTOMER, OPERATOR, OWNER, TestApp, midnight, test_app};

    async fn setup() -> (TestApp, Dispatcher) {
        let t = test_app().await;
        let dispatcher = Dispatcher::new(t.app.clone());
        (t, dispatcher)
    }

    fn image(id: &str, caption: Option<&str>) -> InboundEvent {
        InboundEvent {
            message_id: MessageId(id.into()),
            sender: ConversationId::new(CUSTOMER),
            content: InboundContent::Image {
                media_id: "media-1".into(),
                caption: caption.map(str::to_string),
            },
        }
    }

    #[tokio::test]
    async fn customer_text_is_answered() {
        let (t, d) = setup().await;
        t.primary.push_reply("Beef or chicken?").await;
        let outcome = d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await;
        assert_eq!(outcome, Outcome::Replied(ReplyOutcome::Answered(Backend::Primary)));
        assert_eq!(t.channel.texts_to(CUSTOMER).await, vec!["Beef or chicken?"]);
    }

    #[tokio::test]
    async fn duplicate_is_dropped_before_any_send() {
        let (t, d) = setup().await;
        d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await;
        let outcome = d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await;
        assert_eq!(outcome, Outcome::Duplicate);
        assert_eq!(t.channel.sent_count().await, 1);
        assert_eq!(t.primary.call_count().await, 1);
    }

    #[tokio::test]
    async fn closed_shop_sends_excuse_without_responder() {
        let (t, d) = setup().await;
        t.clock.set(midnight());
        let outcome = d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await;
        assert_eq!(outcome, Outcome::Closed);
        assert_eq!(t.primary.call_count().await, 0);
        assert_eq!(
            t.channel.texts_to(CUSTOMER).await,
            vec![t.app.shop_config.closed_message.clone()]
        );
    }

    #[tokio::test]
    async fn admin_bypasses_closed_gate() {
        let (t, d) = setup().await;
        t.clock.set(midnight());
        let outcome = d.handle(InboundEvent::text("m1", OPERATOR, "open")).await;
        assert_eq!(outcome, Outcome::Admin);
        assert_eq!(t.app.shop.read().await.mode, ShopMode::Open);
        assert_eq!(t.channel.texts_to(OPERATOR).await.len(), 1);
    }

    #[tokio::test]
    async fn admin_media_gets_text_only_notice() {
        let (t, d) = setup().await;
        let mut event = image("m1", None);
        event.sender = ConversationId::new(OPERATOR);
        assert_eq!(d.handle(event).await, Outcome::Admin);
        assert_eq!(t.channel.texts_to(OPERATOR).await, vec![ADMIN_TEXT_ONLY]);
    }

    #[tokio::test]
    async fn suspension_blocks_everyone_but_owner() {
        let (t, d) = setup().await;
        t.app.shop.write().await.subscription_active = false;

        assert_eq!(
            d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await,
            Outcome::Suspended
        );
        assert_eq!(
            d.handle(InboundEvent::text("m2", OPERATOR, "status")).await,
            Outcome::Suspended
        );
        assert_eq!(
            d.handle(InboundEvent::text("m3", OWNER, "restart")).await,
            Outcome::Admin
        );
        assert!(t.app.shop.read().await.subscription_active);
        assert_eq!(t.primary.call_count().await, 0);
    }

    #[tokio::test]
    async fn overridden_conversation_skips_responder() {
        let (t, d) = setup().await;
        t.app.overrides.enter(&ConversationId::new(CUSTOMER));
        let outcome = d
            .handle(InboundEvent::text("m1", CUSTOMER, "where is my food"))
            .await;
        assert_eq!(outcome, Outcome::Forwarded);
        assert_eq!(t.primary.call_count().await, 0);
        assert!(t.channel.texts_to(CUSTOMER).await.is_empty());
        assert!(t.channel.texts_to(OPERATOR).await[0].contains("where is my food"));
    }

    #[tokio::test]
    async fn image_is_acknowledged_and_forwarded() {
        let (t, d) = setup().await;
        let outcome = d.handle(image("m1", Some("payment proof"))).await;
        assert_eq!(outcome, Outcome::Acknowledged);
        assert_eq!(
            t.channel.texts_to(CUSTOMER).await,
            vec![t.app.shop_config.image_ack_message.clone()]
        );

        let code = t.app.registry.existing_code(&ConversationId::new(CUSTOMER)).unwrap();
        for op in [OPERATOR, OWNER] {
            let images = t.channel.images_to(op).await;
            assert_eq!(images.len(), 1);
            assert_eq!(images[0].0, "media-1");
            assert_eq!(
                images[0].1.as_deref(),
                Some(format!("📷 Image from {code} ({CUSTOMER}): payment proof").as_str())
            );
        }
        assert_eq!(t.primary.call_count().await, 0);
    }

    #[tokio::test]
    async fn audio_and_unsupported_kinds() {
        let (t, d) = setup().await;
        let audio = InboundEvent {
            message_id: MessageId("m1".into()),
            sender: ConversationId::new(CUSTOMER),
            content: InboundContent::Audio {
                media_id: "a1".into(),
            },
        };
        assert_eq!(d.handle(audio).await, Outcome::Acknowledged);

        let sticker = InboundEvent {
            message_id: MessageId("m2".into()),
            sender: ConversationId::new(CUSTOMER),
            content: InboundContent::Unsupported("sticker".into()),
        };
        assert_eq!(d.handle(sticker).await, Outcome::Ignored);
        assert_eq!(t.channel.sent_count().await, 1);
    }

    #[tokio::test]
    async fn pause_reason_clears_once_reopened() {
        let (t, d) = setup().await;
        d.handle(InboundEvent::text("a1", OPERATOR, "pause gas finished"))
            .await;
        assert_eq!(
            d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await,
            Outcome::Closed
        );
        assert!(t.channel.texts_to(CUSTOMER).await[0].contains("gas finished"));

        d.handle(InboundEvent::text("a2", OPERATOR, "auto")).await;
        assert!(t.app.shop.read().await.pause_reason.is_some());

        d.handle(InboundEvent::text("m2", CUSTOMER, "hi again")).await;
        assert!(t.app.shop.read().await.pause_reason.is_none());
    }

    #[tokio::test]
    async fn pause_reason_survives_total_failure() {
        let (t, d) = setup().await;
        d.handle(InboundEvent::text("a1", OPERATOR, "pause gas finished"))
            .await;
        d.handle(InboundEvent::text("a2", OPERATOR, "auto")).await;

        for _ in 0..3 {
            t.primary.push_failure("down").await;
        }
        assert_eq!(
            d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await,
            Outcome::Replied(ReplyOutcome::TotalFailure)
        );
        assert!(t.app.shop.read().await.pause_reason.is_some());

        // The session failed over, so the next answer comes from the fallback.
        t.fallback.push_reply("welcome back").await;
        assert_eq!(
            d.handle(InboundEvent::text("m2", CUSTOMER, "hi again")).await,
            Outcome::Replied(ReplyOutcome::Answered(Backend::Fallback))
        );
        assert!(t.app.shop.read().await.pause_reason.is_none());
    }

    #[tokio::test]
    async fn total_failure_still_answers() {
        let (t, d) = setup().await;
        t.primary.push_failure("down").await;
        t.primary.push_failure("down").await;
        t.primary.push_failure("down").await;
        let outcome = d.handle(InboundEvent::text("m1", CUSTOMER, "hi")).await;
        assert_eq!(outcome, Outcome::Replied(ReplyOutcome::TotalFailure));
        assert_eq!(
            t.channel.texts_to(CUSTOMER).await,
            vec![t.app.responder.apology().to_string()]
        );
    }
}
