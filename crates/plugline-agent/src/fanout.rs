// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a generated reply into customer delivery, persistence, and
//! operator alerts according to its marker classification.

use std::sync::Arc;

use plugline_core::{ConversationId, MessageId, PluglineError, StorageAdapter};
use tracing::{error, info};

use crate::markers::{Classified, MarkerKind, classify};
use crate::notify::Notifier;
use crate::registry::OrderRegistry;

pub struct FanOut {
    notifier: Arc<Notifier>,
    registry: Arc<OrderRegistry>,
    storage: Arc<dyn StorageAdapter>,
}

/// Result of delivering one reply.
#[derive(Debug)]
pub struct Delivered {
    pub kind: MarkerKind,
    /// Outcome of the customer send.
    pub customer: Result<MessageId, PluglineError>,
}

impl FanOut {
    pub fn new(
        notifier: Arc<Notifier>,
        registry: Arc<OrderRegistry>,
        storage: Arc<dyn StorageAdapter>,
    ) -> Self {
        Self {
            notifier,
            registry,
            storage,
        }
    }

    /// Delivers `reply` to the customer and performs the side effects its
    /// markers call for. `trigger` is the customer message that produced it.
    ///
    /// Persistence and operator failures are logged, never returned.
    pub async fn deliver(
        &self,
        conversation: &ConversationId,
        trigger: &str,
        reply: &str,
    ) -> Delivered {
        let classified = classify(reply);
        let customer = if classified.customer_view.is_empty() {
            Err(PluglineError::Internal(
                "reply was empty after removing markers".into(),
            ))
        } else {
            self.notifier
                .send_text(conversation, &classified.customer_view)
                .await
        };

        if classified.kind != MarkerKind::None {
            self.alert(conversation, trigger, &classified).await;
        }

        Delivered {
            kind: classified.kind,
            customer,
        }
    }

    async fn alert(&self, conversation: &ConversationId, trigger: &str, classified: &Classified) {
        let code = self.registry.code_for(conversation);
        let body = &classified.operator_view;

        let alert = match classified.kind {
            MarkerKind::NewOrder | MarkerKind::AddOnOrder => {
                match self
                    .storage
                    .record_pending_order(conversation, body, &code)
                    .await
                {
                    Ok(()) => info!(conversation_id = %conversation, order_code = %code, kind = %classified.kind, "order recorded"),
                    Err(e) => error!(conversation_id = %conversation, order_code = %code, error = %e, "failed to record order"),
                }
                let title = if classified.kind == MarkerKind::NewOrder {
                    "🛒 NEW ORDER"
                } else {
                    "➕ ADD-ON ORDER"
                };
                format!(
                    "{title} {code} ({conversation})\n\n{body}\n\nConfirm once paid: confirm {code}"
                )
            }
            MarkerKind::HumanNeeded => format!(
                "🚨 {code} ({conversation}) needs a human.\n\nCustomer said:\n{trigger}\n\n\
                 Bot replied:\n{body}\n\nTake over: msg {code} <your message>"
            ),
            MarkerKind::PriceRequest => format!(
                "💰 Price needed for {code} ({conversation})\n\n{body}\n\n\
                 Reply: price {code} <amount>"
            ),
            MarkerKind::AddOnRequest => format!(
                "➕ {code} ({conversation}) wants to add to an order in progress\n\n{body}\n\n\
                 Reply: allow {code}  or  deny {code}"
            ),
            MarkerKind::CancelOrder => {
                format!("❌ {code} ({conversation}) cancelled their order.\n\n{body}")
            }
            MarkerKind::None => return,
        };

        let result = self.notifier.broadcast_text(&alert).await;
        info!(
            conversation_id = %conversation,
            order_code = %code,
            kind = %classified.kind,
            delivered = result.delivered,
            failed = result.failed,
            "operators notified"
        );
    }
}
