// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Application context: every piece of process-wide state, built once at
//! startup and handed to the dispatcher. Nothing in the crate is global.

use std::collections::HashSet;
use std::sync::Arc;

use plugline_config::model::{PluglineConfig, ShopConfig};
use plugline_context::ContextEngine;
use plugline_core::{
    ChannelAdapter, ConversationId, PluglineError, ProviderAdapter, StorageAdapter,
};

use crate::dedup::DedupFilter;
use crate::fanout::FanOut;
use crate::handoff::{HandoffRouter, HumanOverrides};
use crate::hours::{Clock, OperatingHours};
use crate::notify::Notifier;
use crate::registry::OrderRegistry;
use crate::responder::{Responder, RetryPolicy};
use crate::session::SessionStore;
use crate::state::SharedShopState;

/// External collaborators the routing core talks to.
pub struct Collaborators {
    pub channel: Arc<dyn ChannelAdapter>,
    pub primary: Arc<dyn ProviderAdapter>,
    pub fallback: Arc<dyn ProviderAdapter>,
    pub storage: Arc<dyn StorageAdapter>,
    pub context: Arc<ContextEngine>,
}

pub struct AppContext {
    pub shop_config: ShopConfig,
    pub shop: SharedShopState,
    pub hours: OperatingHours,
    pub clock: Arc<dyn Clock>,
    pub dedup: DedupFilter,
    pub sessions: Arc<SessionStore>,
    pub registry: Arc<OrderRegistry>,
    pub overrides: Arc<HumanOverrides>,
    pub notifier: Arc<Notifier>,
    pub responder: Arc<Responder>,
    pub fanout: Arc<FanOut>,
    pub handoff: HandoffRouter,
    pub context: Arc<ContextEngine>,
    pub storage: Arc<dyn StorageAdapter>,
    operators: HashSet<ConversationId>,
    super_admin: Option<ConversationId>,
}

impl AppContext {
    pub fn new(
        config: &PluglineConfig,
        collaborators: Collaborators,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, PluglineError> {
        let Collaborators {
            channel,
            primary,
            fallback,
            storage,
            context,
        } = collaborators;

        let shop = SharedShopState::default();
        let sessions = Arc::new(SessionStore::new());
        let registry = Arc::new(OrderRegistry::new(&config.shop.order_code_prefix));
        let overrides = Arc::new(HumanOverrides::new());
        let notifier = Arc::new(Notifier::new(channel, &config.admin));
        let responder = Arc::new(Responder::new(
            primary,
            fallback,
            sessions.clone(),
            context.clone(),
            shop.clone(),
            RetryPolicy::from(&config.responder),
            &config.shop.support_contact,
        ));
        let fanout = Arc::new(FanOut::new(
            notifier.clone(),
            registry.clone(),
            storage.clone(),
        ));
        let handoff = HandoffRouter::new(overrides.clone(), registry.clone(), notifier.clone());

        let operators = config
            .admin
            .operators
            .iter()
            .map(|a| ConversationId::new(a.trim()))
            .collect();
        let super_admin = config
            .admin
            .super_admin
            .as_deref()
            .map(|a| ConversationId::new(a.trim()));

        Ok(Self {
            shop_config: config.shop.clone(),
            shop,
            hours: OperatingHours::from_config(&config.shop)?,
            clock,
            dedup: DedupFilter::new(config.dedup.max_entries),
            sessions,
            registry,
            overrides,
            notifier,
            responder,
            fanout,
            handoff,
            context,
            storage,
            operators,
            super_admin,
        })
    }

    /// Operators and the super-admin may issue commands.
    pub fn is_admin(&self, sender: &ConversationId) -> bool {
        self.operators.contains(sender) || self.is_super_admin(sender)
    }

    pub fn is_super_admin(&self, sender: &ConversationId) -> bool {
        self.super_admin.as_ref() == Some(sender)
    }
}
