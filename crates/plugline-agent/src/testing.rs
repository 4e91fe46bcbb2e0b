// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared fixture for unit tests that need a whole [`AppContext`].

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use plugline_config::model::{AdminConfig, AgentConfig, PluglineConfig};
use plugline_context::ContextEngine;
use plugline_test_utils::{MockChannel, MockMenu, MockProvider, MockStorage};

use crate::app::{AppContext, Collaborators};
use crate::hours::FixedClock;

pub(crate) const OPERATOR: &str = "900";
pub(crate) const OWNER: &str = "999";
pub(crate) const CUSTOMER: &str = "2348011111111";

pub(crate) struct TestApp {
    pub app: Arc<AppContext>,
    pub channel: Arc<MockChannel>,
    pub primary: Arc<MockProvider>,
    pub fallback: Arc<MockProvider>,
    pub storage: Arc<MockStorage>,
    pub menu: Arc<MockMenu>,
    pub clock: Arc<FixedClock>,
}

/// 12:00 UTC is 13:00 at the default UTC+1 offset: inside 10-22.
pub(crate) fn midday() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 12, 0, 0).unwrap()
}

/// 23:00 UTC is midnight local: closed.
pub(crate) fn midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 23, 0, 0).unwrap()
}

pub(crate) async fn test_app() -> TestApp {
    let mut config = PluglineConfig::default();
    config.agent = AgentConfig {
        system_prompt: Some("You sell shawarma.".into()),
        ..Default::default()
    };
    config.admin = AdminConfig {
        operators: vec![OPERATOR.into()],
        super_admin: Some(OWNER.into()),
    };
    config.responder.retry_delay_ms = 10;

    let channel = Arc::new(MockChannel::new());
    let primary = Arc::new(MockProvider::new("primary"));
    let fallback = Arc::new(MockProvider::failing("fallback"));
    let storage = Arc::new(MockStorage::new());
    let menu = Arc::new(MockMenu::new("Solo beef N3200"));
    let clock = Arc::new(FixedClock::new(midday()));

    let context = Arc::new(
        ContextEngine::new(&config.agent, menu.clone())
            .await
            .unwrap(),
    );
    context.sync_menu().await.unwrap();

    let app = AppContext::new(
        &config,
        Collaborators {
            channel: channel.clone(),
            primary: primary.clone(),
            fallback: fallback.clone(),
            storage: storage.clone(),
            context,
        },
        clock.clone(),
    )
    .unwrap();

    TestApp {
        app: Arc::new(app),
        channel,
        primary,
        fallback,
        storage,
        menu,
        clock,
    }
}
