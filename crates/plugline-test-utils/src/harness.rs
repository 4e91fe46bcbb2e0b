// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end integration testing.
//!
//! `TestHarness` assembles the complete routing stack: mock channel and
//! backends, a fixed clock, and real SQLite order storage in a temp
//! directory. [`TestHarness::send`] drives one inbound event through the
//! dispatcher exactly as the agent loop would.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use plugline_agent::{AppContext, Collaborators, Dispatcher, FixedClock, Outcome};
use plugline_config::model::{AdminConfig, AgentConfig, PluglineConfig, StorageConfig};
use plugline_context::ContextEngine;
use plugline_core::types::InboundEvent;
use plugline_core::{PluglineError, StorageAdapter};
use plugline_storage::{Order, SqliteStorage};

use crate::mock_channel::MockChannel;
use crate::mock_provider::MockProvider;
use crate::mock_storage::MockMenu;

/// Operator address used when the builder is not told otherwise.
pub const DEFAULT_OPERATOR: &str = "2348000000001";
/// Owner address used when the builder is not told otherwise.
pub const DEFAULT_OWNER: &str = "2348000000009";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    responses: Vec<String>,
    system_prompt: Option<String>,
    menu: String,
    operators: Vec<String>,
    super_admin: Option<String>,
    now: DateTime<Utc>,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            responses: Vec::new(),
            system_prompt: None,
            menu: "Solo beef shawarma N3200\nDouble chicken shawarma N4500".to_string(),
            operators: vec![DEFAULT_OPERATOR.to_string()],
            super_admin: Some(DEFAULT_OWNER.to_string()),
            // 13:00 local at the default UTC+1 offset.
            now: Utc
                .with_ymd_and_hms(2026, 3, 14, 12, 0, 0)
                .single()
                .unwrap_or_else(Utc::now),
        }
    }

    /// Scripted primary backend replies, consumed in order.
    pub fn with_mock_responses(mut self, responses: Vec<String>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string());
        self
    }

    pub fn with_menu(mut self, menu: &str) -> Self {
        self.menu = menu.to_string();
        self
    }

    pub fn with_operators(mut self, operators: &[&str]) -> Self {
        self.operators = operators.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_super_admin(mut self, owner: Option<&str>) -> Self {
        self.super_admin = owner.map(str::to_string);
        self
    }

    /// Starting wall-clock instant for the fixed clock.
    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// Build the test harness, creating all required subsystems.
    pub async fn build(self) -> Result<TestHarness, PluglineError> {
        let temp_dir =
            tempfile::TempDir::new().map_err(|e| PluglineError::Storage { source: e.into() })?;
        let db_path = temp_dir.path().join("orders.db");

        let mut config = PluglineConfig::default();
        config.agent = AgentConfig {
            system_prompt: self
                .system_prompt
                .or(Some("You are the order assistant of a test shop.".to_string())),
            ..AgentConfig::default()
        };
        config.admin = AdminConfig {
            operators: self.operators,
            super_admin: self.super_admin,
        };
        config.storage = StorageConfig {
            database_path: db_path.to_string_lossy().to_string(),
        };
        config.responder.retry_delay_ms = 1;

        let storage = Arc::new(SqliteStorage::new(config.storage.clone()));
        storage.initialize().await?;

        let menu = Arc::new(MockMenu::new(&self.menu));
        let context = Arc::new(ContextEngine::new(&config.agent, menu.clone()).await?);
        context.sync_menu().await?;

        let channel = Arc::new(MockChannel::new());
        let primary = Arc::new(if self.responses.is_empty() {
            MockProvider::new("mock-primary")
        } else {
            MockProvider::with_responses("mock-primary", self.responses)
        });
        let fallback = Arc::new(MockProvider::failing("mock-fallback"));
        let clock = Arc::new(FixedClock::new(self.now));

        let app = Arc::new(AppContext::new(
            &config,
            Collaborators {
                channel: channel.clone(),
                primary: primary.clone(),
                fallback: fallback.clone(),
                storage: storage.clone(),
                context,
            },
            clock.clone(),
        )?);
        let dispatcher = Arc::new(Dispatcher::new(app.clone()));

        Ok(TestHarness {
            dispatcher,
            app,
            channel,
            primary,
            fallback,
            menu,
            clock,
            storage,
            config,
            _temp_dir: temp_dir,
        })
    }
}

/// A complete routing environment with mock adapters and temp storage.
pub struct TestHarness {
    pub dispatcher: Arc<Dispatcher>,
    pub app: Arc<AppContext>,
    pub channel: Arc<MockChannel>,
    /// Primary backend. Answers with a default text once the script runs out.
    pub primary: Arc<MockProvider>,
    /// Fallback backend. Fails unless replies are pushed.
    pub fallback: Arc<MockProvider>,
    pub menu: Arc<MockMenu>,
    pub clock: Arc<FixedClock>,
    /// SQLite storage in the temp directory, removed on drop.
    pub storage: Arc<SqliteStorage>,
    pub config: PluglineConfig,
    _temp_dir: tempfile::TempDir,
}

impl TestHarness {
    /// Create a new builder for configuring the test harness.
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Routes one inbound event.
    pub async fn send(&self, event: InboundEvent) -> Outcome {
        self.dispatcher.handle(event).await
    }

    /// Routes a text message from `sender`.
    pub async fn send_text(&self, message_id: &str, sender: &str, body: &str) -> Outcome {
        self.send(InboundEvent::text(message_id, sender, body)).await
    }

    /// Every persisted order, oldest first.
    pub async fn orders(&self) -> Result<Vec<Order>, PluglineError> {
        self.storage.list_orders().await
    }

    pub fn operator(&self) -> &str {
        self.config
            .admin
            .operators
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_OPERATOR)
    }
}
