// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative responder with retry and sticky primary-to-fallback failover.
//!
//! A turn runs as a bounded state machine:
//! 1. up to `1 + retries` attempts on the session's active backend, with a
//!    fixed delay between attempts;
//! 2. if that backend was primary, migrate the session to fallback with the
//!    carried history and make exactly one attempt there;
//! 3. otherwise give up with the fixed apology.

use std::sync::Arc;
use std::time::Duration;

use plugline_config::model::ResponderConfig;
use plugline_context::ContextEngine;
use plugline_core::{ConversationId, PluglineError, ProviderAdapter, Turn, TurnRequest};
use tracing::{debug, error, info, warn};

use crate::session::{Backend, SessionStore, carry_history};
use crate::state::SharedShopState;

/// Retry budget and history carry-over limit.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
    pub max_carry_turns: usize,
}

impl From<&ResponderConfig> for RetryPolicy {
    fn from(config: &ResponderConfig) -> Self {
        Self {
            retries: config.retries,
            delay: Duration::from_millis(config.retry_delay_ms),
            max_carry_turns: config.max_carry_turns,
        }
    }
}

/// How a turn ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// The session's active backend answered.
    Answered(Backend),
    /// Primary gave up and the fallback answered after migration.
    FailedOver,
    /// No backend answered; the text is the apology.
    TotalFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub outcome: ReplyOutcome,
}

pub struct Responder {
    primary: Arc<dyn ProviderAdapter>,
    fallback: Arc<dyn ProviderAdapter>,
    sessions: Arc<SessionStore>,
    context: Arc<ContextEngine>,
    shop: SharedShopState,
    policy: RetryPolicy,
    apology: String,
}

impl Responder {
    pub fn new(
        primary: Arc<dyn ProviderAdapter>,
        fallback: Arc<dyn ProviderAdapter>,
        sessions: Arc<SessionStore>,
        context: Arc<ContextEngine>,
        shop: SharedShopState,
        policy: RetryPolicy,
        support_contact: &str,
    ) -> Self {
        Self {
            primary,
            fallback,
            sessions,
            context,
            shop,
            policy,
            apology: format!(
                "Sorry, our system is having trouble right now. Please call {support_contact} to place your order."
            ),
        }
    }

    /// The text returned when every backend has failed.
    pub fn apology(&self) -> &str {
        &self.apology
    }

    /// Answers one user turn within the conversation's session.
    ///
    /// Never fails: total backend failure is reported as
    /// [`ReplyOutcome::TotalFailure`] carrying the apology text.
    pub async fn respond(&self, conversation: &ConversationId, user_turn: &str) -> Reply {
        let handle = self.sessions.handle(conversation);
        let mut session = handle.lock().await;

        let out_of_stock = self.shop.read().await.out_of_stock.clone();
        let composed = self.context.compose(&out_of_stock, user_turn).await;
        let active = session.backend;

        match self
            .attempt_with_retries(conversation, active, &session.history, &composed)
            .await
        {
            Ok(text) => {
                session.record_exchange(user_turn, &text);
                debug!(conversation_id = %conversation, backend = %active, "turn answered");
                return Reply {
                    text,
                    outcome: ReplyOutcome::Answered(active),
                };
            }
            Err(e) if active == Backend::Fallback => {
                error!(conversation_id = %conversation, error = %e, "fallback backend failed, giving up");
                return self.total_failure();
            }
            Err(e) => {
                warn!(conversation_id = %conversation, error = %e, "primary backend exhausted retries, failing over");
            }
        }

        let carried = carry_history(&session.history, self.policy.max_carry_turns);
        session.migrate(carried);

        let request = self.request(session.history.clone(), &composed);
        match self.fallback.generate(request).await {
            Ok(text) => {
                session.record_exchange(user_turn, &text);
                info!(conversation_id = %conversation, "fallback backend answered after failover");
                Reply {
                    text,
                    outcome: ReplyOutcome::FailedOver,
                }
            }
            Err(e) => {
                error!(conversation_id = %conversation, error = %e, "fallback backend failed after failover");
                self.total_failure()
            }
        }
    }

    async fn attempt_with_retries(
        &self,
        conversation: &ConversationId,
        backend: Backend,
        history: &[Turn],
        composed: &str,
    ) -> Result<String, PluglineError> {
        let provider = self.provider(backend);
        let attempts = 1 + self.policy.retries;
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.policy.delay).await;
            }
            match provider.generate(self.request(history.to_vec(), composed)).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!(
                        conversation_id = %conversation,
                        backend = %backend,
                        attempt,
                        attempts,
                        error = %e,
                        "backend attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| PluglineError::provider("no attempts were made")))
    }

    fn provider(&self, backend: Backend) -> &Arc<dyn ProviderAdapter> {
        match backend {
            Backend::Primary => &self.primary,
            Backend::Fallback => &self.fallback,
        }
    }

    fn request(&self, history: Vec<Turn>, composed: &str) -> TurnRequest {
        TurnRequest {
            system_prompt: self.context.system_prompt().to_string(),
            history,
            message: composed.to_string(),
        }
    }

    fn total_failure(&self) -> Reply {
        Reply {
            text: self.apology.clone(),
            outcome: ReplyOutcome::TotalFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use plugline_config::model::AgentConfig;
    use plugline_core::Role;
    use plugline_test_utils::{MockMenu, MockProvider};
    use tokio::time::Instant;

    use super::*;

    struct Fixture {
        responder: Responder,
        primary: Arc<MockProvider>,
        fallback: Arc<MockProvider>,
        sessions: Arc<SessionStore>,
        shop: SharedShopState,
    }

    async fn fixture(primary: MockProvider, fallback: MockProvider) -> Fixture {
        let primary = Arc::new(primary);
        let fallback = Arc::new(fallback);
        let sessions = Arc::new(SessionStore::new());
        let shop = SharedShopState::default();
        let config = AgentConfig {
            system_prompt: Some("You sell shawarma.".into()),
            ..Default::default()
        };
        let context = Arc::new(
            ContextEngine::new(&config, Arc::new(MockMenu::new("Solo beef N3200")))
                .await
                .unwrap(),
        );
        context.sync_menu().await.unwrap();

        let responder = Responder::new(
            primary.clone(),
            fallback.clone(),
            sessions.clone(),
            context,
            shop.clone(),
            RetryPolicy::from(&ResponderConfig::default()),
            "0800-PLUG",
        );
        Fixture {
            responder,
            primary,
            fallback,
            sessions,
            shop,
        }
    }

    fn conv() -> ConversationId {
        ConversationId::new("2348011111111")
    }

    #[tokio::test(start_paused = true)]
    async fn primary_success_records_raw_turn() {
        let f = fixture(
            MockProvider::with_responses("primary", vec!["Beef or chicken?".into()]),
            MockProvider::failing("fallback"),
        )
        .await;

        let reply = f.responder.respond(&conv(), "one solo").await;
        assert_eq!(reply.text, "Beef or chicken?");
        assert_eq!(reply.outcome, ReplyOutcome::Answered(Backend::Primary));

        let sent = &f.primary.requests().await[0];
        assert_eq!(sent.system_prompt, "You sell shawarma.");
        assert!(sent.message.contains("Solo beef N3200"));
        assert!(sent.message.ends_with("one solo"));

        let session = f.sessions.handle(&conv());
        let session = session.lock().await;
        assert_eq!(session.history, vec![Turn::user("one solo"), Turn::model("Beef or chicken?")]);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_with_fixed_delay_then_succeeds() {
        let primary = MockProvider::new("primary");
        primary.push_failure("503").await;
        primary.push_failure("503").await;
        primary.push_reply("third time lucky").await;
        let f = fixture(primary, MockProvider::failing("fallback")).await;

        let start = Instant::now();
        let reply = f.responder.respond(&conv(), "hi").await;
        assert_eq!(reply.text, "third time lucky");
        assert_eq!(f.primary.call_count().await, 3);
        assert_eq!(f.fallback.call_count().await, 0);
        // Two sleeps of the default 3s delay, none before the first attempt.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(6000), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(6100), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn failover_is_sticky_and_carries_history() {
        let primary = MockProvider::new("primary");
        primary.push_reply("Welcome!").await;
        let f = fixture(
            primary,
            MockProvider::with_responses("fallback", vec!["From fallback".into(), "Again".into()]),
        )
        .await;

        // First turn succeeds on primary.
        let first = f.responder.respond(&conv(), "hello").await;
        assert_eq!(first.outcome, ReplyOutcome::Answered(Backend::Primary));

        // Primary is down for the whole retry budget of the next turn.
        for _ in 0..3 {
            f.primary.push_failure("down").await;
        }
        let second = f.responder.respond(&conv(), "menu?").await;
        assert_eq!(second.text, "From fallback");
        assert_eq!(second.outcome, ReplyOutcome::FailedOver);
        assert_eq!(f.primary.call_count().await, 4);

        let carried = &f.fallback.requests().await[0].history;
        assert_eq!(carried, &vec![Turn::user("hello"), Turn::model("Welcome!")]);

        // Sticky: the next turn goes straight to fallback.
        let third = f.responder.respond(&conv(), "thanks").await;
        assert_eq!(third.outcome, ReplyOutcome::Answered(Backend::Fallback));
        assert_eq!(f.primary.call_count().await, 4);
        assert_eq!(f.sessions.backend_of(&conv()).await, Some(Backend::Fallback));
    }

    #[tokio::test(start_paused = true)]
    async fn total_failure_returns_apology_and_keeps_history() {
        let f = fixture(MockProvider::failing("primary"), MockProvider::failing("fallback")).await;

        let reply = f.responder.respond(&conv(), "hi").await;
        assert_eq!(reply.outcome, ReplyOutcome::TotalFailure);
        assert_eq!(
            reply.text,
            "Sorry, our system is having trouble right now. Please call 0800-PLUG to place your order."
        );
        assert_eq!(f.primary.call_count().await, 3);
        assert_eq!(f.fallback.call_count().await, 1);

        // Failover happened even though fallback failed.
        assert_eq!(f.sessions.backend_of(&conv()).await, Some(Backend::Fallback));

        // A failing fallback gets its own full retry budget, then gives up.
        let again = f.responder.respond(&conv(), "hello?").await;
        assert_eq!(again.outcome, ReplyOutcome::TotalFailure);
        assert_eq!(f.primary.call_count().await, 3);
        assert_eq!(f.fallback.call_count().await, 4);

        let session = f.sessions.handle(&conv());
        assert!(session.lock().await.history.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_stock_is_injected_fresh_each_turn() {
        let f = fixture(MockProvider::new("primary"), MockProvider::failing("fallback")).await;

        f.responder.respond(&conv(), "first").await;
        f.shop.write().await.out_of_stock.insert("cheese".into());
        f.responder.respond(&conv(), "second").await;

        let requests = f.primary.requests().await;
        assert!(!requests[0].message.contains("cheese"));
        assert!(requests[1].message.contains("cheese"));
        // History holds the raw turns, never the context block.
        assert!(
            requests[1]
                .history
                .iter()
                .filter(|t| t.role == Role::User)
                .all(|t| !t.text.contains("CONTEXT"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn conversations_do_not_share_sessions() {
        let f = fixture(MockProvider::new("primary"), MockProvider::new("fallback")).await;
        for _ in 0..3 {
            f.primary.push_failure("down").await;
        }
        f.responder.respond(&conv(), "a").await;
        f.responder.respond(&ConversationId::new("2348022222222"), "b").await;

        assert_eq!(f.sessions.backend_of(&conv()).await, Some(Backend::Fallback));
        assert_eq!(
            f.sessions
                .backend_of(&ConversationId::new("2348022222222"))
                .await,
            Some(Backend::Primary)
        );
    }
}
