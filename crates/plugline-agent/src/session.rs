// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation dialogue sessions.
//!
//! Each session sits behind its own async mutex. The responder holds it for
//! the whole turn, so two messages from one customer are answered in order
//! while unrelated conversations proceed independently.

use std::sync::Arc;

use dashmap::DashMap;
use plugline_core::{ConversationId, Role, Turn};
use strum::Display;
use tokio::sync::Mutex;
use tracing::info;

/// Which generative backend a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Backend {
    Primary,
    Fallback,
}

/// Dialogue state for one conversation.
#[derive(Debug, Clone)]
pub struct Session {
    pub conversation_id: ConversationId,
    pub backend: Backend,
    pub history: Vec<Turn>,
}

impl Session {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            backend: Backend::Primary,
            history: Vec::new(),
        }
    }

    /// Appends one completed user/model exchange.
    pub fn record_exchange(&mut self, user: &str, reply: &str) {
        self.history.push(Turn::user(user));
        self.history.push(Turn::model(reply));
    }

    /// Moves the session onto the fallback backend with `carried` as its
    /// history. There is no transition back to primary.
    pub fn migrate(&mut self, carried: Vec<Turn>) {
        info!(
            conversation_id = %self.conversation_id,
            from = %self.backend,
            carried_turns = carried.len(),
            "session migrated to fallback backend"
        );
        self.backend = Backend::Fallback;
        self.history = carried;
    }
}

/// Longest well-formed tail of `history` with at most `max_turns` turns.
///
/// Well-formed means it starts with a user turn, alternates roles, and is
/// made of complete user/model pairs. An unpaired trailing user turn is
/// dropped. The result may be empty.
pub fn carry_history(history: &[Turn], max_turns: usize) -> Vec<Turn> {
    let mut end = history.len();
    if history.last().is_some_and(|t| t.role == Role::User) {
        end -= 1;
    }

    let mut start = end;
    while start >= 2
        && end - start + 2 <= max_turns
        && history[start - 2].role == Role::User
        && history[start - 1].role == Role::Model
    {
        start -= 2;
    }
    history[start..end].to_vec()
}

/// All live sessions, keyed by conversation.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<ConversationId, Arc<Mutex<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `conversation`, created lazily on first use.
    pub fn handle(&self, conversation: &ConversationId) -> Arc<Mutex<Session>> {
        self.sessions
            .entry(conversation.clone())
            .or_insert_with(|| {
                info!(conversation_id = %conversation, "session created");
                Arc::new(Mutex::new(Session::new(conversation.clone())))
            })
            .clone()
    }

    pub fn get(&self, conversation: &ConversationId) -> Option<Arc<Mutex<Session>>> {
        self.sessions.get(conversation).map(|s| s.clone())
    }

    /// Active backend of an existing session.
    pub async fn backend_of(&self, conversation: &ConversationId) -> Option<Backend> {
        let session = self.get(conversation)?;
        let backend = session.lock().await.backend;
        Some(backend)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
