// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Order identity registry: short `PREFIX-1234` handles for conversations.
//!
//! Both directions live under one lock so they can never disagree.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use plugline_core::ConversationId;
use rand::Rng;
use tracing::info;

/// Random draws per width before the code width grows by one digit.
const DRAWS_PER_WIDTH: usize = 32;

#[derive(Default)]
struct Maps {
    by_conversation: HashMap<ConversationId, String>,
    /// Keyed by upper-cased code.
    by_code: HashMap<String, ConversationId>,
}

pub struct OrderRegistry {
    prefix: String,
    maps: Mutex<Maps>,
}

impl OrderRegistry {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.trim().to_ascii_uppercase(),
            maps: Mutex::new(Maps::default()),
        }
    }

    /// Returns the conversation's code, minting one on first use.
    pub fn code_for(&self, conversation: &ConversationId) -> String {
        let mut maps = self.lock();
        if let Some(code) = maps.by_conversation.get(conversation) {
            return code.clone();
        }
        let code = self.mint(&maps);
        maps.by_code.insert(code.clone(), conversation.clone());
        maps.by_conversation.insert(conversation.clone(), code.clone());
        info!(conversation_id = %conversation, order_code = %code, "order code assigned");
        code
    }

    /// Existing code for a conversation, without minting.
    pub fn existing_code(&self, conversation: &ConversationId) -> Option<String> {
        self.lock().by_conversation.get(conversation).cloned()
    }

    /// Case-insensitive code lookup.
    pub fn conversation_for(&self, code: &str) -> Option<ConversationId> {
        self.lock()
            .by_code
            .get(&code.trim().to_ascii_uppercase())
            .cloned()
    }

    /// Resolves an admin command parameter: a known code first, then a raw
    /// customer address.
    pub fn resolve(&self, param: &str) -> Option<ConversationId> {
        self.conversation_for(param).or_else(|| {
            let param = param.trim();
            is_raw_address(param).then(|| ConversationId::new(param.trim_start_matches('+')))
        })
    }

    /// Re-links a code learned from persistence (e.g. after a restart).
    ///
    /// Does nothing if either side is already registered.
    pub fn restore(&self, conversation: &ConversationId, code: &str) {
        let key = code.trim().to_ascii_uppercase();
        let mut maps = self.lock();
        if maps.by_conversation.contains_key(conversation) || maps.by_code.contains_key(&key) {
            return;
        }
        maps.by_code.insert(key.clone(), conversation.clone());
        maps.by_conversation.insert(conversation.clone(), key);
    }

    pub fn len(&self) -> usize {
        self.lock().by_conversation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn mint(&self, maps: &Maps) -> String {
        let mut rng = rand::thread_rng();
        let mut width = 4u32;
        loop {
            let low = 10u64.pow(width - 1);
            let high = 10u64.pow(width);
            for _ in 0..DRAWS_PER_WIDTH {
                let code = format!("{}-{}", self.prefix, rng.gen_range(low..high));
                if !maps.by_code.contains_key(&code) {
                    return code;
                }
            }
            width += 1;
        }
    }

    fn lock(&self) -> MutexGuard<'_, Maps> {
        self.maps.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Raw customer address shape: optional `+` then 7 to 15 digits.
pub fn is_raw_address(s: &str) -> bool {
    let digits = s.strip_prefix('+').unwrap_or(s);
    (7..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}
