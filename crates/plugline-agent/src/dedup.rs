// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duplicate-delivery filter for the at-least-once webhook source.
//!
//! The set is bounded by clearing it wholesale once full. This trades exact
//! suppression of very old redeliveries for a hard cap on memory.

use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

use plugline_core::MessageId;
use tracing::debug;

pub struct DedupFilter {
    seen: Mutex<HashSet<MessageId>>,
    max_entries: usize,
}

impl DedupFilter {
    pub fn new(max_entries: usize) -> Self {
        Self {
            seen: Mutex::new(HashSet::new()),
            max_entries: max_entries.max(1),
        }
    }

    pub fn seen(&self, id: &MessageId) -> bool {
        self.lock().contains(id)
    }

    pub fn mark_seen(&self, id: &MessageId) {
        let mut seen = self.lock();
        self.insert_bounded(&mut seen, id);
    }

    /// Atomically checks and marks `id`. Returns `true` if this caller is the
    /// first to claim it and should process the message.
    pub fn claim(&self, id: &MessageId) -> bool {
        let mut seen = self.lock();
        if seen.contains(id) {
            debug!(message_id = %id, "duplicate delivery suppressed");
            return false;
        }
        self.insert_bounded(&mut seen, id);
        true
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert_bounded(&self, seen: &mut HashSet<MessageId>, id: &MessageId) {
        if seen.len() >= self.max_entries && !seen.contains(id) {
            debug!(entries = seen.len(), "processed-message set full, clearing");
            seen.clear();
        }
        seen.insert(id.clone());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<MessageId>> {
        self.seen.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
