// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory order persistence and menu source for tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use plugline_core::PluglineError;
use plugline_core::traits::{MenuAdapter, PluginAdapter, StorageAdapter};
use plugline_core::types::{AdapterType, ConversationId, HealthStatus};

/// A recorded order row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRow {
    pub conversation: ConversationId,
    pub details: String,
    pub order_code: String,
    pub confirmed: bool,
}

/// Order storage backed by a `Vec`. Can be switched into a failing mode.
pub struct MockStorage {
    orders: Arc<Mutex<Vec<OrderRow>>>,
    broken: AtomicBool,
}

impl MockStorage {
    pub fn new() -> Self {
        Self {
            orders: Arc::new(Mutex::new(Vec::new())),
            broken: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail.
    pub fn break_storage(&self) {
        self.broken.store(true, Ordering::SeqCst);
    }

    pub async fn orders(&self) -> Vec<OrderRow> {
        self.orders.lock().await.clone()
    }

    fn check(&self) -> Result<(), PluglineError> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(PluglineError::Storage {
                source: "mock storage is broken".into(),
            });
        }
        Ok(())
    }
}

impl Default for MockStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockStorage {
    fn name(&self) -> &str {
        "mock-storage"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MockStorage {
    async fn initialize(&self) -> Result<(), PluglineError> {
        self.check()
    }

    async fn record_pending_order(
        &self,
        conversation: &ConversationId,
        details: &str,
        order_code: &str,
    ) -> Result<(), PluglineError> {
        self.check()?;
        self.orders.lock().await.push(OrderRow {
            conversation: conversation.clone(),
            details: details.to_string(),
            order_code: order_code.to_string(),
            confirmed: false,
        });
        Ok(())
    }

    async fn mark_order_confirmed(
        &self,
        order_code: &str,
    ) -> Result<Option<ConversationId>, PluglineError> {
        self.check()?;
        let mut orders = self.orders.lock().await;
        let newest_pending = orders
            .iter_mut()
            .rev()
            .find(|o| !o.confirmed && o.order_code.eq_ignore_ascii_case(order_code));
        Ok(newest_pending.map(|o| {
            o.confirmed = true;
            o.conversation.clone()
        }))
    }
}

/// Menu source returning a settable text, or failing when unset.
pub struct MockMenu {
    text: Mutex<Option<String>>,
}

impl MockMenu {
    pub fn new(text: &str) -> Self {
        Self {
            text: Mutex::new(Some(text.to_string())),
        }
    }

    /// A menu source whose every refresh fails.
    pub fn unavailable() -> Self {
        Self {
            text: Mutex::new(None),
        }
    }

    pub async fn set(&self, text: Option<&str>) {
        *self.text.lock().await = text.map(str::to_string);
    }
}

#[async_trait]
impl PluginAdapter for MockMenu {
    fn name(&self) -> &str {
        "mock-menu"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Menu
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl MenuAdapter for MockMenu {
    async fn refresh(&self) -> Result<String, PluglineError> {
        self.text
            .lock()
            .await
            .clone()
            .ok_or_else(|| PluglineError::Menu("menu source unavailable".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn confirms_newest_pending_only() {
        let storage = MockStorage::new();
        let a = ConversationId::new("111");
        storage.record_pending_order(&a, "first", "SP-1000").await.unwrap();
        storage.record_pending_order(&a, "second", "SP-1000").await.unwrap();

        assert_eq!(
            storage.mark_order_confirmed("sp-1000").await.unwrap(),
            Some(a.clone())
        );
        let orders = storage.orders().await;
        assert!(!orders[0].confirmed);
        assert!(orders[1].confirmed);
        assert_eq!(storage.mark_order_confirmed("SP-1000").await.unwrap(), Some(a));
        assert_eq!(storage.mark_order_confirmed("SP-1000").await.unwrap(), None);
    }

    #[tokio::test]
    async fn broken_storage_fails() {
        let storage = MockStorage::new();
        storage.break_storage();
        assert!(storage.mark_order_confirmed("SP-1").await.is_err());
    }

    #[tokio::test]
    async fn menu_can_become_unavailable() {
        let menu = MockMenu::new("Solo N3200");
        assert_eq!(menu.refresh().await.unwrap(), "Solo N3200");
        menu.set(None).await;
        assert!(menu.refresh().await.is_err());
    }
}
