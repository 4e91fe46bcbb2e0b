// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use plugline_config::model::StorageConfig;
use plugline_core::{
    AdapterType, ConversationId, HealthStatus, PluginAdapter, PluglineError, StorageAdapter,
};

use crate::database::{Database, map_tr_err};
use crate::models::Order;
use crate::queries;

/// SQLite-backed order storage.
///
/// The database is opened lazily by [`StorageAdapter::initialize`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Every recorded order, oldest first.
    pub async fn list_orders(&self) -> Result<Vec<Order>, PluglineError> {
        queries::list_orders(self.db()?).await
    }

    fn db(&self) -> Result<&Database, PluglineError> {
        self.db.get().ok_or_else(|| PluglineError::Storage {
            source: "storage not initialized -- call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        self.db()?
            .connection()
            .call(|conn| -> Result<(), rusqlite::Error> { conn.execute_batch("SELECT 1;") })
            .await
            .map_err(map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        if let Some(db) = self.db.get() {
            db.connection()
                .call(|conn| -> Result<(), rusqlite::Error> {
                    conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
                })
                .await
                .map_err(map_tr_err)?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), PluglineError> {
        let db = Database::open(&self.config.database_path).await?;
        self.db.set(db).map_err(|_| PluglineError::Storage {
            source: "storage already initialized".into(),
        })?;
        info!(path = %self.config.database_path, "order storage initialized");
        Ok(())
    }

    async fn record_pending_order(
        &self,
        conversation: &ConversationId,
        details: &str,
        order_code: &str,
    ) -> Result<(), PluglineError> {
        let id =
            queries::insert_pending(self.db()?, conversation.as_str(), details, order_code).await?;
        debug!(order_id = %id, order_code, "pending order inserted");
        Ok(())
    }

    async fn mark_order_confirmed(
        &self,
        order_code: &str,
    ) -> Result<Option<ConversationId>, PluglineError> {
        let owner = queries::confirm_newest_pending(self.db()?, order_code).await?;
        Ok(owner.map(ConversationId::new))
    }
}
