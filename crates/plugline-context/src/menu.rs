// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Menu context: a file-backed source and the last-good cache in front of it.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use plugline_core::error::PluglineError;
use plugline_core::traits::{MenuAdapter, PluginAdapter};
use plugline_core::types::{AdapterType, HealthStatus};
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Reads the menu/price text from a local file on every refresh.
#[derive(Debug, Clone)]
pub struct FileMenuSource {
    path: PathBuf,
}

impl FileMenuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl PluginAdapter for FileMenuSource {
    fn name(&self) -> &str {
        "file-menu"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Menu
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(match tokio::fs::metadata(&self.path).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => HealthStatus::Degraded(format!("{}: {e}", self.path.display())),
        })
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl MenuAdapter for FileMenuSource {
    async fn refresh(&self) -> Result<String, PluglineError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| PluglineError::Menu(format!("{}: {e}", self.path.display())))?;
        let content = content.trim();
        if content.is_empty() {
            return Err(PluglineError::Menu(format!(
                "{} is empty",
                self.path.display()
            )));
        }
        Ok(content.to_string())
    }
}

/// Last successfully fetched menu text. A failed refresh leaves it untouched.
pub struct MenuCache {
    source: Arc<dyn MenuAdapter>,
    current: RwLock<String>,
}

impl MenuCache {
    /// Creates an empty cache. Call [`MenuCache::sync`] to populate it.
    pub fn new(source: Arc<dyn MenuAdapter>) -> Self {
        Self {
            source,
            current: RwLock::new(String::new()),
        }
    }

    /// Refreshes from the source. Returns the size of the new text in bytes.
    pub async fn sync(&self) -> Result<usize, PluglineError> {
        match self.source.refresh().await {
            Ok(text) => {
                let len = text.len();
                *self.current.write().await = text;
                info!(source = self.source.name(), bytes = len, "menu context refreshed");
                Ok(len)
            }
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "menu refresh failed, keeping previous context");
                Err(e)
            }
        }
    }

    pub async fn current(&self) -> String {
        self.current.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn file_source_reads_trimmed_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.md");
        std::fs::write(&path, "\nSolo beef N3200\n\n").unwrap();

        let source = FileMenuSource::new(&path);
        assert_eq!(source.refresh().await.unwrap(), "Solo beef N3200");
    }

    #[tokio::test]
    async fn missing_file_is_menu_error() {
        let source = FileMenuSource::new("/nonexistent/menu.md");
        let err = source.refresh().await.unwrap_err();
        assert!(matches!(err, PluglineError::Menu(_)));
        assert!(matches!(
            source.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }

    #[tokio::test]
    async fn failed_sync_keeps_last_good_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("menu.md");
        std::fs::write(&path, "Jumbo chicken N5300").unwrap();

        let cache = MenuCache::new(Arc::new(FileMenuSource::new(&path)));
        assert_eq!(cache.current().await, "");
        cache.sync().await.unwrap();
        assert_eq!(cache.current().await, "Jumbo chicken N5300");

        std::fs::remove_file(&path).unwrap();
        assert!(cache.sync().await.is_err());
        assert_eq!(cache.current().await, "Jumbo chicken N5300");
    }
}
