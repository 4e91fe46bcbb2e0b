// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prompt assembly for the Plugline order router.
//!
//! - **Static zone**: the system prompt, loaded once at startup
//! - **Menu cache**: last good menu text, refreshed on demand
//! - **Turn composition**: hidden shop context prepended to each customer turn

pub mod menu;
pub mod static_zone;
pub mod turn;

use std::collections::BTreeSet;
use std::sync::Arc;

use plugline_config::model::AgentConfig;
use plugline_core::error::PluglineError;
use plugline_core::traits::MenuAdapter;

pub use menu::{FileMenuSource, MenuCache};
pub use static_zone::StaticZone;
pub use turn::compose_turn;

/// Owns the system prompt and the menu cache.
pub struct ContextEngine {
    static_zone: StaticZone,
    menu: MenuCache,
}

impl ContextEngine {
    /// Loads the system prompt. The menu cache starts empty.
    pub async fn new(
        agent_config: &AgentConfig,
        menu_source: Arc<dyn MenuAdapter>,
    ) -> Result<Self, PluglineError> {
        Ok(Self {
            static_zone: StaticZone::new(agent_config).await?,
            menu: MenuCache::new(menu_source),
        })
    }

    pub fn system_prompt(&self) -> &str {
        self.static_zone.system_prompt()
    }

    /// Refreshes the menu context. On failure the previous text is kept.
    pub async fn sync_menu(&self) -> Result<usize, PluglineError> {
        self.menu.sync().await
    }

    /// Composes the backend-facing turn for a customer message.
    pub async fn compose(&self, out_of_stock: &BTreeSet<String>, message: &str) -> String {
        let menu = self.menu.current().await;
        compose_turn(&menu, out_of_stock, message)
    }
}
