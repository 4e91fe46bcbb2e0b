// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Menu adapter trait for the invisible context injected into every turn.

use async_trait::async_trait;

use crate::error::PluglineError;
use crate::traits::adapter::PluginAdapter;

/// Adapter that produces the current menu/price context text.
#[async_trait]
pub trait MenuAdapter: PluginAdapter {
    /// Fetches a fresh copy of the menu context.
    async fn refresh(&self) -> Result<String, PluglineError>;
}
