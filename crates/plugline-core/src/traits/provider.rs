// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Provider adapter trait for generative backends.

use async_trait::async_trait;

use crate::error::PluglineError;
use crate::traits::adapter::PluginAdapter;
use crate::types::TurnRequest;

/// Adapter for a single generative backend instance.
///
/// Implementations make exactly one attempt per call. Retry and failover
/// policy belongs to the caller.
#[async_trait]
pub trait ProviderAdapter: PluginAdapter {
    /// Submits one turn within the given dialogue and returns the reply text.
    async fn generate(&self, request: TurnRequest) -> Result<String, PluglineError>;
}
