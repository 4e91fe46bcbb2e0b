// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock generative backend for deterministic testing.
//!
//! `MockProvider` pops scripted outcomes from a FIFO queue. When the queue is
//! empty it either answers with a default text or fails, depending on how it
//! was built. Every request is recorded for assertions on history carry-over.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use plugline_core::PluglineError;
use plugline_core::traits::adapter::PluginAdapter;
use plugline_core::traits::provider::ProviderAdapter;
use plugline_core::types::{AdapterType, HealthStatus, TurnRequest};

/// A scripted provider that records what it was asked.
pub struct MockProvider {
    name: String,
    script: Arc<Mutex<VecDeque<Result<String, String>>>>,
    /// `Some(text)` answers with `text` once the script runs dry, `None` fails.
    default: Option<String>,
    requests: Arc<Mutex<Vec<TurnRequest>>>,
}

impl MockProvider {
    /// A provider that answers "mock response" whenever its script is empty.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            default: Some("mock response".to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider pre-loaded with successful replies.
    pub fn with_responses(name: &str, responses: Vec<String>) -> Self {
        let provider = Self::new(name);
        let script = responses.into_iter().map(Ok).collect();
        Self {
            script: Arc::new(Mutex::new(script)),
            ..provider
        }
    }

    /// A provider that fails every call.
    pub fn failing(name: &str) -> Self {
        Self {
            default: None,
            ..Self::new(name)
        }
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, text: &str) {
        self.script.lock().await.push_back(Ok(text.to_string()));
    }

    /// Queue a failure.
    pub async fn push_failure(&self, message: &str) {
        self.script.lock().await.push_back(Err(message.to_string()));
    }

    /// Every request received so far, in order.
    pub async fn requests(&self) -> Vec<TurnRequest> {
        self.requests.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }
}

#[async_trait]
impl PluginAdapter for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, PluglineError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PluglineError> {
        Ok(())
    }
}

#[async_trait]
impl ProviderAdapter for MockProvider {
    async fn generate(&self, request: TurnRequest) -> Result<String, PluglineError> {
        self.requests.lock().await.push(request);
        let next = self.script.lock().await.pop_front();
        match next {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(PluglineError::provider(message)),
            None => self
                .default
                .clone()
                .ok_or_else(|| PluglineError::provider(format!("{} is down", self.name))),
        }
    }
}
