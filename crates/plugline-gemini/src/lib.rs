// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini generative backend for the Plugline order router.
//!
//! One [`GeminiProvider`] wraps one model. The primary and fallback backends
//! are two instances differing only in model id.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use plugline_config::model::GeminiConfig;
use plugline_core::{
    AdapterType, HealthStatus, PluginAdapter, PluglineError, ProviderAdapter, Role, TurnRequest,
};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateContentRequest, Part, SystemInstruction};

/// Gemini provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `GEMINI_API_KEY` env var -> error.
pub struct GeminiProvider {
    client: GeminiClient,
    name: String,
}

impl GeminiProvider {
    pub fn new(config: &GeminiConfig, model: &str) -> Result<Self, PluglineError> {
        let api_key = resolve_api_key(&config.api_key)?;
        let client = GeminiClient::new(
            &api_key,
            &config.base_url,
            model,
            Duration::from_secs(config.timeout_secs),
        )?;
        info!(model, "Gemini provider initialized");
        Ok(Self {
            client,
            name: format!("gemini:{model}"),
        })
    }

    /// Builds the primary and fallback backends from one config section.
    pub fn pair(config: &GeminiConfig) -> Result<(Self, Self), PluglineError> {
        Ok((
            Self::new(config, &config.primary_model)?,
            Self::new(config, &config.fallback_model)?,
        ))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }
}

/// Converts a turn request into Gemini's wire shape: history in order, then
/// the composed user turn.
pub fn to_wire_request(request: &TurnRequest) -> GenerateContentRequest {
    let system_instruction = (!request.system_prompt.trim().is_empty()).then(|| {
        SystemInstruction {
            parts: vec![Part::text(&request.system_prompt)],
        }
    });

    let mut contents: Vec<Content> = request
        .history
        .iter()
        .map(|turn| Content {
            role: Some(wire_role(turn.role).to_string()),
            parts: vec![Part::text(&turn.text)],
        })
        .collect();
    contents.push(Content {
        role: Some(wire_role(Role::User).to_string()),
        parts: vec![Part::text(&request.message)],
    });

    GenerateContentRequest {
        system_instruction,
        contents,
    }
}

fn wire_role(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Model => "model",
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Result<String, PluglineError> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Ok(key.clone());
    }

    std::env::var("GEMINI_API_KEY").map_err(|_| {
        PluglineError::Config(
            "Gemini API key not found. Set gemini.api_key in config or GEMINI_API_KEY environment variable.".into(),
        )
    })
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
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
impl ProviderAdapter for GeminiProvider {
    async fn generate(&self, request: TurnRequest) -> Result<String, PluglineError> {
        debug!(
            model = self.model(),
            history = request.history.len(),
            "sending turn to Gemini"
        );
        self.client.generate(&to_wire_request(&request)).await
    }
}
