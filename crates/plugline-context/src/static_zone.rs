// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static zone: loads and holds the system prompt sent with every turn.

use plugline_config::model::AgentConfig;
use plugline_core::error::PluglineError;
use tracing::{info, warn};

/// Marker vocabulary the router understands. Appended to every default prompt
/// so a freshly configured shop produces tickets without extra setup.
const MARKER_RULES: &str = "\
Control markers (put each on its own line, never explain them to the customer):
[NEW_ORDER] ... [END_TICKET] when an order is complete: name, items, protein, extras, total, pickup or delivery.
[ADD_ON_ORDER] ... [END_TICKET] when a confirmed customer adds items to their order.
[ADD_ON_REQUEST] when a customer asks to add to an order already being prepared.
[PRICE_REQUEST] when the customer needs a delivery or custom price you do not know.
[CANCEL_ORDER] when the customer cancels.
[HUMAN_NEEDED] when the customer complains or asks for a person.
Messages starting with [SYSTEM: ...] come from the shop staff; follow them and reply to the customer.";

/// Holds the loaded system prompt text.
#[derive(Debug, Clone)]
pub struct StaticZone {
    system_prompt: String,
}

impl StaticZone {
    /// Loads the system prompt.
    ///
    /// # Priority
    /// 1. `config.system_prompt_file`, read from disk
    /// 2. `config.system_prompt`, inline string
    /// 3. A default shop-assistant prompt naming `config.name`
    pub async fn new(config: &AgentConfig) -> Result<Self, PluglineError> {
        let system_prompt = load_system_prompt(config).await?;
        Ok(Self { system_prompt })
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

async fn load_system_prompt(config: &AgentConfig) -> Result<String, PluglineError> {
    if let Some(ref file_path) = config.system_prompt_file {
        match tokio::fs::read_to_string(file_path).await {
            Ok(content) if !content.trim().is_empty() => {
                info!(path = file_path.as_str(), "loaded system prompt from file");
                return Ok(content.trim().to_string());
            }
            Ok(_) => warn!(path = file_path.as_str(), "system prompt file is empty, falling back"),
            Err(e) => warn!(
                path = file_path.as_str(),
                error = %e,
                "failed to read system prompt file, falling back"
            ),
        }
    }

    if let Some(ref prompt) = config.system_prompt
        && !prompt.trim().is_empty()
    {
        return Ok(prompt.clone());
    }

    Ok(format!(
        "You are the friendly customer service assistant for {}. \
         Take orders, calculate totals from the menu you are given, always confirm beef or chicken, \
         gently suggest extras, and ask whether the order is for pickup or delivery. \
         Keep replies short and warm.\n\n{MARKER_RULES}",
        config.name
    ))
}
