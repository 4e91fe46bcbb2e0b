// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Plugline order router.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Plugline configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluglineConfig {
    /// Agent identity, logging, and system prompt.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Business hours, order codes, and fixed customer-facing texts.
    #[serde(default)]
    pub shop: ShopConfig,

    /// Operator identities.
    #[serde(default)]
    pub admin: AdminConfig,

    /// Retry and failover policy for the generative responder.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Duplicate-delivery filter settings.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Menu context source.
    #[serde(default)]
    pub menu: MenuConfig,

    /// Order persistence settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Webhook HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Agent identity and behavior configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the shop assistant.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
        }
    }
}

fn default_agent_name() -> String {
    "Shawarma Plug".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Business hours and the deterministic texts the router sends on its own.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ShopConfig {
    /// Fixed offset of the business's local time from UTC, in hours.
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,

    /// First local hour (inclusive) at which orders are accepted.
    #[serde(default = "default_open_hour")]
    pub open_hour: u32,

    /// Local hour (exclusive) at which orders stop being accepted.
    #[serde(default = "default_close_hour")]
    pub close_hour: u32,

    /// Prefix of minted order codes, e.g. `SP` gives `SP-4821`.
    #[serde(default = "default_order_code_prefix")]
    pub order_code_prefix: String,

    /// Manual support line offered when the responder is unavailable.
    #[serde(default = "default_support_contact")]
    pub support_contact: String,

    /// Generic closed-for-the-night message.
    #[serde(default = "default_closed_message")]
    pub closed_message: String,

    /// Pause message template; `{reason}` is replaced by the pause reason.
    #[serde(default = "default_pause_message")]
    pub pause_message: String,

    /// Notice sent to everyone but the owner while the subscription is off.
    #[serde(default = "default_suspension_message")]
    pub suspension_message: String,

    /// Acknowledgement sent to a customer who sends an image.
    #[serde(default = "default_image_ack_message")]
    pub image_ack_message: String,

    /// Acknowledgement sent to a customer who sends a voice note.
    #[serde(default = "default_audio_ack_message")]
    pub audio_ack_message: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset_hours(),
            open_hour: default_open_hour(),
            close_hour: default_close_hour(),
            order_code_prefix: default_order_code_prefix(),
            support_contact: default_support_contact(),
            closed_message: default_closed_message(),
            pause_message: default_pause_message(),
            suspension_message: default_suspension_message(),
            image_ack_message: default_image_ack_message(),
            audio_ack_message: default_audio_ack_message(),
        }
    }
}

fn default_utc_offset_hours() -> i32 {
    1 // West Africa Time
}

fn default_open_hour() -> u32 {
    10
}

fn default_close_hour() -> u32 {
    22
}

fn default_order_code_prefix() -> String {
    "SP".to_string()
}

fn default_support_contact() -> String {
    "08133728255".to_string()
}

fn default_closed_message() -> String {
    "Sorry, we're closed for the night! 🌙 Please message us again when we open and we'll sort you out."
        .to_string()
}

fn default_pause_message() -> String {
    "We've paused orders for a bit: {reason}. Please check back shortly 🙏".to_string()
}

fn default_suspension_message() -> String {
    "This service is temporarily unavailable. Please contact the shop directly.".to_string()
}

fn default_image_ack_message() -> String {
    "Got your picture! 📷 I've passed it to the team and someone will take a look.".to_string()
}

fn default_audio_ack_message() -> String {
    "Sorry, I can't listen to voice notes 🙏 Please type your order and I'll help you right away."
        .to_string()
}

/// Operator identities allowed to issue admin commands.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AdminConfig {
    /// Addresses of operators. They receive all operator alerts.
    #[serde(default)]
    pub operators: Vec<String>,

    /// Owner address. The only identity allowed to flip the kill-switch.
    #[serde(default)]
    pub super_admin: Option<String>,
}

/// Retry and failover policy for the generative responder.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResponderConfig {
    /// Retries on the active backend after the first failed attempt.
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Fixed delay between attempts, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Maximum number of history turns carried over on failover.
    #[serde(default = "default_max_carry_turns")]
    pub max_carry_turns: usize,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            max_carry_turns: default_max_carry_turns(),
        }
    }
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay_ms() -> u64 {
    3000
}

fn default_max_carry_turns() -> usize {
    40
}

/// Duplicate-delivery filter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// Once the processed set grows past this many ids it is cleared wholesale.
    #[serde(default = "default_dedup_max_entries")]
    pub max_entries: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_entries: default_dedup_max_entries(),
        }
    }
}

fn default_dedup_max_entries() -> usize {
    1000
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// Gemini API key. `None` requires environment variable.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used by the primary backend.
    #[serde(default = "default_primary_model")]
    pub primary_model: String,

    /// Model used by the fallback backend.
    #[serde(default = "default_fallback_model")]
    pub fallback_model: String,

    /// API base URL.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_gemini_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            primary_model: default_primary_model(),
            fallback_model: default_fallback_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_gemini_timeout_secs(),
        }
    }
}

fn default_primary_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_fallback_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_gemini_timeout_secs() -> u64 {
    60
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Permanent or system-user access token.
    #[serde(default)]
    pub access_token: Option<String>,

    /// Business phone number id that sends replies.
    #[serde(default)]
    pub phone_number_id: Option<String>,

    /// Token expected in the webhook subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// Graph API version segment.
    #[serde(default = "default_whatsapp_api_version")]
    pub api_version: String,

    /// Graph API base URL.
    #[serde(default = "default_whatsapp_base_url")]
    pub base_url: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            phone_number_id: None,
            verify_token: None,
            api_version: default_whatsapp_api_version(),
            base_url: default_whatsapp_base_url(),
        }
    }
}

fn default_whatsapp_api_version() -> String {
    "v17.0".to_string()
}

fn default_whatsapp_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

/// Menu context source configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MenuConfig {
    /// Path to the menu/price text file injected into every turn.
    #[serde(default = "default_menu_file")]
    pub file: String,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            file: default_menu_file(),
        }
    }
}

fn default_menu_file() -> String {
    "menu.md".to_string()
}

/// Order persistence configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("plugline").join("orders.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("orders.db"))
        .to_string_lossy()
        .into_owned()
}

/// Webhook HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Address to bind the server to.
    #[serde(default = "default_gateway_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_gateway_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_gateway_host(),
            port: default_gateway_port(),
        }
    }
}

fn default_gateway_host() -> String {
    "0.0.0.0".to_string()
}

fn default_gateway_port() -> u16 {
    3000
}
