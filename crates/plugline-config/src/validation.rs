// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.
//!
//! All failures are collected; validation never stops at the first one.

use crate::diagnostic::ConfigError;
use crate::model::PluglineConfig;

/// Validate a deserialized configuration.
pub fn validate_config(config: &PluglineConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let shop = &config.shop;

    if shop.open_hour > 24 {
        errors.push(ConfigError::validation(format!(
            "shop.open_hour must be between 0 and 24, got {}",
            shop.open_hour
        )));
    }
    if shop.close_hour > 24 {
        errors.push(ConfigError::validation(format!(
            "shop.close_hour must be between 0 and 24, got {}",
            shop.close_hour
        )));
    }
    if shop.open_hour >= shop.close_hour {
        errors.push(ConfigError::validation(format!(
            "shop.open_hour ({}) must be earlier than shop.close_hour ({})",
            shop.open_hour, shop.close_hour
        )));
    }
    if !(-12..=14).contains(&shop.utc_offset_hours) {
        errors.push(ConfigError::validation(format!(
            "shop.utc_offset_hours must be between -12 and 14, got {}",
            shop.utc_offset_hours
        )));
    }

    // An all-digit prefix would make codes indistinguishable from raw addresses.
    let prefix = shop.order_code_prefix.trim();
    if prefix.is_empty() || prefix.chars().all(|c| c.is_ascii_digit()) {
        errors.push(ConfigError::validation(format!(
            "shop.order_code_prefix `{prefix}` must contain at least one non-digit character"
        )));
    }
    if prefix.contains(char::is_whitespace) {
        errors.push(ConfigError::validation(
            "shop.order_code_prefix must not contain whitespace",
        ));
    }

    if config.responder.retries > 10 {
        errors.push(ConfigError::validation(format!(
            "responder.retries must be at most 10, got {}",
            config.responder.retries
        )));
    }

    if config.dedup.max_entries == 0 {
        errors.push(ConfigError::validation("dedup.max_entries must be at least 1"));
    }

    for (i, op) in config.admin.operators.iter().enumerate() {
        if op.trim().is_empty() {
            errors.push(ConfigError::validation(format!(
                "admin.operators[{i}] must not be empty"
            )));
        }
    }

    if config.gateway.host.trim().is_empty() {
        errors.push(ConfigError::validation("gateway.host must not be empty"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation(
            "storage.database_path must not be empty",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
