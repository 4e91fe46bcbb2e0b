// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Layered configuration loading with Figment.
//!
//! Lookup order: `./plugline.toml` > `~/.config/plugline/plugline.toml` >
//! `/etc/plugline/plugline.toml`, with `PLUGLINE_*` environment overrides on top.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PluglineConfig;

/// Sections addressable through `PLUGLINE_<SECTION>_<KEY>` variables.
const ENV_SECTIONS: &[&str] = &[
    "agent",
    "shop",
    "admin",
    "responder",
    "dedup",
    "gemini",
    "whatsapp",
    "menu",
    "storage",
    "gateway",
];

pub(crate) const SYSTEM_CONFIG: &str = "/etc/plugline/plugline.toml";
pub(crate) const LOCAL_CONFIG: &str = "plugline.toml";

pub(crate) fn user_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("plugline/plugline.toml"))
        .unwrap_or_default()
}

/// Build the full figment: defaults, system, user, local file, then env.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PluglineConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG))
        .merge(Toml::file(user_config_path()))
        .merge(Toml::file(LOCAL_CONFIG))
        .merge(env_provider())
}

/// Load configuration from the standard hierarchy with env overrides.
pub fn load_config() -> Result<PluglineConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from an inline TOML string. No files, no env.
pub fn load_config_from_str(toml_content: &str) -> Result<PluglineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluglineConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from an explicit file, still honoring env overrides.
pub fn load_config_from_path(path: &Path) -> Result<PluglineConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluglineConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Env provider mapping `PLUGLINE_SHOP_OPEN_HOUR` to `shop.open_hour`.
///
/// Only the first underscore after a known section name becomes a dot, so
/// keys that contain underscores themselves stay intact.
fn env_provider() -> Env {
    Env::prefixed("PLUGLINE_").map(|key| map_env_key(&key.as_str().to_ascii_lowercase()).into())
}

fn map_env_key(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
