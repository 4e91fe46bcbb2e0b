// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shop-wide mutable state shared by the gate, the responder, and the
//! admin interpreter.

use std::collections::BTreeSet;
use std::sync::Arc;

use strum::{Display, EnumString};
use tokio::sync::RwLock;

/// How the operating-hours gate decides whether the shop is accepting orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ShopMode {
    /// Follow the configured schedule.
    #[default]
    Auto,
    /// Manually forced open.
    Open,
    /// Manually forced closed.
    Closed,
}

/// Process-wide shop state. Written only by the admin interpreter, except
/// for the one-shot clearing of `pause_reason` once the shop reopens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShopState {
    pub mode: ShopMode,
    pub pause_reason: Option<String>,
    /// Lower-cased item keys currently unavailable.
    pub out_of_stock: BTreeSet<String>,
    /// Kill-switch. While false, only the super-admin gets through.
    pub subscription_active: bool,
}

impl Default for ShopState {
    fn default() -> Self {
        Self {
            mode: ShopMode::Auto,
            pause_reason: None,
            out_of_stock: BTreeSet::new(),
            subscription_active: true,
        }
    }
}

pub type SharedShopState = Arc<RwLock<ShopState>>;
