// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Plugline order router.
//!
//! This crate provides the trait definitions, error type, and common types
//! shared by the routing core and every collaborator adapter.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PluglineError;
pub use types::{
    AdapterType, ConversationId, HealthStatus, InboundContent, InboundEvent, MessageId,
    OutboundPayload, Role, Turn, TurnRequest,
};

pub use traits::{ChannelAdapter, MenuAdapter, PluginAdapter, ProviderAdapter, StorageAdapter};
