// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook HTTP gateway for the Plugline order router.
//!
//! Acknowledges WhatsApp deliveries immediately and queues the parsed
//! events for the agent loop; processing never happens on the request path.

pub mod handlers;
pub mod server;

pub use server::{GatewayState, HealthState, ServerConfig, build_router, start_server};
