// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API channel for the Plugline order router.
//!
//! Inbound: webhook payload parsing and the subscription handshake.
//! Outbound: text and image-by-media-id sends.
//! Webhook signatures are not verified.

pub mod api;
pub mod webhook;

pub use api::WhatsAppChannel;
pub use webhook::{WebhookError, parse_webhook, verify_subscription};
