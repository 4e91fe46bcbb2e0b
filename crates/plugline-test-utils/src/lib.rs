// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Plugline integration tests.
//!
//! Provides mock adapters and a harness that assembles the whole routing
//! stack without network access.
//!
//! # Components
//!
//! - [`MockProvider`] - Scripted generative backend
//! - [`MockChannel`] - Captures outbound sends, can fail per recipient
//! - [`MockStorage`] / [`MockMenu`] - In-memory persistence and menu source
//! - [`TestHarness`] - Full dispatcher over mocks and a temp SQLite file

pub mod harness;
pub mod mock_channel;
pub mod mock_provider;
pub mod mock_storage;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_channel::{MockChannel, SentMessage};
pub use mock_provider::MockProvider;
pub use mock_storage::{MockMenu, MockStorage, OrderRow};
