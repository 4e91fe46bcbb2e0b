// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing core of the Plugline order router.
//!
//! The [`AgentLoop`] drains the inbound event queue fed by the webhook
//! gateway and hands each event to the [`Dispatcher`] on its own task:
//! - duplicate suppression and the kill-switch
//! - admin commands from operators
//! - the operating-hours gate
//! - human handoff, the generative responder, and marker fan-out

pub mod admin;
pub mod app;
pub mod dedup;
pub mod dispatcher;
pub mod fanout;
pub mod handoff;
pub mod hours;
pub mod markers;
pub mod notify;
pub mod registry;
pub mod responder;
pub mod session;
pub mod shutdown;
pub mod state;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use plugline_core::InboundEvent;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};

pub use admin::{AdminInterpreter, Command, CommandError};
pub use app::{AppContext, Collaborators};
pub use dispatcher::{Dispatcher, Outcome};
pub use hours::{Clock, FixedClock, OperatingHours, SystemClock};
pub use markers::{MarkerKind, classify};
pub use responder::{Reply, ReplyOutcome, Responder};
pub use session::Backend;
pub use state::{ShopMode, ShopState};

/// How long shutdown waits for in-flight events.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Pulls inbound events off the gateway queue and dispatches each on a
/// tracked task.
pub struct AgentLoop {
    dispatcher: Arc<Dispatcher>,
    inbound_rx: mpsc::Receiver<InboundEvent>,
    tracker: TaskTracker,
}

impl AgentLoop {
    pub fn new(dispatcher: Arc<Dispatcher>, inbound_rx: mpsc::Receiver<InboundEvent>) -> Self {
        Self {
            dispatcher,
            inbound_rx,
            tracker: TaskTracker::new(),
        }
    }

    /// Runs until `cancel` fires or the queue closes, then drains in-flight
    /// events for up to [`DRAIN_TIMEOUT`].
    pub async fn run(mut self, cancel: CancellationToken) {
        info!("agent loop running");

        loop {
            tokio::select! {
                event = self.inbound_rx.recv() => {
                    let Some(event) = event else {
                        info!("inbound queue closed, stopping agent loop");
                        break;
                    };
                    let dispatcher = self.dispatcher.clone();
                    self.tracker.spawn(async move {
                        let outcome = dispatcher.handle(event).await;
                        debug!(outcome = ?outcome, "event handled");
                    });
                }
                _ = cancel.cancelled() => {
                    info!("shutdown signal received, stopping agent loop");
                    break;
                }
            }
        }

        shutdown::drain_tasks(&self.tracker, DRAIN_TIMEOUT).await;
        info!("agent loop stopped");
    }
}
