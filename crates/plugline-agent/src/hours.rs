// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operating-hours gate.
//!
//! Manual `open`/`closed` modes win over the schedule. In `auto` mode the
//! current hour in the business's fixed offset (never the server's zone) is
//! checked against the half-open window `open_hour <= hour < close_hour`.

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use plugline_config::model::ShopConfig;
use plugline_core::PluglineError;

use crate::state::{ShopMode, ShopState};

/// Source of the current time. Swapped for a fixed clock in tests.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Configured business hours and the texts sent while closed.
#[derive(Debug, Clone)]
pub struct OperatingHours {
    offset: FixedOffset,
    open_hour: u32,
    close_hour: u32,
    closed_message: String,
    pause_message: String,
}

impl OperatingHours {
    pub fn from_config(config: &ShopConfig) -> Result<Self, PluglineError> {
        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            PluglineError::Config(format!(
                "shop.utc_offset_hours {} is not a valid offset",
                config.utc_offset_hours
            ))
        })?;
        Ok(Self {
            offset,
            open_hour: config.open_hour,
            close_hour: config.close_hour,
            closed_message: config.closed_message.clone(),
            pause_message: config.pause_message.clone(),
        })
    }

    /// Hour of day (0-23) in business local time.
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.offset).hour()
    }

    /// Whether the schedule alone says the shop is open at `now`.
    pub fn within_schedule(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        self.open_hour <= hour && hour < self.close_hour
    }

    /// Whether orders are being accepted at `now`.
    pub fn is_accepting(&self, state: &ShopState, now: DateTime<Utc>) -> bool {
        match state.mode {
            ShopMode::Open => true,
            ShopMode::Closed => false,
            ShopMode::Auto => self.within_schedule(now),
        }
    }

    /// The deterministic reply sent while closed: the pause message when a
    /// pause reason is set, otherwise the generic closed message.
    pub fn excuse(&self, state: &ShopState) -> String {
        match state.pause_reason.as_deref() {
            Some(reason) => self.pause_message.replace("{reason}", reason),
            None => self.closed_message.clone(),
        }
    }

    /// `"10:00-22:00"` style description, for admin replies.
    pub fn describe(&self) -> String {
        format!("{:02}:00-{:02}:00", self.open_hour, self.close_hour)
    }
}
