// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time source abstraction so entity and service tests never depend on
//! wall-clock time.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Source of the current time, injected everywhere `now()` would otherwise
/// be called directly.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// RFC3339 with nanosecond precision, UTC — the journal's `ts` format.
    fn now_rfc3339_nanos(&self) -> String {
        self.now().to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
    }
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Deterministic clock for tests. Starts at a fixed instant and only moves
/// when explicitly advanced.
#[derive(Clone)]
pub struct FakeClock {
    micros_since_epoch: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            micros_since_epoch: Arc::new(AtomicI64::new(start.timestamp_micros())),
        }
    }

    pub fn advance(&self, duration: chrono::Duration) {
        self.micros_since_epoch
            .fetch_add(duration.num_microseconds().unwrap_or(0), Ordering::SeqCst);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        let epoch = Utc
            .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self::new(epoch)
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_micros(self.micros_since_epoch.load(Ordering::SeqCst))
            .unwrap_or_else(Utc::now)
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
