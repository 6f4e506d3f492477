// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock data model shared by the three lock kinds.
//!
//! Persistence (SQL tables, acquire/release/heartbeat/extend operations,
//! stale reclamation) lives in `deespec-locks`; this module owns only the
//! shapes those operations pass around.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which lock table a [`StateLock`]/[`ExecutionLock`] request is tagged as.
/// A fresh acquire of an existing, non-stale row fails regardless of the
/// requested type — this is an audit tag, not shared-read semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LockType {
    Read,
    Write,
}

/// Fields common to every lock kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockBase {
    pub lock_id: String,
    pub pid: u32,
    pub hostname: String,
    pub acquired_at: DateTime<Utc>,
    pub heartbeat_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl LockBase {
    /// True if `expires_at` has passed, or the holder is on this host and
    /// no longer alive. Cross-host holders are live until `expires_at`.
    pub fn is_stale(&self, now: DateTime<Utc>, local_hostname: &str, process_alive: impl Fn(u32) -> bool) -> bool {
        if self.expires_at < now {
            return true;
        }
        self.hostname == local_hostname && !process_alive(self.pid)
    }
}

/// Process-wide lease; at most one holder per key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLock {
    #[serde(flatten)]
    pub base: LockBase,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Persistence-path lease with a read/write tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateLock {
    #[serde(flatten)]
    pub base: LockBase,
    pub lock_type: LockType,
}

/// Per-item lease held for the duration of one loop iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionLock {
    #[serde(flatten)]
    pub base: LockBase,
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
