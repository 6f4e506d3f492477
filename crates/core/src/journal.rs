// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Journal entry schema and normalization.
//!
//! The append path itself (file locking, fsync) lives in `deespec-storage`;
//! this module only owns the entry shape and the normalization rules that
//! must hold regardless of storage backend.

use crate::clock::Clock;
use crate::decision::JournalDecision;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the append-only NDJSON journal.
///
/// `artifacts` is always an array on the wire: a bare string is coerced to
/// a single-element array, and an empty string to an empty array, by
/// [`JournalEntry::normalize`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub ts: String,
    pub turn: u64,
    pub step: String,
    pub decision: String,
    pub elapsed_ms: u64,
    pub error: String,
    pub artifacts: Vec<String>,
}

impl JournalEntry {
    /// Builds an entry with every field already at its normalized default,
    /// so callers only need to override what they know.
    pub fn new(clock: &dyn Clock, turn: u64) -> Self {
        Self {
            ts: clock.now_rfc3339_nanos(),
            turn,
            step: "unknown".to_string(),
            decision: JournalDecision::Pending.as_str().to_string(),
            elapsed_ms: 0,
            error: String::new(),
            artifacts: Vec::new(),
        }
    }

    /// Fills missing `ts`/`step`/`decision` with defaults and coerces
    /// `artifacts` into array form. Idempotent:
    /// `normalize(normalize(e)) == normalize(e)`.
    pub fn normalize(mut self, clock: &dyn Clock) -> Self {
        if self.ts.trim().is_empty() {
            self.ts = clock.now_rfc3339_nanos();
        }
        if self.step.trim().is_empty() {
            self.step = "unknown".to_string();
        }
        if self.decision.trim().is_empty() {
            self.decision = JournalDecision::Pending.as_str().to_string();
        }
        self
    }

    /// Validates a normalized entry against the strict schema. Returns the
    /// first violation found, if any.
    pub fn validate(&self) -> Option<&'static str> {
        if self.ts.is_empty() {
            return Some("ts is empty");
        }
        if self.step.is_empty() {
            return Some("step is empty");
        }
        if !matches!(self.decision.as_str(), "PENDING" | "NEEDS_CHANGES" | "OK") {
            return Some("decision is not one of PENDING, NEEDS_CHANGES, OK");
        }
        None
    }

    /// Parses a raw JSON value into a `JournalEntry`, coercing a bare
    /// string or `""` `artifacts` field into array form before the
    /// strongly-typed deserialization runs.
    pub fn from_value(mut value: Value) -> serde_json::Result<Self> {
        if let Some(obj) = value.as_object_mut() {
            let coerced = match obj.remove("artifacts") {
                Some(Value::String(s)) if s.is_empty() => Value::Array(vec![]),
                Some(Value::String(s)) => Value::Array(vec![Value::String(s)]),
                Some(Value::Null) | None => Value::Array(vec![]),
                Some(other) => other,
            };
            obj.insert("artifacts".to_string(), coerced);
        }
        serde_json::from_value(value)
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
