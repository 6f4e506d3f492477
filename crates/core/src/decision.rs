// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Review decisions: the surface-string parser and the on-disk journal form.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a review step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Pending,
    NeedsChanges,
    Succeeded,
    Failed,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Pending => "PENDING",
            Decision::NeedsChanges => "NEEDS_CHANGES",
            Decision::Succeeded => "SUCCEEDED",
            Decision::Failed => "FAILED",
        }
    }

    pub fn is_final(self) -> bool {
        matches!(self, Decision::Succeeded | Decision::Failed)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Collapsed form written to the journal: `{OK, NEEDS_CHANGES, PENDING}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JournalDecision {
    Ok,
    NeedsChanges,
    Pending,
}

impl JournalDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            JournalDecision::Ok => "OK",
            JournalDecision::NeedsChanges => "NEEDS_CHANGES",
            JournalDecision::Pending => "PENDING",
        }
    }
}

impl fmt::Display for JournalDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<Decision> for JournalDecision {
    fn from(d: Decision) -> Self {
        match d {
            Decision::Pending => JournalDecision::Pending,
            Decision::Succeeded => JournalDecision::Ok,
            Decision::NeedsChanges | Decision::Failed => JournalDecision::NeedsChanges,
        }
    }
}

/// Parses a surface string from agent output into a [`Decision`].
///
/// Case-insensitive, whitespace-trimmed. Unrecognized non-empty input is
/// treated as `NEEDS_CHANGES` rather than rejected, since a malformed
/// review response is itself a signal the attempt needs another pass.
pub fn parse_decision(raw: &str) -> Decision {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decision::Pending;
    }
    let normalized = trimmed.to_ascii_uppercase().replace([' ', '-'], "_");
    match normalized.as_str() {
        "OK" | "APPROVED" | "PASS" | "SUCCEEDED" | "SUCCESS" => Decision::Succeeded,
        "FAIL" | "FAILED" | "REJECT" | "REJECTED" | "NEEDS_CHANGES" | "NEEDSCHANGES" => {
            Decision::NeedsChanges
        }
        _ => Decision::NeedsChanges,
    }
}

#[cfg(test)]
#[path = "decision_tests.rs"]
mod tests;
