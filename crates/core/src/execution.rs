// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-item execution entity: a pure state machine over [`Step`].

use crate::decision::Decision;
use crate::error::DeespecError;
use crate::step::{Status, Step};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// `"{item_id}_{started_at_unix}"`.
    pub struct ExecutionId;
}

impl ExecutionId {
    pub fn for_item(item_id: &str, started_at: DateTime<Utc>) -> Self {
        Self::new(format!("{item_id}_{}", started_at.timestamp()))
    }
}

/// Highest attempt value any execution can reach. `attempt ∈ [0, MAX_ATTEMPT]`.
pub const MAX_ATTEMPT: u8 = 4;
/// Attempt threshold at which a `NEEDS_CHANGES` review triggers force-termination.
pub const FORCE_TERMINATE_ATTEMPT: u8 = 3;

/// A single traversal of the ten-step pipeline for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: ExecutionId,
    pub item_id: String,
    pub step: Step,
    pub status: Status,
    pub decision: Decision,
    pub attempt: u8,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// True once this execution has entered `reviewer_force_implement`.
    /// Distinguishes a direct `third_review` success (8-step path) from a
    /// force-terminated run (10-step path) once both have reached `done`.
    #[serde(default)]
    pub force_terminated: bool,
}

/// Allowed destination steps for each source step, in the order the
/// protocol prose lists them. Used by [`Execution::transition_to`] to
/// reject skips and backward edges.
fn allowed_targets(from: Step) -> &'static [Step] {
    match from {
        Step::Ready => &[Step::ImplementTry],
        Step::ImplementTry => &[Step::FirstReview],
        Step::FirstReview => &[Step::Done, Step::ImplementSecondTry],
        Step::ImplementSecondTry => &[Step::SecondReview],
        Step::SecondReview => &[Step::Done, Step::ImplementThirdTry],
        Step::ImplementThirdTry => &[Step::ThirdReview],
        Step::ThirdReview => &[Step::Done, Step::ReviewerForceImplement],
        Step::ReviewerForceImplement => &[Step::ImplementerReview],
        Step::ImplementerReview => &[Step::Done],
        Step::Done => &[Step::Done],
    }
}

/// Deterministic function of `(step, decision)`; pure and total.
pub fn next_step(step: Step, decision: Decision) -> Step {
    match step {
        Step::Ready => Step::ImplementTry,
        Step::ImplementTry => Step::FirstReview,
        Step::FirstReview => {
            if decision == Decision::Succeeded {
                Step::Done
            } else {
                Step::ImplementSecondTry
            }
        }
        Step::ImplementSecondTry => Step::SecondReview,
        Step::SecondReview => {
            if decision == Decision::Succeeded {
                Step::Done
            } else {
                Step::ImplementThirdTry
            }
        }
        Step::ImplementThirdTry => Step::ThirdReview,
        Step::ThirdReview => {
            if decision == Decision::Succeeded {
                Step::Done
            } else {
                Step::ReviewerForceImplement
            }
        }
        Step::ReviewerForceImplement => Step::ImplementerReview,
        Step::ImplementerReview => Step::Done,
        Step::Done => Step::Done,
    }
}

/// Attempt increment on entering `to`, per the explicit resolution in
/// the design notes: increment entering `implement_second_try`,
/// `implement_third_try`, or `reviewer_force_implement`; set to 1 on
/// `ready → implement_try`.
fn attempt_after(from: Step, to: Step, current: u8) -> u8 {
    if from == Step::Ready && to == Step::ImplementTry {
        return 1;
    }
    if matches!(
        to,
        Step::ImplementSecondTry | Step::ImplementThirdTry | Step::ReviewerForceImplement
    ) {
        return current.saturating_add(1).min(MAX_ATTEMPT);
    }
    current
}

impl Execution {
    /// Creates a fresh execution at `ready`, attempt 0, decision PENDING.
    pub fn start(item_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        let item_id = item_id.into();
        Self {
            id: ExecutionId::for_item(&item_id, now),
            item_id,
            step: Step::Ready,
            status: Step::Ready.status(),
            decision: Decision::Pending,
            attempt: 0,
            started_at: now,
            updated_at: now,
            completed_at: None,
            meta: HashMap::new(),
            last_error: None,
            force_terminated: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.step == Step::Done
    }

    /// Validates `to` against the static transition table, updates `step`,
    /// re-derives `status`, bumps `attempt` per [`attempt_after`], sets
    /// `completed_at` when entering `done`, and advances `updated_at`.
    pub fn transition_to(&mut self, to: Step, now: DateTime<Utc>) -> Result<(), DeespecError> {
        if self.is_completed() {
            return Err(DeespecError::AlreadyCompleted(self.id.as_str().to_string()));
        }
        if !allowed_targets(self.step).contains(&to) {
            return Err(DeespecError::InvalidTransition {
                from: self.step.as_str().to_string(),
                to: to.as_str().to_string(),
            });
        }
        self.attempt = attempt_after(self.step, to, self.attempt);
        self.step = to;
        self.status = to.status();
        if to == Step::ReviewerForceImplement {
            self.force_terminated = true;
        }
        if to == Step::Done {
            self.completed_at = Some(now);
        }
        self.updated_at = now;
        Ok(())
    }

    /// Stores a review decision. Fails unless the execution is currently
    /// in a review status.
    pub fn apply_decision(&mut self, decision: Decision, now: DateTime<Utc>) -> Result<(), DeespecError> {
        if !matches!(self.status, Status::Review | Status::ReviewAndWip) {
            return Err(DeespecError::InvalidDecision(format!(
                "cannot apply decision while status is {}",
                self.status
            )));
        }
        self.decision = decision;
        self.updated_at = now;
        Ok(())
    }

    /// Sets the decision field directly, bypassing the review-status guard
    /// in [`apply_decision`] — administrative finalization may complete an
    /// execution from a non-review state.
    pub fn set_decision_unchecked(&mut self, decision: Decision, now: DateTime<Utc>) {
        self.decision = decision;
        self.updated_at = now;
    }

    /// Deterministic function of `(step, decision)`. Returns `done` from `done`.
    pub fn next_step(&self) -> Step {
        next_step(self.step, self.decision)
    }

    /// True iff `attempt ≥ 3 AND decision = NEEDS_CHANGES`.
    pub fn should_force_terminate(&self) -> bool {
        self.attempt >= FORCE_TERMINATE_ATTEMPT && self.decision == Decision::NeedsChanges
    }

    /// `PENDING` if not completed; otherwise the stored decision, except
    /// that a completed item with `attempt ≥ 3` and a non-final decision
    /// resolves to `FAILED`.
    pub fn final_decision(&self) -> Decision {
        if !self.is_completed() {
            return Decision::Pending;
        }
        if self.attempt >= FORCE_TERMINATE_ATTEMPT && !self.decision.is_final() {
            return Decision::Failed;
        }
        self.decision
    }

    /// Reconstructs the ordered list of steps traversed so far by
    /// classifying the execution's current position: first-attempt success
    /// (3 or 4 steps), in-progress Nth attempt (up through current), or a
    /// force-termination path (all ten steps).
    pub fn path(&self) -> Vec<Step> {
        if self.step == Step::Done && self.force_terminated {
            return Step::ALL.to_vec();
        }
        let through = if self.step == Step::Done {
            // Direct success: the preceding review step's order, plus `done`.
            match self.attempt {
                0 | 1 => Step::FirstReview.order(),
                2 => Step::SecondReview.order(),
                _ => Step::ThirdReview.order(),
            }
        } else {
            self.step.order() - 1
        };
        let mut path: Vec<Step> = Step::ALL.iter().copied().take(through as usize).collect();
        if self.step == Step::Done {
            path.push(Step::Done);
        } else {
            path.push(self.step);
        }
        path
    }
}

#[cfg(test)]
#[path = "execution_tests.rs"]
mod tests;
