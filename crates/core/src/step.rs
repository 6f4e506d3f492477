// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The ten-step execution pipeline and its derived status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the ten fixed positions an execution can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Ready,
    ImplementTry,
    FirstReview,
    ImplementSecondTry,
    SecondReview,
    ImplementThirdTry,
    ThirdReview,
    ReviewerForceImplement,
    ImplementerReview,
    Done,
}

impl Step {
    /// All steps in their fixed pipeline order.
    pub const ALL: [Step; 10] = [
        Step::Ready,
        Step::ImplementTry,
        Step::FirstReview,
        Step::ImplementSecondTry,
        Step::SecondReview,
        Step::ImplementThirdTry,
        Step::ThirdReview,
        Step::ReviewerForceImplement,
        Step::ImplementerReview,
        Step::Done,
    ];

    /// 1-based position in the fixed pipeline order.
    pub fn order(self) -> u8 {
        Self::ALL
            .iter()
            .position(|s| *s == self)
            .map(|i| i as u8 + 1)
            .unwrap_or(0)
    }

    /// Derives this step's coarse [`Status`]. `status = f(step)` always holds.
    pub fn status(self) -> Status {
        match self {
            Step::Ready => Status::Ready,
            Step::ImplementTry | Step::ImplementSecondTry | Step::ImplementThirdTry => Status::Wip,
            Step::FirstReview | Step::SecondReview | Step::ThirdReview | Step::ImplementerReview => {
                Status::Review
            }
            Step::ReviewerForceImplement => Status::ReviewAndWip,
            Step::Done => Status::Done,
        }
    }

    /// Parses the string form used by the legacy `current` state field and
    /// by config/journal round-tripping. Unknown values return `None`.
    pub fn parse(s: &str) -> Option<Step> {
        Some(match s {
            "ready" => Step::Ready,
            "implement_try" => Step::ImplementTry,
            "first_review" => Step::FirstReview,
            "implement_second_try" => Step::ImplementSecondTry,
            "second_review" => Step::SecondReview,
            "implement_third_try" => Step::ImplementThirdTry,
            "third_review" => Step::ThirdReview,
            "reviewer_force_implement" => Step::ReviewerForceImplement,
            "implementer_review" => Step::ImplementerReview,
            "done" => Step::Done,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Step::Ready => "ready",
            Step::ImplementTry => "implement_try",
            Step::FirstReview => "first_review",
            Step::ImplementSecondTry => "implement_second_try",
            Step::SecondReview => "second_review",
            Step::ImplementThirdTry => "implement_third_try",
            Step::ThirdReview => "third_review",
            Step::ReviewerForceImplement => "reviewer_force_implement",
            Step::ImplementerReview => "implementer_review",
            Step::Done => "done",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse state derived from [`Step`]. `REVIEW&WIP` is only produced by
/// `reviewer_force_implement`, where a reviewer writes code directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Ready,
    Wip,
    Review,
    #[serde(rename = "REVIEW&WIP")]
    ReviewAndWip,
    Done,
}

impl Status {
    /// Scheduling priority used by the Run Coordinator's dispatch loop.
    /// Lower values are scheduled first.
    pub fn priority(self) -> u8 {
        match self {
            Status::ReviewAndWip => 1,
            Status::Review => 2,
            Status::Wip => 3,
            Status::Ready => 4,
            Status::Done => 5,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ready => "READY",
            Status::Wip => "WIP",
            Status::Review => "REVIEW",
            Status::ReviewAndWip => "REVIEW&WIP",
            Status::Done => "DONE",
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
