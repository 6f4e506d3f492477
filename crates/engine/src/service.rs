// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrates [`Execution`] lifecycle operations over a repository.

use crate::error::ServiceError;
use crate::repository::SharedExecutionRepository;
use deespec_core::clock::Clock;
use deespec_core::decision::Decision;
use deespec_core::error::DeespecError;
use deespec_core::execution::{Execution, ExecutionId};
use deespec_core::step::{Status, Step};
use std::sync::Arc;

pub struct ExecutionService {
    repository: SharedExecutionRepository,
    clock: Arc<dyn Clock>,
}

impl ExecutionService {
    pub fn new(repository: SharedExecutionRepository, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// Starts a new execution for `item_id`. Rejects if a prior execution
    /// for the same item has not reached `done`.
    pub fn start_execution(&self, item_id: &str) -> Result<Execution, ServiceError> {
        if let Some(existing) = self.repository.find_by_sbi_id(item_id)? {
            if !existing.is_completed() {
                return Err(ServiceError::AlreadyActive(item_id.to_string()));
            }
        }
        let execution = Execution::start(item_id, self.clock.now());
        self.repository.save(&execution)?;
        Ok(execution)
    }

    /// Applies a review decision, if the execution is currently in review,
    /// then advances it to `NextStep`. Force-termination runs through
    /// `reviewer_force_implement` then `implementer_review` before `done`,
    /// so this only performs the single transition called for by the
    /// current `(step, decision)` pair; the coordinator calls this once
    /// per step as the pipeline advances.
    pub fn progress_execution(
        &self,
        id: &ExecutionId,
        decision: Option<Decision>,
    ) -> Result<Execution, ServiceError> {
        let mut execution = self
            .repository
            .find_by_id(id)?
            .ok_or_else(|| DeespecError::NotFound(id.as_str().to_string()))?;
        let now = self.clock.now();
        if let Some(decision) = decision {
            execution.apply_decision(decision, now)?;
        }
        let next = execution.next_step();
        execution.transition_to(next, now)?;
        self.repository.update(&execution)?;
        Ok(execution)
    }

    /// Administrative finalization: sets the decision without requiring a
    /// review status, then transitions straight to `done`.
    pub fn complete_execution(
        &self,
        id: &ExecutionId,
        final_decision: Decision,
    ) -> Result<Execution, ServiceError> {
        let mut execution = self
            .repository
            .find_by_id(id)?
            .ok_or_else(|| DeespecError::NotFound(id.as_str().to_string()))?;
        let now = self.clock.now();
        execution.set_decision_unchecked(final_decision, now);
        if execution.step != Step::Done {
            execution.transition_to(Step::Done, now)?;
        }
        self.repository.update(&execution)?;
        Ok(execution)
    }

    /// `(stuck, reason)`. Stuck if `status = REVIEW AND decision =
    /// NEEDS_CHANGES AND attempt >= 3`, or if `status = WIP AND attempt > 3`.
    pub fn is_execution_stuck(&self, id: &ExecutionId) -> Result<(bool, Option<String>), ServiceError> {
        let execution = self
            .repository
            .find_by_id(id)?
            .ok_or_else(|| DeespecError::NotFound(id.as_str().to_string()))?;
        if execution.status == Status::Review
            && execution.decision == Decision::NeedsChanges
            && execution.attempt >= 3
        {
            return Ok((
                true,
                Some(format!(
                    "attempt {} reached NEEDS_CHANGES without entering reviewer_force_implement",
                    execution.attempt
                )),
            ));
        }
        if execution.status == Status::Wip && execution.attempt > 3 {
            return Ok((
                true,
                Some(format!(
                    "attempt {} exceeds the maximum while still in progress",
                    execution.attempt
                )),
            ));
        }
        Ok((false, None))
    }

    pub fn get_execution_path(&self, id: &ExecutionId) -> Result<Vec<Step>, ServiceError> {
        let execution = self
            .repository
            .find_by_id(id)?
            .ok_or_else(|| DeespecError::NotFound(id.as_str().to_string()))?;
        Ok(execution.path())
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
