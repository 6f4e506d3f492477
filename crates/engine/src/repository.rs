// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CRUD over [`Execution`] entities, isolating stored state from callers.

use deespec_core::error::DeespecError;
use deespec_core::execution::{Execution, ExecutionId};
use deespec_core::step::Status;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Persistence boundary for executions.
///
/// Reads return deep copies; writes store deep copies. External mutation
/// of a returned entity cannot corrupt the store until an explicit
/// `update` call.
pub trait ExecutionRepository: Send + Sync {
    fn save(&self, execution: &Execution) -> Result<(), DeespecError>;
    fn update(&self, execution: &Execution) -> Result<(), DeespecError>;
    fn delete(&self, id: &ExecutionId) -> Result<(), DeespecError>;
    fn find_by_id(&self, id: &ExecutionId) -> Result<Option<Execution>, DeespecError>;
    /// Most-recent execution for `item_id`, by `started_at`.
    fn find_by_sbi_id(&self, item_id: &str) -> Result<Option<Execution>, DeespecError>;
    fn find_active(&self) -> Result<Vec<Execution>, DeespecError>;
    fn find_by_status(&self, status: Status) -> Result<Vec<Execution>, DeespecError>;
}

/// In-memory reference implementation. Deep-copies on every read and write.
#[derive(Default)]
pub struct InMemoryExecutionRepository {
    executions: Mutex<HashMap<String, Execution>>,
}

impl InMemoryExecutionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExecutionRepository for InMemoryExecutionRepository {
    fn save(&self, execution: &Execution) -> Result<(), DeespecError> {
        let mut guard = self.executions.lock();
        if guard.contains_key(execution.id.as_str()) {
            return Err(DeespecError::AlreadyExists(execution.id.as_str().to_string()));
        }
        guard.insert(execution.id.as_str().to_string(), execution.clone());
        Ok(())
    }

    fn update(&self, execution: &Execution) -> Result<(), DeespecError> {
        let mut guard = self.executions.lock();
        if !guard.contains_key(execution.id.as_str()) {
            return Err(DeespecError::NotFound(execution.id.as_str().to_string()));
        }
        guard.insert(execution.id.as_str().to_string(), execution.clone());
        Ok(())
    }

    fn delete(&self, id: &ExecutionId) -> Result<(), DeespecError> {
        let mut guard = self.executions.lock();
        guard
            .remove(id.as_str())
            .map(|_| ())
            .ok_or_else(|| DeespecError::NotFound(id.as_str().to_string()))
    }

    fn find_by_id(&self, id: &ExecutionId) -> Result<Option<Execution>, DeespecError> {
        Ok(self.executions.lock().get(id.as_str()).cloned())
    }

    fn find_by_sbi_id(&self, item_id: &str) -> Result<Option<Execution>, DeespecError> {
        let guard = self.executions.lock();
        Ok(guard
            .values()
            .filter(|e| e.item_id == item_id)
            .max_by_key(|e| e.started_at)
            .cloned())
    }

    fn find_active(&self) -> Result<Vec<Execution>, DeespecError> {
        let guard = self.executions.lock();
        Ok(guard.values().filter(|e| !e.is_completed()).cloned().collect())
    }

    fn find_by_status(&self, status: Status) -> Result<Vec<Execution>, DeespecError> {
        let guard = self.executions.lock();
        Ok(guard
            .values()
            .filter(|e| std::mem::discriminant(&e.status) == std::mem::discriminant(&status))
            .cloned()
            .collect())
    }
}

pub type SharedExecutionRepository = Arc<dyn ExecutionRepository>;

#[cfg(test)]
#[path = "repository_tests.rs"]
mod tests;
