// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable [`ExecutionRepository`]: one JSON file per execution under a
//! directory, written via `deespec-storage`'s write-then-rename protocol so
//! an abrupt process termination never leaves a half-written record.

use crate::repository::ExecutionRepository;
use deespec_core::error::DeespecError;
use deespec_core::execution::{Execution, ExecutionId};
use deespec_core::step::Status;
use std::fs;
use std::path::PathBuf;

fn io_error(phase: &str, err: impl std::fmt::Display) -> DeespecError {
    DeespecError::IOError {
        phase: phase.to_string(),
        message: err.to_string(),
    }
}

/// Persists each execution as `<dir>/<id>.json`. Directory-scan reads mean
/// `find_active`/`find_by_status`/`find_by_sbi_id` pay an O(n) deserialize
/// pass over every execution on disk, same as the in-memory store pays an
/// O(n) scan over its map — acceptable at this system's scale (one run
/// coordinator, a handful of concurrently active items).
pub struct FileExecutionRepository {
    dir: PathBuf,
}

impl FileExecutionRepository {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, DeespecError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| io_error("create_execution_dir", e))?;
        Ok(Self { dir })
    }

    fn path_for(&self, id: &ExecutionId) -> PathBuf {
        self.dir.join(format!("{}.json", id.as_str()))
    }

    fn read_one(path: &std::path::Path) -> Result<Execution, DeespecError> {
        let bytes = fs::read(path).map_err(|e| io_error("read_execution_file", e))?;
        serde_json::from_slice(&bytes).map_err(|e| io_error("parse_execution_file", e))
    }

    fn read_all(&self) -> Result<Vec<Execution>, DeespecError> {
        let mut out = Vec::new();
        let entries = fs::read_dir(&self.dir).map_err(|e| io_error("read_execution_dir", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_error("read_execution_dir_entry", e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            out.push(Self::read_one(&path)?);
        }
        Ok(out)
    }

    fn write(&self, execution: &Execution) -> Result<(), DeespecError> {
        let bytes = serde_json::to_vec_pretty(execution).map_err(|e| io_error("serialize_execution", e))?;
        deespec_storage::atomic::write_file_sync(&self.path_for(&execution.id), &bytes)
            .map_err(|e| io_error("write_execution_file", e))
    }
}

impl ExecutionRepository for FileExecutionRepository {
    fn save(&self, execution: &Execution) -> Result<(), DeespecError> {
        if self.path_for(&execution.id).exists() {
            return Err(DeespecError::AlreadyExists(execution.id.as_str().to_string()));
        }
        self.write(execution)
    }

    fn update(&self, execution: &Execution) -> Result<(), DeespecError> {
        if !self.path_for(&execution.id).exists() {
            return Err(DeespecError::NotFound(execution.id.as_str().to_string()));
        }
        self.write(execution)
    }

    fn delete(&self, id: &ExecutionId) -> Result<(), DeespecError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Err(DeespecError::NotFound(id.as_str().to_string()));
        }
        fs::remove_file(&path).map_err(|e| io_error("delete_execution_file", e))
    }

    fn find_by_id(&self, id: &ExecutionId) -> Result<Option<Execution>, DeespecError> {
        let path = self.path_for(id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(Self::read_one(&path)?))
    }

    fn find_by_sbi_id(&self, item_id: &str) -> Result<Option<Execution>, DeespecError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.item_id == item_id)
            .max_by_key(|e| e.started_at))
    }

    fn find_active(&self) -> Result<Vec<Execution>, DeespecError> {
        Ok(self.read_all()?.into_iter().filter(|e| !e.is_completed()).collect())
    }

    fn find_by_status(&self, status: Status) -> Result<Vec<Execution>, DeespecError> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| std::mem::discriminant(&e.status) == std::mem::discriminant(&status))
            .collect())
    }
}

#[cfg(test)]
#[path = "file_repository_tests.rs"]
mod tests;
