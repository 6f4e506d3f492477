// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed state store: one record per item, persisted with the
//! write-then-rename protocol.

use crate::atomic::{self, AtomicError};
use deespec_core::step::Step;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StateStoreError {
    #[error("read state file: {0}")]
    Read(#[source] std::io::Error),
    #[error("parse state file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    Write(#[from] AtomicError),
}

/// `{"version": int, "step": enum, "turn": int, "meta": object}`.
///
/// Loading tolerates the legacy field name `current`, migrating it to
/// `step`. Legacy field is never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub version: u32,
    pub step: String,
    pub turn: u64,
    #[serde(default)]
    pub meta: HashMap<String, String>,
}

impl StateRecord {
    pub fn new(step: Step) -> Self {
        Self {
            version: 1,
            step: step.as_str().to_string(),
            turn: 0,
            meta: HashMap::new(),
        }
    }
}

pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads the record if present. A legacy `current` field is migrated
    /// to `step` with a warning; an unrecognized `step` value logs a
    /// warning but still loads (the closed-enum check is advisory here —
    /// rejecting would make a forward-compatible field addition fatal).
    pub fn load(&self) -> Result<Option<StateRecord>, StateStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StateStoreError::Read(e)),
        };
        let mut value: Value = serde_json::from_slice(&bytes)?;
        if let Some(obj) = value.as_object_mut() {
            if !obj.contains_key("step") {
                if let Some(legacy) = obj.remove("current") {
                    warn!("state file uses legacy field `current`; migrating to `step`");
                    obj.insert("step".to_string(), legacy);
                }
            }
        }
        let record: StateRecord = serde_json::from_value(value)?;
        if Step::parse(&record.step).is_none() {
            warn!(step = %record.step, "state file step is not a recognized enum value");
        }
        Ok(Some(record))
    }

    /// Persists `record` via the write-then-rename protocol. Never writes
    /// the legacy `current` field.
    pub fn save(&self, record: &StateRecord) -> Result<(), StateStoreError> {
        let bytes = serde_json::to_vec_pretty(record)?;
        atomic::write_file_sync(&self.path, &bytes)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
