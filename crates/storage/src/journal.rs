// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Appends normalized [`JournalEntry`] records to the NDJSON journal file.

use crate::atomic::{self, AtomicError};
use deespec_core::clock::Clock;
use deespec_core::journal::JournalEntry;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum JournalWriterError {
    #[error("serialize journal entry: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("journal entry failed validation: {0}")]
    Invalid(String),
    #[error(transparent)]
    Io(#[from] AtomicError),
}

/// When `validate` is true, a schema violation is a hard error; when
/// false it is logged and written anyway.
#[derive(Debug, Clone, Copy)]
pub struct JournalWriterConfig {
    pub validate: bool,
}

impl Default for JournalWriterConfig {
    fn default() -> Self {
        Self { validate: false }
    }
}

pub struct JournalWriter {
    path: PathBuf,
    config: JournalWriterConfig,
}

impl JournalWriter {
    pub fn new(path: impl Into<PathBuf>, config: JournalWriterConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    /// Normalizes, optionally validates, serializes, and appends `entry`.
    pub fn append(&self, entry: JournalEntry, clock: &dyn Clock) -> Result<(), JournalWriterError> {
        let normalized = entry.normalize(clock);
        if self.config.validate {
            if let Some(reason) = normalized.validate() {
                return Err(JournalWriterError::Invalid(reason.to_string()));
            }
        } else if let Some(reason) = normalized.validate() {
            warn!(reason, "journal entry failed validation; writing anyway");
        }
        let line = normalized.to_line()?;
        atomic::append_ndjson_line(&self.path, &line)?;
        Ok(())
    }

    /// Map-based append for legacy callers that produce a raw JSON value
    /// rather than a typed `JournalEntry` (e.g. a value assembled from a
    /// dynamic field set). Coerces via `JournalEntry::from_value`, then
    /// goes through the same normalize/validate/write path as `append`.
    pub fn append_map(&self, value: serde_json::Value, clock: &dyn Clock) -> Result<(), JournalWriterError> {
        let entry = JournalEntry::from_value(value).map_err(JournalWriterError::Serialize)?;
        self.append(entry, clock)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
#[path = "journal_writer_tests.rs"]
mod tests;
