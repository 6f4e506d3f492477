// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy for the coordination kernel.

use thiserror::Error;

/// Errors produced by the entity, repository, and service layers.
///
/// Entity and service code never logs; it returns one of these and leaves
/// logging and disposition decisions to the coordinator boundary.
#[derive(Debug, Error)]
pub enum DeespecError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("invalid decision: {0}")]
    InvalidDecision(String),

    #[error("execution already completed: {0}")]
    AlreadyCompleted(String),

    #[error("max attempts reached: {0}")]
    MaxAttemptsReached(String),

    #[error("execution stuck: {reason}")]
    ExecutionStuck { reason: String },

    #[error("io error during {phase}: {message}")]
    IOError { phase: String, message: String },
}

impl DeespecError {
    /// True for errors the Run Coordinator treats as terminal-for-this-iteration
    /// (journal and skip) rather than fatal-to-the-process.
    pub fn is_iteration_terminal(&self) -> bool {
        matches!(
            self,
            DeespecError::InvalidTransition { .. }
                | DeespecError::InvalidDecision(_)
                | DeespecError::AlreadyCompleted(_)
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
