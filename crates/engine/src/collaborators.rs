// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External collaborators the run coordinator calls out to. Neither trait
//! knows anything about executions, locks, or journaling; they are the
//! only seam between this crate and the actual agent/process world.

use deespec_core::step::Step;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent invocation timed out after {0:?}")]
    Timeout(Duration),
    #[error("agent invocation failed: {0}")]
    Failed(String),
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("no prompt template for step {0}")]
    NoTemplate(Step),
    #[error("failed to build prompt: {0}")]
    Failed(String),
}

/// Artifacts produced by one agent invocation, fed back into the journal.
#[derive(Debug, Clone, Default)]
pub struct AgentArtifacts {
    pub raw_output: String,
    pub decision_text: Option<String>,
    pub files_touched: Vec<String>,
}

/// Runs a prompt against whatever LLM-agent process backs this deployment.
pub trait AgentInvoke: Send + Sync {
    fn invoke(&self, prompt: &str, timeout: Duration) -> Result<AgentArtifacts, AgentError>;
}

/// Builds the prompt text for a given item at a given step.
pub trait PromptBuilder: Send + Sync {
    fn build_prompt(&self, item_id: &str, step: Step) -> Result<String, PromptError>;
}
