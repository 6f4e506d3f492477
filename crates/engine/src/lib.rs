// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod collaborators;
pub mod coordinator;
pub mod error;
pub mod file_repository;
pub mod repository;
pub mod service;

pub use collaborators::{AgentArtifacts, AgentError, AgentInvoke, PromptBuilder, PromptError};
pub use coordinator::{CoordinatorError, RunCoordinator, EXECUTION_LOCK_TTL, RUN_LOCK_TTL};
pub use error::ServiceError;
pub use file_repository::FileExecutionRepository;
pub use repository::{ExecutionRepository, InMemoryExecutionRepository, SharedExecutionRepository};
pub use service::ExecutionService;
