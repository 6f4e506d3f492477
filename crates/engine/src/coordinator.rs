// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The run coordinator: the single long-lived loop that holds the run
//! lock, finds active executions, and drives each through one step via
//! the configured agent collaborators.
//!
//! Grounded on the daemon's startup/heartbeat/shutdown shape: acquire the
//! exclusive lease before touching anything else, forward a heartbeat on
//! a background task, and reconcile outstanding work on every pass rather
//! than trusting in-memory state across restarts.

use crate::collaborators::{AgentInvoke, PromptBuilder};
use crate::error::ServiceError;
use crate::repository::SharedExecutionRepository;
use crate::service::ExecutionService;
use chrono::Duration as ChronoDuration;
use deespec_core::clock::Clock;
use deespec_core::decision::{parse_decision, JournalDecision};
use deespec_core::execution::Execution;
use deespec_core::journal::JournalEntry;
use deespec_core::lock::LockType;
use deespec_core::step::Status;
use deespec_locks::store::{acquire_state_lock_on, extend_on, Holder, LockKind};
use deespec_locks::LockStore;
use deespec_storage::{FileStateStore, JournalWriter, StateRecord};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Lock(#[from] deespec_locks::store::LockStoreError),
    #[error(transparent)]
    Journal(#[from] deespec_storage::JournalWriterError),
    #[error(transparent)]
    State(#[from] deespec_storage::StateStoreError),
    #[error(transparent)]
    Repository(#[from] deespec_core::error::DeespecError),
    #[error("run lock already held by another instance")]
    AlreadyRunning,
}

impl CoordinatorError {
    /// True for errors the dispatch loop should journal and skip for this
    /// iteration rather than treat as fatal to the coordinator process.
    /// Mirrors `DeespecError::is_iteration_terminal` for the errors that
    /// reach the coordinator already wrapped.
    pub fn is_iteration_terminal(&self) -> bool {
        match self {
            CoordinatorError::Service(ServiceError::Execution(err)) => err.is_iteration_terminal(),
            CoordinatorError::Service(ServiceError::AlreadyActive(_)) => true,
            CoordinatorError::Repository(err) => err.is_iteration_terminal(),
            CoordinatorError::Lock(_) | CoordinatorError::Journal(_) | CoordinatorError::State(_) => false,
            CoordinatorError::AlreadyRunning => false,
        }
    }
}

/// Default TTL for the process-wide run lock.
pub const RUN_LOCK_TTL: ChronoDuration = ChronoDuration::minutes(10);
/// Default TTL for a per-item execution lock held across one loop pass.
pub const EXECUTION_LOCK_TTL: ChronoDuration = ChronoDuration::minutes(5);
/// Default TTL for a per-item state lock held across one loop pass.
pub const STATE_LOCK_TTL: ChronoDuration = ChronoDuration::minutes(5);
const RUN_LOCK_ID: &str = "deespec.run";

pub struct RunCoordinator {
    locks: Arc<LockStore>,
    repository: SharedExecutionRepository,
    service: ExecutionService,
    journal: Arc<JournalWriter>,
    state_dir: PathBuf,
    clock: Arc<dyn Clock>,
    agent: Arc<dyn AgentInvoke>,
    prompts: Arc<dyn PromptBuilder>,
    agent_timeout: StdDuration,
    holder: Holder,
    shutdown: Arc<AtomicBool>,
}

impl RunCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        locks: Arc<LockStore>,
        repository: SharedExecutionRepository,
        journal: Arc<JournalWriter>,
        state_dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        agent: Arc<dyn AgentInvoke>,
        prompts: Arc<dyn PromptBuilder>,
        agent_timeout: StdDuration,
        hostname: String,
    ) -> Self {
        let service = ExecutionService::new(repository.clone(), clock.clone());
        Self {
            locks,
            repository,
            service,
            journal,
            state_dir: state_dir.into(),
            clock,
            agent,
            prompts,
            agent_timeout,
            holder: Holder {
                pid: std::process::id(),
                hostname,
            },
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        self.shutdown.clone()
    }

    /// Acquires the run lock, spawns the heartbeat forwarder, and drives
    /// the dispatch loop until `shutdown` is set or the lock cannot be
    /// renewed. Releases the run lock on every exit path.
    pub async fn run(&self, poll_interval: StdDuration) -> Result<(), CoordinatorError> {
        let now = self.clock.now();
        let acquired = self
            .locks
            .acquire_run_lock(RUN_LOCK_ID, RUN_LOCK_TTL, now, &self.holder)?
            .ok_or(CoordinatorError::AlreadyRunning)?;
        info!(lock_id = %acquired.base.lock_id, "run lock acquired");

        let heartbeat_locks = self.locks.clone();
        let heartbeat_clock = self.clock.clone();
        let heartbeat_shutdown = self.shutdown.clone();
        let heartbeat_handle = tokio::spawn(async move {
            spawn_heartbeat(heartbeat_locks, heartbeat_clock, heartbeat_shutdown).await;
        });

        let result = self.dispatch_loop(poll_interval).await;

        self.shutdown.store(true, Ordering::SeqCst);
        let _ = heartbeat_handle.await;
        if let Err(err) = self.locks.release(LockKind::Run, RUN_LOCK_ID) {
            warn!(%err, "failed to release run lock on exit");
        }
        result
    }

    async fn dispatch_loop(&self, poll_interval: StdDuration) -> Result<(), CoordinatorError> {
        while !self.shutdown.load(Ordering::SeqCst) {
            let mut active = self.repository.find_active()?;
            active.sort_by(|a, b| {
                a.status
                    .priority()
                    .cmp(&b.status.priority())
                    .then(a.started_at.cmp(&b.started_at))
            });
            for execution in active {
                if self.shutdown.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(err) = self.drive_one(&execution) {
                    if err.is_iteration_terminal() {
                        warn!(item_id = %execution.item_id, %err, "execution step skipped for this iteration");
                        continue;
                    }
                    warn!(item_id = %execution.item_id, %err, "fatal error driving execution; stopping coordinator");
                    return Err(err);
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
        Ok(())
    }

    fn drive_one(&self, execution: &Execution) -> Result<(), CoordinatorError> {
        let lock_id = execution.id.as_str();
        let now = self.clock.now();
        let Some(_lease) = self
            .locks
            .acquire_execution_lock(lock_id, EXECUTION_LOCK_TTL, now, &self.holder)?
        else {
            // Another instance already holds this item's lease this pass.
            return Ok(());
        };

        let outcome = self.run_step(execution);

        if let Err(err) = self.locks.release(LockKind::Execution, lock_id) {
            warn!(%lock_id, %err, "failed to release execution lock");
        }
        outcome
    }

    /// Acquires the item's state lock, composed in one transaction with
    /// extending its execution lease, then drives one step. Spec.md §4.4
    /// treats an acquired `StateLock` as a precondition for any mutation;
    /// holding it for the step's duration is what lets the journal append
    /// and the state-store write below both land before it's released.
    fn run_step(&self, execution: &Execution) -> Result<(), CoordinatorError> {
        let state_lock_id = execution.item_id.as_str();
        let now = self.clock.now();
        let acquired = self.locks.with_transaction(|tx| {
            let lock = acquire_state_lock_on(tx, state_lock_id, LockType::Write, STATE_LOCK_TTL, now, &self.holder)?;
            if lock.is_some() {
                extend_on(tx, LockKind::Execution, execution.id.as_str(), EXECUTION_LOCK_TTL)?;
            }
            Ok(lock)
        })?;
        let Some(_state_lock) = acquired else {
            // Another instance holds this item's state lease this pass.
            return Ok(());
        };

        let outcome = self.run_step_locked(execution);

        if let Err(err) = self.locks.release(LockKind::State, state_lock_id) {
            warn!(%state_lock_id, %err, "failed to release state lock");
        }
        outcome
    }

    fn run_step_locked(&self, execution: &Execution) -> Result<(), CoordinatorError> {
        let prompt = match self.prompts.build_prompt(&execution.item_id, execution.step) {
            Ok(prompt) => prompt,
            Err(err) => return self.journal_retry(execution, format!("build_prompt: {err}")),
        };
        let artifacts = match self.agent.invoke(&prompt, self.agent_timeout) {
            Ok(artifacts) => artifacts,
            Err(err) => return self.journal_retry(execution, format!("agent_invoke: {err}")),
        };

        let decision = if matches!(execution.status, Status::Review | Status::ReviewAndWip) {
            artifacts.decision_text.as_deref().map(parse_decision)
        } else {
            None
        };

        let advanced = self.service.progress_execution(&execution.id, decision)?;

        let mut entry = JournalEntry::new(self.clock.as_ref(), u64::from(advanced.attempt));
        entry.step = advanced.step.as_str().to_string();
        entry.decision = JournalDecision::from(advanced.decision).as_str().to_string();
        entry.artifacts = artifacts.files_touched;
        self.journal.append(entry, self.clock.as_ref())?;

        let record = StateRecord {
            version: 1,
            step: advanced.step.as_str().to_string(),
            turn: u64::from(advanced.attempt),
            meta: HashMap::new(),
        };
        let state = FileStateStore::new(self.state_dir.join(format!("{}.json", execution.item_id)));
        state.save(&record)?;
        Ok(())
    }

    /// Journals an agent/prompt I/O failure as `PENDING` instead of
    /// propagating it, so the item is retried on the coordinator's next
    /// pass rather than abandoned mid-step.
    fn journal_retry(&self, execution: &Execution, message: String) -> Result<(), CoordinatorError> {
        let mut entry = JournalEntry::new(self.clock.as_ref(), u64::from(execution.attempt));
        entry.step = execution.step.as_str().to_string();
        entry.decision = JournalDecision::Pending.as_str().to_string();
        entry.error = message;
        self.journal.append(entry, self.clock.as_ref())?;
        Ok(())
    }
}

async fn spawn_heartbeat(locks: Arc<LockStore>, clock: Arc<dyn Clock>, shutdown: Arc<AtomicBool>) {
    let interval = StdDuration::from_secs(
        (RUN_LOCK_TTL.num_seconds() / 3).max(1) as u64,
    );
    while !shutdown.load(Ordering::SeqCst) {
        tokio::time::sleep(interval).await;
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        let now = clock.now();
        if let Err(err) = locks.update_heartbeat(LockKind::Run, RUN_LOCK_ID, now) {
            warn!(%err, "run lock heartbeat failed");
            break;
        }
        if let Err(err) = locks.extend(LockKind::Run, RUN_LOCK_ID, RUN_LOCK_TTL) {
            warn!(%err, "run lock extend failed");
            break;
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
